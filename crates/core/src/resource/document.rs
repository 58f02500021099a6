use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::config::{ResourceConfig, ResourceConfigSpec};
use super::error::{ConfigError, Result};
use super::types::CustomFormField;

/// Builds a validated resource from a parsed document.
///
/// Keys from `defaults` fill in whatever the document leaves out, the
/// identity becomes the `file_prefix`, and `global_fields` are appended to
/// the resource's own custom fields.
pub fn resource_from_document(
    mut document: Map<String, Value>,
    defaults: &BTreeMap<String, Value>,
    identity: &str,
    global_fields: &[CustomFormField],
) -> Result<ResourceConfig> {
    for (key, value) in defaults {
        document
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }

    match document.get("file_prefix") {
        Some(Value::String(declared)) if declared != identity => {
            return Err(ConfigError::FilePrefixMismatch {
                declared: declared.clone(),
                derived: identity.to_string(),
            });
        }
        Some(other) if !other.is_string() => {
            return Err(ConfigError::InvalidDocument(format!(
                "file_prefix must be a string, got {other}"
            )));
        }
        _ => {}
    }
    document.insert("file_prefix".to_string(), Value::String(identity.to_string()));

    let mut spec: ResourceConfigSpec = serde_json::from_value(Value::Object(document))
        .map_err(|e| ConfigError::InvalidDocument(e.to_string()))?;
    spec.custom_form_fields.extend(global_fields.iter().cloned());

    ResourceConfig::try_from(spec)
}

/// Derives a resource identity from a file stem.
///
/// A leading ordering prefix such as `1-` or `02_` is stripped, so
/// `1-chargers` becomes `chargers`.
pub fn identity_from_stem(stem: &str) -> &str {
    let digits = stem.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return stem;
    }
    match stem.as_bytes().get(digits) {
        Some(b'-') | Some(b'_') => &stem[digits + 1..],
        _ => stem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::HtmlInputType;
    use serde_json::json;

    fn document(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_identity_from_stem() {
        assert_eq!(identity_from_stem("1-chargers"), "chargers");
        assert_eq!(identity_from_stem("02_courts"), "courts");
        assert_eq!(identity_from_stem("courts"), "courts");
        assert_eq!(identity_from_stem("2024"), "2024");
        assert_eq!(identity_from_stem("10x-rooms"), "10x-rooms");
        assert_eq!(identity_from_stem("3-"), "");
    }

    #[test]
    fn test_defaults_fill_missing_keys_and_document_wins() {
        let defaults = BTreeMap::from([
            ("minutes_increment".to_string(), json!(15)),
            ("maximum_minutes".to_string(), json!(60)),
            ("emoji".to_string(), json!("🎾")),
        ]);
        let doc = document(json!({
            "resource_name": "Courts",
            "calendars": { "a": { "id": "a@group" } },
            "maximum_minutes": 90,
        }));

        let config = resource_from_document(doc, &defaults, "courts", &[]).unwrap();
        assert_eq!(config.file_prefix, "courts");
        assert_eq!(config.minutes_increment, 15);
        assert_eq!(config.maximum_minutes, 90);
        assert_eq!(config.emoji, "🎾");
    }

    #[test]
    fn test_conflicting_file_prefix_rejected() {
        let doc = document(json!({
            "file_prefix": "rooms",
            "resource_name": "Courts",
            "calendars": { "a": { "id": "a@group" } },
        }));
        assert_eq!(
            resource_from_document(doc, &BTreeMap::new(), "courts", &[]).unwrap_err(),
            ConfigError::FilePrefixMismatch {
                declared: "rooms".to_string(),
                derived: "courts".to_string()
            }
        );
    }

    #[test]
    fn test_global_fields_appended() {
        let doc = document(json!({
            "resource_name": "Courts",
            "calendars": { "a": { "id": "a@group" } },
            "custom_form_fields": [
                { "type": "text", "name": "partner", "label": "Partner" }
            ],
        }));
        let global = [CustomFormField::new(HtmlInputType::Tel, "phone", "Phone")];

        let config = resource_from_document(doc, &BTreeMap::new(), "courts", &global).unwrap();
        let names: Vec<&str> = config
            .custom_form_fields
            .iter()
            .map(|field| field.name.as_str())
            .collect();
        assert_eq!(names, vec!["partner", "phone"]);
    }

    #[test]
    fn test_global_field_collision_rejected() {
        let doc = document(json!({
            "resource_name": "Courts",
            "calendars": { "a": { "id": "a@group" } },
            "custom_form_fields": [
                { "type": "tel", "name": "phone", "label": "Phone" }
            ],
        }));
        let global = [CustomFormField::new(HtmlInputType::Tel, "phone", "Phone")];

        assert_eq!(
            resource_from_document(doc, &BTreeMap::new(), "courts", &global).unwrap_err(),
            ConfigError::DuplicateFieldName("phone".to_string())
        );
    }

    #[test]
    fn test_missing_required_key_is_invalid_document() {
        let doc = document(json!({ "calendars": { "a": { "id": "a@group" } } }));
        assert!(matches!(
            resource_from_document(doc, &BTreeMap::new(), "courts", &[]),
            Err(ConfigError::InvalidDocument(message)) if message.contains("resource_name")
        ));
    }
}

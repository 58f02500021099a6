use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A single backing calendar of a resource.
///
/// The color is only used by the embedded calendar view, so it may be omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl CalendarInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// The `type` attribute of a custom HTML form input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HtmlInputType {
    Button,
    Checkbox,
    Color,
    Date,
    DatetimeLocal,
    Email,
    File,
    Hidden,
    Image,
    Month,
    Number,
    Password,
    Range,
    Reset,
    Search,
    Submit,
    Tel,
    Text,
    Time,
    Url,
    Week,
}

impl HtmlInputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HtmlInputType::Button => "button",
            HtmlInputType::Checkbox => "checkbox",
            HtmlInputType::Color => "color",
            HtmlInputType::Date => "date",
            HtmlInputType::DatetimeLocal => "datetime-local",
            HtmlInputType::Email => "email",
            HtmlInputType::File => "file",
            HtmlInputType::Hidden => "hidden",
            HtmlInputType::Image => "image",
            HtmlInputType::Month => "month",
            HtmlInputType::Number => "number",
            HtmlInputType::Password => "password",
            HtmlInputType::Range => "range",
            HtmlInputType::Reset => "reset",
            HtmlInputType::Search => "search",
            HtmlInputType::Submit => "submit",
            HtmlInputType::Tel => "tel",
            HtmlInputType::Text => "text",
            HtmlInputType::Time => "time",
            HtmlInputType::Url => "url",
            HtmlInputType::Week => "week",
        }
    }

    /// Returns true for inputs whose value is only sent when checked.
    pub fn is_checkbox(&self) -> bool {
        matches!(self, HtmlInputType::Checkbox)
    }
}

impl std::fmt::Display for HtmlInputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operator-defined input added to a resource's reservation form.
///
/// `name` is both the wire key and the DOM id. Any other key in the document
/// is kept in `attributes` and rendered verbatim on the input element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFormField {
    #[serde(rename = "type")]
    pub kind: HtmlInputType,
    pub name: String,
    pub label: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

fn default_required() -> bool {
    true
}

impl CustomFormField {
    pub fn new(kind: HtmlInputType, name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            label: label.into(),
            required: true,
            title: String::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Serializes the field to a flat key/value map for templates.
    pub fn to_map(&self) -> BTreeMap<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        }
    }
}

/// An image shown on a resource's form page.
///
/// When only one dimension is given the renderer keeps the aspect ratio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFile {
    pub path: PathBuf,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub pixel_width: Option<u32>,
    #[serde(default)]
    pub pixel_height: Option<u32>,
}

impl ImageFile {
    /// File name used to serve the image under `/images/`.
    pub fn file_name(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_input_type_kebab_case() {
        let kind: HtmlInputType = serde_json::from_value(json!("datetime-local")).unwrap();
        assert_eq!(kind, HtmlInputType::DatetimeLocal);
        assert_eq!(kind.to_string(), "datetime-local");
        assert!(serde_json::from_value::<HtmlInputType>(json!("textarea")).is_err());
    }

    #[test]
    fn test_custom_field_collects_extra_attributes() {
        let field: CustomFormField = serde_json::from_value(json!({
            "type": "number",
            "name": "party_size",
            "label": "Party size",
            "min": 1,
            "max": 8,
        }))
        .unwrap();

        assert_eq!(field.kind, HtmlInputType::Number);
        assert!(field.required);
        assert_eq!(field.title, "");
        assert_eq!(field.attributes.get("min"), Some(&json!(1)));
        assert_eq!(field.attributes.get("max"), Some(&json!(8)));
    }

    #[test]
    fn test_custom_field_to_map_is_flat() {
        let field = CustomFormField::new(HtmlInputType::Tel, "phone", "Phone")
            .optional()
            .with_attribute("pattern", json!("[0-9]{10}"));

        let map = field.to_map();
        assert_eq!(map.get("type"), Some(&json!("tel")));
        assert_eq!(map.get("name"), Some(&json!("phone")));
        assert_eq!(map.get("required"), Some(&json!(false)));
        assert_eq!(map.get("pattern"), Some(&json!("[0-9]{10}")));
    }

    #[test]
    fn test_image_file_name() {
        let image = ImageFile {
            path: PathBuf::from("/srv/images/court.png"),
            caption: String::new(),
            pixel_width: Some(400),
            pixel_height: None,
        };
        assert_eq!(image.file_name().as_deref(), Some("court.png"));
    }

    #[test]
    fn test_calendar_info_color_optional() {
        let info: CalendarInfo = serde_json::from_value(json!({ "id": "abc@group" })).unwrap();
        assert_eq!(info, CalendarInfo::new("abc@group"));
    }
}

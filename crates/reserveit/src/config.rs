use std::{env, time::Duration};

use reserveit_core::reservation::{RequestSchema, SchemaSelection};

/// Server tunables loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Per-request timeout in seconds (default: 10)
    pub request_timeout_seconds: u64,
    /// Secret every reservation form must carry, if set.
    pub shared_secret: Option<String>,
    /// Form field holding the shared secret (default: "passkey")
    pub shared_secret_field: String,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `REQUEST_TIMEOUT_SECONDS` - Request timeout in seconds (default: 10)
    /// - `RESERVEIT_SHARED_SECRET` - Shared secret required on every form (default: unset)
    /// - `RESERVEIT_SHARED_SECRET_FIELD` - Form field carrying the secret (default: "passkey")
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            request_timeout_seconds: lookup("REQUEST_TIMEOUT_SECONDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            shared_secret: lookup("RESERVEIT_SHARED_SECRET").filter(|v| !v.is_empty()),
            shared_secret_field: lookup("RESERVEIT_SHARED_SECRET_FIELD")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "passkey".to_string()),
        }
    }

    /// Get the request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// The schema every resource validates with.
    pub fn schema_selection(&self) -> SchemaSelection {
        match &self.shared_secret {
            Some(secret) => SchemaSelection::Shared(RequestSchema::SharedSecret {
                field: self.shared_secret_field.clone(),
                secret: secret.clone(),
            }),
            None => SchemaSelection::Shared(RequestSchema::Base),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 10,
            shared_secret: None,
            shared_secret_field: "passkey".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = ServerConfig::from_lookup(lookup(&[]));

        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.shared_secret, None);
        assert_eq!(
            config.schema_selection(),
            SchemaSelection::Shared(RequestSchema::Base)
        );
    }

    #[test]
    fn test_shared_secret_selects_secret_schema() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("REQUEST_TIMEOUT_SECONDS", "30"),
            ("RESERVEIT_SHARED_SECRET", "letmein"),
            ("RESERVEIT_SHARED_SECRET_FIELD", "club_code"),
        ]));

        assert_eq!(config.request_timeout_seconds, 30);
        assert_eq!(
            config.schema_selection(),
            SchemaSelection::Shared(RequestSchema::SharedSecret {
                field: "club_code".to_string(),
                secret: "letmein".to_string(),
            })
        );
    }

    #[test]
    fn test_unparseable_timeout_falls_back() {
        let config = ServerConfig::from_lookup(lookup(&[("REQUEST_TIMEOUT_SECONDS", "soon")]));
        assert_eq!(config.request_timeout_seconds, 10);
    }
}

//! Global application configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resource::{is_valid_email, is_valid_timezone, ConfigError, CustomFormField};

/// Settings shared by every resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub app_email: String,
    #[serde(default)]
    pub timezone: String,
    /// Echo every SQL statement to the log at debug level.
    #[serde(default)]
    pub db_echo: bool,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Keys merged under every resource document.
    #[serde(default)]
    pub resource_defaults: BTreeMap<String, serde_json::Value>,
    /// Custom fields appended to every resource's form.
    #[serde(default)]
    pub global_form_fields: Vec<CustomFormField>,
}

fn default_title() -> String {
    "Reservations".to_string()
}

impl AppConfig {
    pub fn new(app_email: impl Into<String>, timezone: impl Into<String>) -> Self {
        Self {
            app_email: app_email.into(),
            timezone: timezone.into(),
            db_echo: false,
            title: default_title(),
            description: String::new(),
            resource_defaults: BTreeMap::new(),
            global_form_fields: Vec::new(),
        }
    }

    /// Builds the configuration from overrides alone, then validates it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new("", "");
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Replaces scalar settings with values found through `lookup`.
    ///
    /// Keys are the upper-cased setting names (`APP_EMAIL`, `TIMEZONE`,
    /// `DB_ECHO`, `TITLE`, `DESCRIPTION`).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("APP_EMAIL") {
            self.app_email = value;
        }
        if let Some(value) = lookup("TIMEZONE") {
            self.timezone = value;
        }
        if let Some(value) = lookup("DB_ECHO") {
            self.db_echo = parse_bool(&value).ok_or_else(|| {
                ConfigError::InvalidDocument(format!("DB_ECHO must be a boolean, got '{value}'"))
            })?;
        }
        if let Some(value) = lookup("TITLE") {
            self.title = value;
        }
        if let Some(value) = lookup("DESCRIPTION") {
            self.description = value;
        }
        Ok(())
    }

    /// Checks the email and timezone shapes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_email(&self.app_email) {
            return Err(ConfigError::InvalidEmail(self.app_email.clone()));
        }
        if !is_valid_timezone(&self.timezone) {
            return Err(ConfigError::InvalidTimezone(self.timezone.clone()));
        }
        Ok(())
    }
}

/// Parses the boolean spellings accepted in environment variables.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

use thiserror::Error;

/// Errors raised while constructing or validating configuration.
///
/// Every variant is fatal: a resource set containing one of these must not be
/// served or built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("file_prefix cannot be empty")]
    EmptyFilePrefix,
    #[error("Invalid file_prefix '{0}': only ASCII letters, digits, '-' and '_' are allowed")]
    InvalidFilePrefix(String),
    #[error("resource_name cannot be empty")]
    EmptyResourceName,
    #[error("Invalid route_prefix '{0}': must start with '/', must not end with '/', and may only contain letters, digits, '-', '_' and '/'")]
    InvalidRoutePrefix(String),
    #[error("At least one calendar is required")]
    NoCalendars,
    #[error("Calendar '{name}' has an empty id")]
    EmptyCalendarId { name: String },
    #[error("Calendar '{name}' has an invalid color '{color}' (expected #RRGGBB)")]
    InvalidColor { name: String, color: String },
    #[error("Calendar id '{0}' is used by more than one calendar")]
    DuplicateCalendarId(String),
    #[error("Invalid clock time '{0}': expected 'hh:mm AM/PM'")]
    InvalidClockTime(String),
    #[error("day_start_time must be before day_end_time")]
    InvalidDayWindow,
    #[error("{field} must be a positive integer, got {value}")]
    NotPositive { field: &'static str, value: i64 },
    #[error("maximum_minutes ({maximum}) must be a multiple of minutes_increment ({increment})")]
    MaximumNotMultiple { maximum: u32, increment: u32 },
    #[error("Custom form field name cannot be empty")]
    EmptyFieldName,
    #[error("Duplicate custom form field name: {0}")]
    DuplicateFieldName(String),
    #[error("Custom form field name '{0}' is reserved for the reservation form")]
    ReservedFieldName(String),
    #[error("Invalid resource document: {0}")]
    InvalidDocument(String),
    #[error("file_prefix '{declared}' does not match the identity '{derived}' derived from the file name")]
    FilePrefixMismatch { declared: String, derived: String },
    #[error("Invalid app_email: '{0}'")]
    InvalidEmail(String),
    #[error("Invalid timezone: '{0}' (expected an IANA name such as 'America/New_York')")]
    InvalidTimezone(String),
    #[error("Request schema keys do not match resources (missing: {missing:?}, extra: {extra:?})")]
    SchemaKeysMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
    },
    #[error("Resource '{resource}' uses a shared-secret schema but declares no '{field}' form field")]
    SchemaFieldMissing { resource: String, field: String },
}

/// Result type for configuration construction.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_error_display() {
        let error = ConfigError::MaximumNotMultiple {
            maximum: 100,
            increment: 30,
        };
        assert_eq!(
            error.to_string(),
            "maximum_minutes (100) must be a multiple of minutes_increment (30)"
        );
    }

    #[test]
    fn test_not_positive_display() {
        let error = ConfigError::NotPositive {
            field: "minutes_increment",
            value: 0,
        };
        assert_eq!(
            error.to_string(),
            "minutes_increment must be a positive integer, got 0"
        );
    }

    #[test]
    fn test_schema_mismatch_display() {
        let error = ConfigError::SchemaKeysMismatch {
            missing: vec!["courts".to_string()],
            extra: vec![],
        };
        assert!(error.to_string().contains("courts"));
    }
}

//! SQLite row conversion functions.
//!
//! Pure functions for converting between SQLite rows and domain types.
//! These are testable in isolation without database access.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use reserveit_core::reservation::{Reservation, SyncState};
use reserveit_core::storage::RepositoryError;
use rusqlite::Row;
use uuid::Uuid;

/// Storage format of reservation start and end times.
///
/// Fixed width, so text comparison orders like time.
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Convert a SQLite row to a Reservation.
///
/// Expected columns: id, resource, calendar, name, email, start_at, end_at,
/// shareable, remind_me, custom_fields, event_id, sync_state, created_at
pub fn row_to_reservation(row: &Row) -> rusqlite::Result<Reservation> {
    let id: String = row.get(0)?;
    let resource: String = row.get(1)?;
    let calendar: String = row.get(2)?;
    let name: String = row.get(3)?;
    let email: String = row.get(4)?;
    let start_at: String = row.get(5)?;
    let end_at: String = row.get(6)?;
    let shareable: bool = row.get(7)?;
    let remind_me: bool = row.get(8)?;
    let custom_fields: String = row.get(9)?;
    let event_id: Option<String> = row.get(10)?;
    let sync_state: String = row.get(11)?;
    let created_at: String = row.get(12)?;

    Ok(Reservation {
        id: parse_uuid(&id)?,
        resource,
        calendar,
        name,
        email,
        start: parse_local_datetime(&start_at)?,
        end: parse_local_datetime(&end_at)?,
        shareable,
        remind_me,
        custom_fields: json_to_custom_fields_internal(&custom_fields)?,
        event_id,
        sync_state: parse_sync_state(&sync_state)?,
        created_at: parse_datetime(&created_at)?,
    })
}

/// Serialize custom field values to a JSON string.
pub fn custom_fields_to_json(fields: &BTreeMap<String, String>) -> Result<String, RepositoryError> {
    serde_json::to_string(fields).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

/// Internal version that returns rusqlite::Result for use in row conversions.
fn json_to_custom_fields_internal(json: &str) -> rusqlite::Result<BTreeMap<String, String>> {
    serde_json::from_str(json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Parse a UUID from string.
fn parse_uuid(s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Parse a wall-clock datetime stored with [`format_local_datetime`].
fn parse_local_datetime(s: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Parse a datetime from RFC 3339 string.
fn parse_datetime(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(12, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Parse SyncState from string.
fn parse_sync_state(s: &str) -> rusqlite::Result<SyncState> {
    s.parse().map_err(|message: String| {
        rusqlite::Error::FromSqlConversionFailure(
            11,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
        )
    })
}

/// Format a DateTime<Utc> for SQLite storage (RFC 3339).
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Format a reservation start or end for SQLite storage.
pub fn format_local_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_local_datetime_roundtrip_keeps_text_order() {
        let morning = NaiveDate::from_ymd_opt(2030, 5, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let evening = NaiveDate::from_ymd_opt(2030, 5, 1)
            .unwrap()
            .and_hms_opt(21, 30, 0)
            .unwrap();

        let (a, b) = (format_local_datetime(&morning), format_local_datetime(&evening));
        assert_eq!(a, "2030-05-01T09:00:00");
        assert!(a < b);
        assert_eq!(parse_local_datetime(&b).unwrap(), evening);
    }

    #[test]
    fn test_custom_fields_json() {
        let mut fields = BTreeMap::new();
        fields.insert("players".to_string(), "4".to_string());

        let json = custom_fields_to_json(&fields).unwrap();
        assert_eq!(json, r#"{"players":"4"}"#);
        assert_eq!(json_to_custom_fields_internal(&json).unwrap(), fields);
    }

    #[test]
    fn test_invalid_values_fail_conversion() {
        assert!(parse_uuid("not-a-uuid").is_err());
        assert!(parse_sync_state("unknown").is_err());
        assert!(parse_local_datetime("2030-05-01 09:00").is_err());
        assert!(json_to_custom_fields_internal("[1, 2]").is_err());
    }

    #[test]
    fn test_sync_state_parses() {
        assert_eq!(
            parse_sync_state("needs_reconciliation").unwrap(),
            SyncState::NeedsReconciliation
        );
    }
}

//! SQLite schema definitions and SQL query constants.
//!
//! Each resource has its own database file, so the table holds a single
//! resource's reservations.

/// SQL statement to create all tables.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS reservations (
    id TEXT PRIMARY KEY,
    resource TEXT NOT NULL,
    calendar TEXT NOT NULL,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    start_at TEXT NOT NULL,
    end_at TEXT NOT NULL,
    shareable INTEGER NOT NULL,
    remind_me INTEGER NOT NULL,
    custom_fields TEXT NOT NULL,
    event_id TEXT,
    sync_state TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reservations_start_at ON reservations(start_at);
CREATE INDEX IF NOT EXISTS idx_reservations_sync_state ON reservations(sync_state);
"#;

pub const INSERT_RESERVATION: &str = r#"
INSERT INTO reservations (id, resource, calendar, name, email, start_at, end_at, shareable, remind_me, custom_fields, event_id, sync_state, created_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
"#;

pub const SELECT_RESERVATION_BY_ID: &str = r#"
SELECT id, resource, calendar, name, email, start_at, end_at, shareable, remind_me, custom_fields, event_id, sync_state, created_at
FROM reservations
WHERE id = ?1
"#;

/// Reservations intersecting `[?1, ?2)`. Timestamps compare as ISO 8601 text.
pub const SELECT_OVERLAPPING: &str = r#"
SELECT id, resource, calendar, name, email, start_at, end_at, shareable, remind_me, custom_fields, event_id, sync_state, created_at
FROM reservations
WHERE start_at < ?2 AND end_at > ?1
ORDER BY start_at ASC
"#;

pub const SELECT_BY_SYNC_STATE: &str = r#"
SELECT id, resource, calendar, name, email, start_at, end_at, shareable, remind_me, custom_fields, event_id, sync_state, created_at
FROM reservations
WHERE sync_state = ?1
ORDER BY created_at ASC
"#;

pub const DELETE_RESERVATION: &str = r#"
DELETE FROM reservations
WHERE id = ?1
"#;

pub const UPDATE_SYNC_STATE: &str = r#"
UPDATE reservations
SET event_id = ?2, sync_state = ?3
WHERE id = ?1
"#;

pub const UPDATE_SYNC_STATE_ONLY: &str = r#"
UPDATE reservations
SET sync_state = ?2
WHERE id = ?1
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_is_valid_sql() {
        assert!(CREATE_TABLES.contains("CREATE TABLE IF NOT EXISTS reservations"));
        assert!(CREATE_TABLES.contains("idx_reservations_start_at"));
    }

    #[test]
    fn test_queries_contain_expected_keywords() {
        assert!(INSERT_RESERVATION.contains("INSERT"));
        assert!(SELECT_RESERVATION_BY_ID.contains("WHERE id = ?1"));
        assert!(SELECT_OVERLAPPING.contains("start_at < ?2 AND end_at > ?1"));
        assert!(SELECT_BY_SYNC_STATE.contains("sync_state = ?1"));
        assert!(DELETE_RESERVATION.contains("DELETE"));
        assert!(UPDATE_SYNC_STATE.contains("UPDATE"));
        assert!(UPDATE_SYNC_STATE_ONLY.contains("UPDATE"));
    }
}

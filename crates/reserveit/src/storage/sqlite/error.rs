//! SQLite error mapping.
//!
//! Maps `tokio_rusqlite::Error` and `rusqlite::Error` to `RepositoryError` from `reserveit_core::storage`.

use reserveit_core::storage::RepositoryError;

const ENTITY: &str = "Reservation";

/// Maps a rusqlite error to a RepositoryError.
///
/// # Error Mapping
///
/// - `SQLITE_CONSTRAINT_PRIMARYKEY`/`UNIQUE` → `RepositoryError::AlreadyExists`
/// - `SQLITE_BUSY`/`SQLITE_LOCKED` and open failures → `RepositoryError::ConnectionFailed`
/// - No rows → `RepositoryError::NotFound`
/// - Conversion failures → `RepositoryError::InvalidData`
/// - All other errors → `RepositoryError::QueryFailed`
fn map_rusqlite_error(err: &rusqlite::Error, id: Option<&str>) -> RepositoryError {
    let id = || id.unwrap_or("unknown").to_string();
    match err {
        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || sqlite_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepositoryError::AlreadyExists {
                entity_type: ENTITY,
                id: id(),
            }
        }

        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if matches!(
                sqlite_err.code,
                rusqlite::ErrorCode::CannotOpen
                    | rusqlite::ErrorCode::DatabaseBusy
                    | rusqlite::ErrorCode::DatabaseLocked
            ) =>
        {
            RepositoryError::ConnectionFailed(format!("Database unavailable: {err}"))
        }

        rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
            entity_type: ENTITY,
            id: id(),
        },

        rusqlite::Error::FromSqlConversionFailure(..) => {
            RepositoryError::InvalidData(format!("Stored {ENTITY} is malformed: {err}"))
        }

        _ => RepositoryError::QueryFailed(err.to_string()),
    }
}

fn map_tokio_error(err: tokio_rusqlite::Error, id: Option<&str>) -> RepositoryError {
    match &err {
        tokio_rusqlite::Error::Rusqlite(rusqlite_err) => map_rusqlite_error(rusqlite_err, id),
        tokio_rusqlite::Error::ConnectionClosed | tokio_rusqlite::Error::Close(_) => {
            RepositoryError::ConnectionFailed("Connection closed".to_string())
        }
        _ => RepositoryError::QueryFailed(err.to_string()),
    }
}

/// Maps a tokio_rusqlite error to a RepositoryError.
///
/// This is the main entry point for error mapping in async code.
pub fn map_tokio_rusqlite_error(err: tokio_rusqlite::Error) -> RepositoryError {
    map_tokio_error(err, None)
}

/// Maps a tokio_rusqlite error with a known reservation ID to a RepositoryError.
pub fn map_tokio_rusqlite_error_with_id(
    err: tokio_rusqlite::Error,
    id: impl Into<String>,
) -> RepositoryError {
    let id = id.into();
    map_tokio_error(err, Some(&id))
}

//! Pure mapping of store errors to HTTP status codes.

use super::RepositoryError;

/// Maps a [`RepositoryError`] to an HTTP status code.
///
/// Rows that fail to decode are a server fault, so `InvalidData` and
/// `Serialization` both map to 500. An unreachable store maps to 503.
///
/// ```
/// use reserveit_core::storage::{repository_error_to_status_code, RepositoryError};
///
/// let error = RepositoryError::ConnectionFailed("courts.db is locked".to_string());
/// assert_eq!(repository_error_to_status_code(&error), 503);
/// ```
pub fn repository_error_to_status_code(error: &RepositoryError) -> u16 {
    match error {
        RepositoryError::NotFound { .. } => 404,
        RepositoryError::AlreadyExists { .. } => 409,
        RepositoryError::ConnectionFailed(_) => 503,
        RepositoryError::QueryFailed(_)
        | RepositoryError::Serialization(_)
        | RepositoryError::InvalidData(_) => 500,
    }
}

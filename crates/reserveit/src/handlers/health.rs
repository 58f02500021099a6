//! Liveness check.

use axum::http::StatusCode;

/// GET /livez - Basic liveness check.
///
/// Returns 200 immediately. Used to check if the server is accepting connections.
pub async fn livez() -> StatusCode {
    StatusCode::OK
}

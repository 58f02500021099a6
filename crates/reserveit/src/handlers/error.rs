use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use reserveit_core::calendar::CalendarError;
use reserveit_core::reservation::{reservation_error_to_status_code, ReservationError};
use reserveit_core::storage::{repository_error_to_status_code, RepositoryError};

use super::{HtmlTemplate, MessageTemplate};

/// Handler error rendered as a message fragment.
///
/// Reservation, storage and calendar errors keep their own status codes.
/// Anything else is logged and shown as a generic 500.
pub struct AppError(pub anyhow::Error);

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn calendar_error_to_status_code(error: &CalendarError) -> u16 {
    match error {
        CalendarError::Unavailable(_) => 503,
        CalendarError::EventNotFound { .. } => 404,
        CalendarError::UnknownCalendar(_) => 500,
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, Vec<String>) {
        if let Some(error) = self.0.downcast_ref::<ReservationError>() {
            let code = status(reservation_error_to_status_code(error));
            return match error {
                ReservationError::Validation { messages } => {
                    (code, "Please correct the following", messages.clone())
                }
                ReservationError::Conflict { .. } => {
                    (code, "That time is no longer available", error.messages())
                }
                ReservationError::NotFound => (
                    code,
                    "Reservation not found",
                    vec!["No reservation matches that code and email.".to_string()],
                ),
            };
        }

        let code = if let Some(error) = self.0.downcast_ref::<RepositoryError>() {
            status(repository_error_to_status_code(error))
        } else if let Some(error) = self.0.downcast_ref::<CalendarError>() {
            status(calendar_error_to_status_code(error))
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        match code {
            StatusCode::NOT_FOUND => (code, "Reservation not found", Vec::new()),
            StatusCode::SERVICE_UNAVAILABLE => (
                code,
                "Service temporarily unavailable",
                vec!["Please try again in a moment.".to_string()],
            ),
            _ => (code, "Something went wrong", Vec::new()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, heading, messages) = self.parts();
        if status_code.is_server_error() {
            tracing::error!(status = %status_code, error = %self.0, "Request failed");
        } else {
            tracing::debug!(status = %status_code, error = %self.0, "Request rejected");
        }

        (
            status_code,
            HtmlTemplate(MessageTemplate::error(heading, messages)),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

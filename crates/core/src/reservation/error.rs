use chrono::NaiveDateTime;
use thiserror::Error;

/// Per-request failures of a reservation or cancellation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReservationError {
    #[error("Invalid reservation: {}", .messages.join("; "))]
    Validation { messages: Vec<String> },
    #[error("No {resource} calendar is free from {start} to {end}")]
    Conflict {
        resource: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    #[error("Reservation not found")]
    NotFound,
}

impl ReservationError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            messages: vec![message.into()],
        }
    }

    /// Conflicts are a kind of validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Conflict { .. })
    }

    /// Messages shown to the requester.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation { messages } => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}

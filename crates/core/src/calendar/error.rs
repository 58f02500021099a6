use thiserror::Error;

/// Errors reported by a calendar backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Calendar backend unavailable: {0}")]
    Unavailable(String),
    #[error("Event {event_id} not found in calendar {calendar_id}")]
    EventNotFound {
        calendar_id: String,
        event_id: String,
    },
    #[error("Unknown calendar: {0}")]
    UnknownCalendar(String),
}

/// Result type for calendar backend operations.
pub type Result<T> = std::result::Result<T, CalendarError>;

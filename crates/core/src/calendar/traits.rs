use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::{BusyInterval, CalendarEventRequest, Result};

/// A calendar backend that stores reservation events.
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Occupied intervals of a calendar that overlap `[start, end)`.
    async fn busy_intervals(
        &self,
        calendar_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<BusyInterval>>;

    /// Creates an event and returns its backend id.
    async fn create_event(&self, event: &CalendarEventRequest) -> Result<String>;

    /// Deletes an event.
    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<()>;
}

//! In-process calendar backend.
//!
//! Holds events in memory and reports them back as busy intervals, so the
//! live app runs end to end without a remote calendar provider.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use reserveit_core::calendar::{
    BusyInterval, CalendarError, CalendarEventRequest, CalendarService, Result,
};
use reserveit_core::reservation::overlaps;

/// Calendar events kept in process memory, keyed by calendar id then event id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCalendar {
    events: Arc<RwLock<HashMap<String, BTreeMap<String, CalendarEventRequest>>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    async fn insert(&self, event: CalendarEventRequest) -> String {
        let event_id = Uuid::new_v4().simple().to_string();
        self.events
            .write()
            .await
            .entry(event.calendar_id.clone())
            .or_default()
            .insert(event_id.clone(), event);
        event_id
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CalendarError::Unavailable(
                "in-memory calendar switched off".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CalendarService for InMemoryCalendar {
    async fn busy_intervals(
        &self,
        calendar_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<BusyInterval>> {
        self.check_available()?;
        let events = self.events.read().await;
        let mut busy: Vec<BusyInterval> = events
            .get(calendar_id)
            .into_iter()
            .flat_map(BTreeMap::values)
            .filter(|event| overlaps(event.start, event.end, start, end))
            .map(|event| BusyInterval::new(calendar_id, event.start, event.end))
            .collect();
        busy.sort_by_key(|interval| interval.start);
        Ok(busy)
    }

    async fn create_event(&self, event: &CalendarEventRequest) -> Result<String> {
        self.check_available()?;
        let event_id = self.insert(event.clone()).await;
        tracing::debug!(calendar_id = %event.calendar_id, event_id = %event_id, "Created calendar event");
        Ok(event_id)
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<()> {
        self.check_available()?;
        let mut events = self.events.write().await;
        events
            .get_mut(calendar_id)
            .and_then(|calendar| calendar.remove(event_id))
            .map(|_| ())
            .ok_or_else(|| CalendarError::EventNotFound {
                calendar_id: calendar_id.to_string(),
                event_id: event_id.to_string(),
            })
    }
}

#[cfg(test)]
impl InMemoryCalendar {
    /// Makes every call fail with [`CalendarError::Unavailable`] until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Adds an event created outside the app, such as a maintenance block.
    pub async fn block(
        &self,
        calendar_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> String {
        let event = CalendarEventRequest {
            calendar_id: calendar_id.to_string(),
            summary: "Blocked".to_string(),
            description: String::new(),
            start,
            end,
            timezone: String::new(),
            attendee_email: String::new(),
            reminder_minutes: None,
        };
        self.insert(event).await
    }

    /// Number of events across every calendar.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.values().map(BTreeMap::len).sum()
    }
}

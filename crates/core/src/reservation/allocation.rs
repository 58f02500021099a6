//! Calendar allocation.
//!
//! A resource's calendars are its capacity: a request is assigned to the first
//! calendar, in short-name order, that is free locally and remotely.

use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use super::{Reservation, ReservationRequest};
use crate::calendar::BusyInterval;
use crate::resource::ResourceConfig;

/// Whether `[a_start, a_end)` and `[b_start, b_end)` intersect.
pub fn overlaps(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// A remote busy interval resolved to a calendar short-name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusySlot {
    pub calendar: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Everything a store needs to atomically place a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationCandidate {
    pub resource: String,
    /// Calendar short-names in allocation order.
    pub calendars: Vec<String>,
    pub busy: Vec<BusySlot>,
    pub request: ReservationRequest,
}

impl ReservationCandidate {
    /// Builds a candidate, keeping only busy intervals of this resource's calendars.
    pub fn new(
        resource: &ResourceConfig,
        request: ReservationRequest,
        busy_intervals: &[BusyInterval],
    ) -> Self {
        let busy = busy_intervals
            .iter()
            .filter_map(|interval| {
                resource
                    .calendar_label(&interval.calendar_id)
                    .map(|label| BusySlot {
                        calendar: label.to_string(),
                        start: interval.start,
                        end: interval.end,
                    })
            })
            .collect();

        Self {
            resource: resource.file_prefix.clone(),
            calendars: resource.calendars.keys().cloned().collect(),
            busy,
            request,
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.request.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.request.end
    }

    /// First calendar free of both `existing` reservations and remote busy slots.
    pub fn allocate(&self, existing: &[Reservation]) -> Option<&str> {
        let (start, end) = (self.start(), self.end());
        self.calendars
            .iter()
            .find(|calendar| {
                let booked = existing
                    .iter()
                    .any(|r| &r.calendar == *calendar && r.overlaps(start, end));
                let busy = self
                    .busy
                    .iter()
                    .any(|b| &b.calendar == *calendar && overlaps(b.start, b.end, start, end));
                !booked && !busy
            })
            .map(String::as_str)
    }

    /// Allocates a calendar and builds the reservation to store.
    pub fn place(&self, existing: &[Reservation], now: DateTime<Utc>) -> Option<Reservation> {
        let calendar = self.allocate(existing)?;
        Some(Reservation::from_request(
            self.resource.clone(),
            calendar,
            self.request.clone(),
            Uuid::new_v4(),
            now,
        ))
    }
}

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::reservation::Reservation;
use crate::resource::ResourceConfig;

/// A time range during which a backing calendar is already occupied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub calendar_id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl BusyInterval {
    pub fn new(calendar_id: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            start,
            end,
        }
    }
}

/// An event to be written to a backing calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEventRequest {
    pub calendar_id: String,
    pub summary: String,
    pub description: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub timezone: String,
    pub attendee_email: String,
    /// Minutes before start at which the attendee is reminded, if they asked.
    pub reminder_minutes: Option<u32>,
}

impl CalendarEventRequest {
    /// Builds the event for a stored reservation.
    ///
    /// Returns `None` when the reservation's calendar is not one of the
    /// resource's calendars.
    pub fn for_reservation(
        resource: &ResourceConfig,
        reservation: &Reservation,
        timezone: &str,
    ) -> Option<Self> {
        let calendar = resource.calendars.get(&reservation.calendar)?;

        let mut description = format!("Reserved by {} <{}>", reservation.name, reservation.email);
        if reservation.shareable {
            description.push_str("\nWilling to share");
        }
        for (name, value) in &reservation.custom_fields {
            let label = resource
                .custom_field(name)
                .map(|field| field.label.as_str())
                .unwrap_or(name.as_str());
            description.push_str(&format!("\n{label}: {value}"));
        }

        Some(Self {
            calendar_id: calendar.id.clone(),
            summary: format!("{} ({})", reservation.name, reservation.calendar),
            description,
            start: reservation.start,
            end: reservation.end,
            timezone: timezone.to_string(),
            attendee_email: reservation.email.clone(),
            reminder_minutes: reservation
                .remind_me
                .then_some(resource.minutes_before_reminder),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reservation::{ReservationRequest, SyncState};
    use crate::resource::{CalendarInfo, ResourceConfigSpec};
    use chrono::{NaiveDate, Utc};
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 5, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn resource() -> ResourceConfig {
        ResourceConfig::try_from(
            ResourceConfigSpec::new("courts", "Courts")
                .with_calendar("court-1", CalendarInfo::new("c1@group")),
        )
        .unwrap()
    }

    fn reservation(remind_me: bool) -> Reservation {
        let request = ReservationRequest {
            name: "Ada".to_string(),
            email: "ada@example.org".to_string(),
            start: at(9),
            end: at(10),
            shareable: true,
            remind_me,
            custom_fields: BTreeMap::from([("partner".to_string(), "Grace".to_string())]),
        };
        Reservation::from_request("courts", "court-1", request, Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn test_event_for_reservation() {
        let event =
            CalendarEventRequest::for_reservation(&resource(), &reservation(true), "UTC").unwrap();

        assert_eq!(event.calendar_id, "c1@group");
        assert_eq!(event.summary, "Ada (court-1)");
        assert_eq!(event.reminder_minutes, Some(60));
        assert!(event.description.contains("Willing to share"));
        assert!(event.description.contains("partner: Grace"));
        assert_eq!(event.start, at(9));
    }

    #[test]
    fn test_no_reminder_unless_requested() {
        let event =
            CalendarEventRequest::for_reservation(&resource(), &reservation(false), "UTC").unwrap();
        assert_eq!(event.reminder_minutes, None);
    }

    #[test]
    fn test_unknown_calendar() {
        let mut stray = reservation(false);
        stray.calendar = "court-9".to_string();
        stray.sync_state = SyncState::Pending;
        assert!(CalendarEventRequest::for_reservation(&resource(), &stray, "UTC").is_none());
    }
}

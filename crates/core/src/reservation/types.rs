use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Calendar synchronization state of a stored reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Stored locally, calendar event not yet attempted.
    Pending,
    /// The calendar event exists.
    Synced,
    /// Creating the calendar event failed; retried at startup.
    NeedsReconciliation,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Pending => "pending",
            SyncState::Synced => "synced",
            SyncState::NeedsReconciliation => "needs_reconciliation",
        }
    }
}

impl FromStr for SyncState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SyncState::Pending),
            "synced" => Ok(SyncState::Synced),
            "needs_reconciliation" => Ok(SyncState::NeedsReconciliation),
            other => Err(format!("Unknown sync state: {other}")),
        }
    }
}

/// A validated reservation request, not yet assigned to a calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub name: String,
    pub email: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub shareable: bool,
    pub remind_me: bool,
    pub custom_fields: BTreeMap<String, String>,
}

/// A stored reservation.
///
/// The id doubles as the cancellation token handed to the requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    /// `file_prefix` of the reserved resource.
    pub resource: String,
    /// Short-name of the assigned calendar.
    pub calendar: String,
    pub name: String,
    pub email: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub shareable: bool,
    pub remind_me: bool,
    pub custom_fields: BTreeMap<String, String>,
    pub event_id: Option<String>,
    pub sync_state: SyncState,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn from_request(
        resource: impl Into<String>,
        calendar: impl Into<String>,
        request: ReservationRequest,
        id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            resource: resource.into(),
            calendar: calendar.into(),
            name: request.name,
            email: request.email,
            start: request.start,
            end: request.end,
            shareable: request.shareable,
            remind_me: request.remind_me,
            custom_fields: request.custom_fields,
            event_id: None,
            sync_state: SyncState::Pending,
            created_at,
        }
    }

    /// Whether the reservation intersects `[start, end)`.
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        super::allocation::overlaps(self.start, self.end, start, end)
    }

    /// Whether `email` is the booking email, ignoring case.
    pub fn booked_by(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}

/// A parsed cancellation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelRequest {
    pub reservation_id: Uuid,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 5, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn reservation() -> Reservation {
        Reservation::from_request(
            "courts",
            "court-1",
            ReservationRequest {
                name: "Ada".to_string(),
                email: "Ada@Example.org".to_string(),
                start: at(9),
                end: at(11),
                shareable: false,
                remind_me: false,
                custom_fields: BTreeMap::new(),
            },
            Uuid::new_v4(),
            Utc::now(),
        )
    }

    #[test]
    fn test_sync_state_round_trips_through_str() {
        for state in [
            SyncState::Pending,
            SyncState::Synced,
            SyncState::NeedsReconciliation,
        ] {
            assert_eq!(state.as_str().parse::<SyncState>(), Ok(state));
        }
        assert!("done".parse::<SyncState>().is_err());
    }

    #[test]
    fn test_new_reservation_is_pending() {
        let reservation = reservation();
        assert_eq!(reservation.sync_state, SyncState::Pending);
        assert!(reservation.event_id.is_none());
    }

    #[test]
    fn test_overlaps_is_half_open() {
        let reservation = reservation();
        assert!(reservation.overlaps(at(10), at(12)));
        assert!(reservation.overlaps(at(8), at(10)));
        assert!(!reservation.overlaps(at(11), at(12)));
        assert!(!reservation.overlaps(at(7), at(9)));
    }

    #[test]
    fn test_booked_by_ignores_case() {
        let reservation = reservation();
        assert!(reservation.booked_by("ada@example.org"));
        assert!(reservation.booked_by(" ADA@EXAMPLE.ORG "));
        assert!(!reservation.booked_by("grace@example.org"));
    }
}

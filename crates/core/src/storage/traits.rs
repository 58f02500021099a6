use async_trait::async_trait;
use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::reservation::{Reservation, ReservationCandidate};

use super::Result;

/// Persistence for one resource's reservations.
///
/// Each resource owns its own store; stores never share state.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Atomically allocates a calendar and stores the reservation.
    ///
    /// Returns `None` when every calendar overlaps an existing reservation
    /// or a busy interval carried by the candidate.
    async fn insert_if_available(
        &self,
        candidate: &ReservationCandidate,
    ) -> Result<Option<Reservation>>;

    /// Gets a reservation by its id.
    async fn get_reservation(&self, id: Uuid) -> Result<Option<Reservation>>;

    /// Reservations intersecting `[start, end)`, ordered by start.
    async fn list_overlapping(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Reservation>>;

    /// Deletes a reservation. Fails with `NotFound` if it does not exist.
    async fn delete_reservation(&self, id: Uuid) -> Result<()>;

    /// Records the calendar event id and marks the reservation synced.
    async fn mark_synced(&self, id: Uuid, event_id: &str) -> Result<()>;

    /// Flags a reservation whose calendar event could not be created.
    async fn mark_needs_reconciliation(&self, id: Uuid) -> Result<()>;

    /// Reservations flagged for reconciliation, oldest first.
    async fn list_needing_reconciliation(&self) -> Result<Vec<Reservation>>;

    /// Releases the underlying store.
    async fn close(&self) -> Result<()>;
}

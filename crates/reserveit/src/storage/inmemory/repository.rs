//! In-memory repository implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use reserveit_core::reservation::{Reservation, ReservationCandidate, SyncState};
use reserveit_core::storage::{RepositoryError, ReservationRepository, Result};

const ENTITY: &str = "Reservation";

/// In-memory storage backend.
///
/// Uses a HashMap wrapped in `Arc<RwLock<_>>` for thread-safe access.
/// Data is not persisted and will be lost when the repository is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    reservations: Arc<RwLock<HashMap<Uuid, Reservation>>>,
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    async fn set_sync_state(
        &self,
        id: Uuid,
        event_id: Option<&str>,
        state: SyncState,
    ) -> Result<()> {
        let mut reservations = self.reservations.write().await;
        let reservation = reservations
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound {
                entity_type: ENTITY,
                id: id.to_string(),
            })?;
        if let Some(event_id) = event_id {
            reservation.event_id = Some(event_id.to_string());
        }
        reservation.sync_state = state;
        Ok(())
    }
}

#[async_trait]
impl ReservationRepository for InMemoryRepository {
    async fn insert_if_available(
        &self,
        candidate: &ReservationCandidate,
    ) -> Result<Option<Reservation>> {
        // The write guard spans the availability check and the insert.
        let mut reservations = self.reservations.write().await;
        let existing: Vec<Reservation> = reservations
            .values()
            .filter(|r| r.overlaps(candidate.start(), candidate.end()))
            .cloned()
            .collect();

        let Some(reservation) = candidate.place(&existing, Utc::now()) else {
            return Ok(None);
        };
        reservations.insert(reservation.id, reservation.clone());
        Ok(Some(reservation))
    }

    async fn get_reservation(&self, id: Uuid) -> Result<Option<Reservation>> {
        let reservations = self.reservations.read().await;
        Ok(reservations.get(&id).cloned())
    }

    async fn list_overlapping(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Reservation>> {
        let reservations = self.reservations.read().await;
        let mut found: Vec<Reservation> = reservations
            .values()
            .filter(|r| r.overlaps(start, end))
            .cloned()
            .collect();
        found.sort_by_key(|r| r.start);
        Ok(found)
    }

    async fn delete_reservation(&self, id: Uuid) -> Result<()> {
        let mut reservations = self.reservations.write().await;
        if reservations.remove(&id).is_none() {
            return Err(RepositoryError::NotFound {
                entity_type: ENTITY,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn mark_synced(&self, id: Uuid, event_id: &str) -> Result<()> {
        self.set_sync_state(id, Some(event_id), SyncState::Synced)
            .await
    }

    async fn mark_needs_reconciliation(&self, id: Uuid) -> Result<()> {
        self.set_sync_state(id, None, SyncState::NeedsReconciliation)
            .await
    }

    async fn list_needing_reconciliation(&self) -> Result<Vec<Reservation>> {
        let reservations = self.reservations.read().await;
        let mut found: Vec<Reservation> = reservations
            .values()
            .filter(|r| r.sync_state == SyncState::NeedsReconciliation)
            .cloned()
            .collect();
        found.sort_by_key(|r| r.created_at);
        Ok(found)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

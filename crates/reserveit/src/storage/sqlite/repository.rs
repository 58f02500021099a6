//! SQLite repository implementation.
//!
//! Implements `ReservationRepository` from `reserveit_core::storage` using SQLite.

use std::path::Path;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use rusqlite::TransactionBehavior;
use tokio_rusqlite::Connection;
use uuid::Uuid;

use reserveit_core::reservation::{Reservation, ReservationCandidate, SyncState};
use reserveit_core::storage::{RepositoryError, ReservationRepository, Result};

use super::conversions::{
    custom_fields_to_json, format_datetime, format_local_datetime, row_to_reservation,
};
use super::error::{map_tokio_rusqlite_error, map_tokio_rusqlite_error_with_id};
use super::schema;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// Runs a prepared query and collects every reservation row.
fn query_reservations(
    conn: &rusqlite::Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> tokio_rusqlite::Result<Vec<Reservation>> {
    let mut stmt = conn.prepare(sql).map_err(wrap_err)?;
    let rows = stmt
        .query_map(params, row_to_reservation)
        .map_err(wrap_err)?;

    let mut reservations = Vec::new();
    for row_result in rows {
        reservations.push(row_result.map_err(wrap_err)?);
    }
    Ok(reservations)
}

/// SQLite-backed store for one resource's reservations.
///
/// The connection runs on its own thread, so every closure passed to it
/// executes serially; `insert_if_available` additionally holds an immediate
/// transaction across its check and insert.
pub struct SqliteRepository {
    conn: Connection,
    resource: String,
    echo: bool,
}

impl SqliteRepository {
    /// Opens (creating if needed) the database file for `resource`.
    ///
    /// With `echo`, every SQL statement is logged at debug level.
    pub async fn open(path: &Path, resource: &str, echo: bool) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(format!("{}: {e}", path.display())))?;

        Self::init(conn, resource, echo).await
    }

    /// Creates a store backed by an in-memory database.
    ///
    /// Useful for testing - data is lost when the connection is dropped.
    #[cfg(test)]
    pub async fn new_in_memory(resource: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init(conn, resource, false).await
    }

    async fn init(conn: Connection, resource: &str, echo: bool) -> Result<Self> {
        let repository = Self {
            conn,
            resource: resource.to_string(),
            echo,
        };
        repository.echo(schema::CREATE_TABLES);
        repository
            .conn
            .call(|conn| {
                conn.execute_batch(schema::CREATE_TABLES)
                    .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(map_tokio_rusqlite_error)?;

        Ok(repository)
    }

    fn echo(&self, sql: &str) {
        if self.echo {
            tracing::debug!(resource = %self.resource, sql = %sql.trim(), "SQL");
        }
    }

    async fn update_sync_state(
        &self,
        id: Uuid,
        event_id: Option<String>,
        state: SyncState,
    ) -> Result<()> {
        let id_str = id.to_string();
        let sql = if event_id.is_some() {
            schema::UPDATE_SYNC_STATE
        } else {
            schema::UPDATE_SYNC_STATE_ONLY
        };
        self.echo(sql);

        self.conn
            .call(move |conn| {
                let rows = match event_id {
                    Some(event_id) => conn.execute(sql, rusqlite::params![id_str, event_id, state.as_str()]),
                    None => conn.execute(sql, rusqlite::params![id_str, state.as_str()]),
                }
                .map_err(wrap_err)?;
                if rows == 0 {
                    Err(wrap_err(rusqlite::Error::QueryReturnedNoRows))
                } else {
                    Ok(())
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, id.to_string()))
    }
}

#[async_trait]
impl ReservationRepository for SqliteRepository {
    async fn insert_if_available(
        &self,
        candidate: &ReservationCandidate,
    ) -> Result<Option<Reservation>> {
        let candidate = candidate.clone();
        let custom_fields = custom_fields_to_json(&candidate.request.custom_fields)?;
        let now = Utc::now();
        self.echo(schema::SELECT_OVERLAPPING);
        self.echo(schema::INSERT_RESERVATION);

        self.conn
            .call(move |conn| {
                let tx = conn
                    .transaction_with_behavior(TransactionBehavior::Immediate)
                    .map_err(wrap_err)?;

                let existing = query_reservations(
                    &tx,
                    schema::SELECT_OVERLAPPING,
                    [
                        format_local_datetime(&candidate.start()),
                        format_local_datetime(&candidate.end()),
                    ],
                )?;

                // Dropping the transaction rolls it back.
                let Some(reservation) = candidate.place(&existing, now) else {
                    return Ok(None);
                };

                tx.execute(
                    schema::INSERT_RESERVATION,
                    rusqlite::params![
                        reservation.id.to_string(),
                        reservation.resource,
                        reservation.calendar,
                        reservation.name,
                        reservation.email,
                        format_local_datetime(&reservation.start),
                        format_local_datetime(&reservation.end),
                        reservation.shareable,
                        reservation.remind_me,
                        custom_fields,
                        reservation.event_id,
                        reservation.sync_state.as_str(),
                        format_datetime(&reservation.created_at)
                    ],
                )
                .map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;

                Ok(Some(reservation))
            })
            .await
            .map_err(map_tokio_rusqlite_error)
    }

    async fn get_reservation(&self, id: Uuid) -> Result<Option<Reservation>> {
        let id_str = id.to_string();
        self.echo(schema::SELECT_RESERVATION_BY_ID);

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_RESERVATION_BY_ID)
                    .map_err(wrap_err)?;
                match stmt.query_row([&id_str], row_to_reservation) {
                    Ok(reservation) => Ok(Some(reservation)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(wrap_err(e)),
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, id.to_string()))
    }

    async fn list_overlapping(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Reservation>> {
        let range = [format_local_datetime(&start), format_local_datetime(&end)];
        self.echo(schema::SELECT_OVERLAPPING);

        self.conn
            .call(move |conn| query_reservations(conn, schema::SELECT_OVERLAPPING, range))
            .await
            .map_err(map_tokio_rusqlite_error)
    }

    async fn delete_reservation(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();
        self.echo(schema::DELETE_RESERVATION);

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(schema::DELETE_RESERVATION, [&id_str])
                    .map_err(wrap_err)?;
                if rows == 0 {
                    Err(wrap_err(rusqlite::Error::QueryReturnedNoRows))
                } else {
                    Ok(())
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, id.to_string()))
    }

    async fn mark_synced(&self, id: Uuid, event_id: &str) -> Result<()> {
        self.update_sync_state(id, Some(event_id.to_string()), SyncState::Synced)
            .await
    }

    async fn mark_needs_reconciliation(&self, id: Uuid) -> Result<()> {
        self.update_sync_state(id, None, SyncState::NeedsReconciliation)
            .await
    }

    async fn list_needing_reconciliation(&self) -> Result<Vec<Reservation>> {
        self.echo(schema::SELECT_BY_SYNC_STATE);

        self.conn
            .call(|conn| {
                query_reservations(
                    conn,
                    schema::SELECT_BY_SYNC_STATE,
                    [SyncState::NeedsReconciliation.as_str()],
                )
            })
            .await
            .map_err(map_tokio_rusqlite_error)
    }

    async fn close(&self) -> Result<()> {
        tracing::debug!(resource = %self.resource, "Closing SQLite store");
        self.conn
            .clone()
            .close()
            .await
            .map_err(map_tokio_rusqlite_error)
    }
}

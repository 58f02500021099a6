//! Resource bundles: one resource, its routes, its schema and its own store.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use reserveit_core::calendar::{CalendarEventRequest, CalendarService};
use reserveit_core::reservation::{RequestSchema, Reservation, SchemaSelection};
use reserveit_core::resource::{ConfigError, ResourceConfig, ResourceMap};
use reserveit_core::routing::{ResourceRoutes, RoutePlan};
use reserveit_core::storage::{RepositoryError, ReservationRepository};

use crate::storage::{InMemoryRepository, SqliteRepository};

/// Where bundles keep their reservations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// One `<file_prefix>.db` file per resource under `dir`.
    Sqlite { dir: PathBuf, echo: bool },
    /// An isolated in-memory store per resource.
    Memory,
}

impl StorageBackend {
    async fn open(
        &self,
        resource: &ResourceConfig,
    ) -> Result<Arc<dyn ReservationRepository>, RepositoryError> {
        match self {
            StorageBackend::Sqlite { dir, echo } => {
                let path = dir.join(format!("{}.db", resource.file_prefix));
                tracing::debug!(resource = %resource.file_prefix, path = %path.display(), "Opening SQLite store");
                let store = SqliteRepository::open(&path, &resource.file_prefix, *echo).await?;
                Ok(Arc::new(store))
            }
            StorageBackend::Memory => Ok(Arc::new(InMemoryRepository::new())),
        }
    }
}

#[derive(Debug, Error)]
pub enum BundleError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to create storage directory {}: {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to open the store of resource '{resource}': {source}")]
    Store {
        resource: String,
        #[source]
        source: RepositoryError,
    },
}

/// Everything the live app needs to serve one resource.
pub struct ResourceBundle {
    pub resource: Arc<ResourceConfig>,
    pub routes: ResourceRoutes,
    pub schema: RequestSchema,
    pub store: Arc<dyn ReservationRepository>,
}

impl ResourceBundle {
    pub fn identity(&self) -> &str {
        &self.resource.file_prefix
    }

    /// Writes the calendar event of a stored reservation.
    ///
    /// Returns whether the event exists afterwards. Failures leave the
    /// reservation flagged for reconciliation and are only logged.
    pub async fn sync_reservation(
        &self,
        calendar: &dyn CalendarService,
        timezone: &str,
        reservation: &Reservation,
    ) -> bool {
        let Some(event) = CalendarEventRequest::for_reservation(&self.resource, reservation, timezone)
        else {
            tracing::error!(
                resource = %self.identity(),
                reservation_id = %reservation.id,
                calendar = %reservation.calendar,
                "Reservation refers to an unknown calendar"
            );
            self.flag_for_reconciliation(reservation).await;
            return false;
        };

        match calendar.create_event(&event).await {
            Ok(event_id) => {
                if let Err(e) = self.store.mark_synced(reservation.id, &event_id).await {
                    tracing::error!(
                        resource = %self.identity(),
                        reservation_id = %reservation.id,
                        error = %e,
                        "Failed to record calendar event"
                    );
                }
                true
            }
            Err(e) => {
                tracing::warn!(
                    resource = %self.identity(),
                    reservation_id = %reservation.id,
                    error = %e,
                    "Calendar event creation failed, flagged for reconciliation"
                );
                self.flag_for_reconciliation(reservation).await;
                false
            }
        }
    }

    async fn flag_for_reconciliation(&self, reservation: &Reservation) {
        if let Err(e) = self.store.mark_needs_reconciliation(reservation.id).await {
            tracing::error!(
                resource = %self.identity(),
                reservation_id = %reservation.id,
                error = %e,
                "Failed to flag reservation for reconciliation"
            );
        }
    }

    /// Retries calendar sync for every flagged reservation.
    ///
    /// Returns how many reservations are synced afterwards.
    pub async fn reconcile(
        &self,
        calendar: &dyn CalendarService,
        timezone: &str,
    ) -> Result<usize, RepositoryError> {
        let pending = self.store.list_needing_reconciliation().await?;
        if pending.is_empty() {
            return Ok(0);
        }

        let mut synced = 0;
        for reservation in &pending {
            if self.sync_reservation(calendar, timezone, reservation).await {
                synced += 1;
            }
        }
        tracing::info!(
            resource = %self.identity(),
            pending = pending.len(),
            synced,
            "Reconciled calendar events"
        );
        Ok(synced)
    }
}

/// The assembled bundles of every resource and their route plan.
pub struct ResourceBundles {
    pub plan: RoutePlan,
    pub bundles: Vec<Arc<ResourceBundle>>,
}

impl ResourceBundles {
    /// Builds one bundle per resource, in resource order.
    ///
    /// Schemas and routes are resolved before any store is opened. If a
    /// store fails to open, the stores opened so far are closed before the
    /// error is returned.
    pub async fn assemble(
        resources: &ResourceMap,
        selection: &SchemaSelection,
        backend: &StorageBackend,
    ) -> Result<Self, BundleError> {
        let mut schemas = selection.resolve(resources)?;
        let plan = RoutePlan::plan(resources)?;

        if let StorageBackend::Sqlite { dir, .. } = backend {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| BundleError::Directory {
                    path: dir.clone(),
                    source,
                })?;
        }

        let mut bundles: Vec<Arc<ResourceBundle>> = Vec::with_capacity(resources.len());
        for (resource, routes) in resources.iter().zip(&plan.resources) {
            let identity = resource.file_prefix.clone();
            let Some(schema) = schemas.remove(&identity) else {
                close_stores(&bundles).await;
                return Err(ConfigError::SchemaKeysMismatch {
                    missing: vec![identity],
                    extra: Vec::new(),
                }
                .into());
            };

            let store = match backend.open(resource).await {
                Ok(store) => store,
                Err(source) => {
                    close_stores(&bundles).await;
                    return Err(BundleError::Store {
                        resource: identity,
                        source,
                    });
                }
            };

            tracing::info!(resource = %identity, base = %routes.base, "Assembled resource bundle");
            bundles.push(Arc::new(ResourceBundle {
                resource: Arc::clone(resource),
                routes: routes.clone(),
                schema,
                store,
            }));
        }

        Ok(Self { plan, bundles })
    }

    /// Retries calendar sync for every bundle. Failures are logged per bundle.
    pub async fn reconcile_all(&self, calendar: &dyn CalendarService, timezone: &str) {
        for bundle in &self.bundles {
            if let Err(e) = bundle.reconcile(calendar, timezone).await {
                tracing::warn!(resource = %bundle.identity(), error = %e, "Reconciliation failed");
            }
        }
    }
}

/// Releases every store, logging failures.
pub(crate) async fn close_stores(bundles: &[Arc<ResourceBundle>]) {
    for bundle in bundles {
        if let Err(e) = bundle.store.close().await {
            tracing::warn!(resource = %bundle.identity(), error = %e, "Failed to close store");
        }
    }
}

//! Composition root for the tracking engine.
//!
//! This is the only place that imports concrete outbound adapters.

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    adapters::outbound::{
        postgres::{PostgresTimeEntryStore, PostgresUserDirectory},
        CachedUserDirectory, ResilientStore,
    },
    config::TimeTrackingSettings,
    domain::{
        ports::{inbound::TimeTrackingService, outbound::SystemClock},
        services::TimeTrackingServiceImpl,
    },
    repositories::{TimeEntryRepositoryImpl, WorkerRepositoryImpl},
};

type EntryStore = ResilientStore<PostgresTimeEntryStore<TimeEntryRepositoryImpl>>;
type WorkerDirectory = CachedUserDirectory<PostgresUserDirectory<WorkerRepositoryImpl>>;

/// Build the Postgres-backed time tracking service.
pub fn time_tracking_service(
    pool: PgPool,
    settings: &TimeTrackingSettings,
) -> Arc<dyn TimeTrackingService> {
    let entries = PostgresTimeEntryStore::new(Arc::new(TimeEntryRepositoryImpl::new(pool.clone())));
    let store: EntryStore = ResilientStore::new(Arc::new(entries), settings.retry_policy());

    let workers = PostgresUserDirectory::new(Arc::new(WorkerRepositoryImpl::new(pool)));
    let directory: WorkerDirectory = CachedUserDirectory::new(
        Arc::new(workers),
        settings.directory_cache_ttl(),
        settings.retry_policy().timeout,
    );

    tracing::debug!(
        edit_window_days = settings.edit_window_days,
        store_max_retries = settings.store_max_retries,
        "building time tracking service"
    );

    let service = TimeTrackingServiceImpl::new(
        Arc::new(store),
        Arc::new(directory),
        Arc::new(SystemClock),
        settings.rules(),
    );

    Arc::new(service)
}

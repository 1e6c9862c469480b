//! TTL cache and timeout in front of a [`UserDirectory`].

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use moka::sync::Cache;

use crate::domain::{
    models::{WorkerId, WorkerProfile},
    ports::outbound::UserDirectory,
    TimeTrackingError,
};

const MAX_CACHED_WORKERS: u64 = 10_000;

/// Caches resolved profiles so every request does not hit the database.
///
/// Only successful lookups are cached; unknown workers are asked again.
/// A lookup that outlives `timeout` fails with `StoreUnavailable`.
pub struct CachedUserDirectory<U> {
    inner: Arc<U>,
    cache: Cache<WorkerId, WorkerProfile>,
    timeout: Duration,
}

impl<U: UserDirectory> CachedUserDirectory<U> {
    pub fn new(inner: Arc<U>, ttl: Duration, timeout: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_CACHED_WORKERS)
            .time_to_live(ttl)
            .build();
        Self {
            inner,
            cache,
            timeout,
        }
    }
}

#[async_trait]
impl<U: UserDirectory> UserDirectory for CachedUserDirectory<U> {
    async fn resolve(&self, worker_id: WorkerId) -> Result<WorkerProfile, TimeTrackingError> {
        if let Some(profile) = self.cache.get(&worker_id) {
            return Ok(profile);
        }

        let profile = tokio::time::timeout(self.timeout, self.inner.resolve(worker_id))
            .await
            .map_err(|_| {
                tracing::error!(worker_id = %worker_id, "worker lookup timed out");
                TimeTrackingError::StoreUnavailable(format!(
                    "worker lookup timed out after {:?}",
                    self.timeout
                ))
            })??;
        tracing::debug!(worker_id = %worker_id, role = %profile.role, "cached worker profile");
        self.cache.insert(worker_id, profile.clone());
        Ok(profile)
    }
}

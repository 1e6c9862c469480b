//! PostgreSQL implementation of the UserDirectory port.

use std::sync::Arc;

use async_trait::async_trait;

use super::store_error;
use crate::domain::{
    models::{Role, WorkerId, WorkerProfile},
    ports::outbound::UserDirectory,
    TimeTrackingError,
};
use crate::repositories::{WorkerRepository, WorkerRepositoryImpl};

/// Adapter that resolves workers from the `workers` table.
pub struct PostgresUserDirectory<R = WorkerRepositoryImpl> {
    repo: Arc<R>,
}

impl<R> PostgresUserDirectory<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl<R: WorkerRepository + Send + Sync + 'static> UserDirectory for PostgresUserDirectory<R> {
    async fn resolve(&self, worker_id: WorkerId) -> Result<WorkerProfile, TimeTrackingError> {
        let worker = self
            .repo
            .get_worker(worker_id.as_i32())
            .await
            .map_err(|e| TimeTrackingError::from(store_error(e)))?
            .ok_or_else(|| TimeTrackingError::NotFound(format!("worker {worker_id}")))?;

        Ok(WorkerProfile::new(
            worker.id,
            worker.display_name,
            Role::from(worker.role),
        ))
    }
}

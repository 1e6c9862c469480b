use async_trait::async_trait;

use crate::domain::{
    models::{WorkerId, WorkerProfile},
    TimeTrackingError,
};

/// Outbound port for looking up workers.
///
/// Authentication happens elsewhere; the engine only needs to know who a
/// worker is and whether they are privileged.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    /// Resolve a worker. Unknown workers yield `TimeTrackingError::NotFound`.
    async fn resolve(&self, worker_id: WorkerId) -> Result<WorkerProfile, TimeTrackingError>;
}

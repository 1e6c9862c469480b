use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::broadcast;

use crate::domain::{
    models::{
        ActiveSession, CreateEntryRequest, RecentActivity, Report, ReportQuery, SessionEvent,
        StartSessionRequest, SwitchSessionRequest, Switched, TimeEntry, TimeEntryId,
        TimeEntryPatch, TimeRange, WorkerId,
    },
    TimeTrackingError,
};

/// Inbound port for time tracking operations.
///
/// This trait defines the use cases that HTTP handlers can invoke. Every
/// operation takes the acting worker; the implementation resolves it and
/// enforces ownership.
#[async_trait]
pub trait TimeTrackingService: Send + Sync + 'static {
    // ========================================================================
    // Session Operations
    // ========================================================================

    /// Get the worker's active session, if any. Pure read.
    async fn get_active_session(
        &self,
        acting: WorkerId,
    ) -> Result<Option<ActiveSession>, TimeTrackingError>;

    async fn start_session(
        &self,
        acting: WorkerId,
        request: StartSessionRequest,
    ) -> Result<TimeEntry, TimeTrackingError>;

    /// Close the active session and open a new one at the same instant.
    async fn switch_session(
        &self,
        acting: WorkerId,
        request: SwitchSessionRequest,
    ) -> Result<Switched, TimeTrackingError>;

    /// Stop the active session, now or at `at`.
    async fn stop_session(
        &self,
        acting: WorkerId,
        at: Option<OffsetDateTime>,
    ) -> Result<TimeEntry, TimeTrackingError>;

    // ========================================================================
    // Entry Operations
    // ========================================================================

    /// List entries of `worker` (defaults to the acting worker).
    async fn list_entries(
        &self,
        acting: WorkerId,
        worker: Option<WorkerId>,
        range: Option<TimeRange>,
    ) -> Result<Vec<TimeEntry>, TimeTrackingError>;

    /// Register an already closed entry.
    async fn create_entry(
        &self,
        acting: WorkerId,
        request: CreateEntryRequest,
    ) -> Result<TimeEntry, TimeTrackingError>;

    async fn edit_entry(
        &self,
        acting: WorkerId,
        id: TimeEntryId,
        patch: TimeEntryPatch,
    ) -> Result<TimeEntry, TimeTrackingError>;

    async fn delete_entry(&self, acting: WorkerId, id: TimeEntryId)
        -> Result<(), TimeTrackingError>;

    /// Whether the acting worker may still change the entry.
    async fn can_edit(&self, acting: WorkerId, id: TimeEntryId)
        -> Result<bool, TimeTrackingError>;

    // ========================================================================
    // Reporting
    // ========================================================================

    async fn report(
        &self,
        acting: WorkerId,
        query: ReportQuery,
    ) -> Result<Report, TimeTrackingError>;

    /// Distinct activity combinations the worker used most recently.
    async fn recent_activities(
        &self,
        acting: WorkerId,
        limit: usize,
    ) -> Result<Vec<RecentActivity>, TimeTrackingError>;

    /// Session events for all workers. Callers filter by worker.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

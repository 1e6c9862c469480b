//! Time entry store port (outbound).
//!
//! Defines the interface for durable storage of time entries, including the
//! conditional writes the session transitions rely on.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::models::{
    NewTimeEntry, TimeEntry, TimeEntryId, TimeEntryPatch, TimeRange, WorkerId,
};

/// Errors reported by a [`TimeEntryStore`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Transient: connection loss or timeouts. A write that failed this way
    /// may still have committed.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Transient, and nothing was written: serialization failure, deadlock
    /// or no connection acquired.
    #[error("store busy: {0}")]
    Busy(String),
    #[error("worker already has an open entry")]
    OpenEntryExists,
    /// A compare-and-set found the entry in a different state than expected.
    #[error("entry was modified concurrently")]
    PreconditionFailed,
    #[error("entry overlaps an existing closed entry")]
    Overlap,
    #[error("end time must be after start time")]
    InvalidInterval,
    #[error("time entry {0} not found")]
    NotFound(TimeEntryId),
    #[error("{0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Busy(_))
    }

    /// Whether a failed write can be repeated without risking a double apply.
    pub fn is_uncommitted(&self) -> bool {
        matches!(self, StoreError::Busy(_))
    }
}

/// Outbound port for time entry persistence.
///
/// Implementations must enforce, atomically, that a worker has at most one
/// open entry and that closed entries of a worker never overlap.
#[async_trait]
pub trait TimeEntryStore: Send + Sync + 'static {
    /// Persist a new entry.
    ///
    /// Fails with `OpenEntryExists` if the entry is open and the worker already
    /// has one. The check and the insert are one atomic step.
    async fn create(&self, entry: &NewTimeEntry) -> Result<TimeEntry, StoreError>;

    /// Apply a partial update to an entry.
    async fn update(
        &self,
        id: TimeEntryId,
        patch: &TimeEntryPatch,
    ) -> Result<TimeEntry, StoreError>;

    async fn delete(&self, id: TimeEntryId) -> Result<(), StoreError>;

    async fn get(&self, id: TimeEntryId) -> Result<Option<TimeEntry>, StoreError>;

    /// Entries of one worker, ordered by start time.
    ///
    /// With a range, only entries intersecting it are returned (open entries
    /// extend indefinitely).
    async fn query(
        &self,
        worker_id: WorkerId,
        range: Option<TimeRange>,
    ) -> Result<Vec<TimeEntry>, StoreError>;

    /// Entries of all workers, with the same range semantics as [`Self::query`].
    async fn query_all(&self, range: Option<TimeRange>) -> Result<Vec<TimeEntry>, StoreError>;

    /// The worker's open entry, if any.
    async fn open_entry(&self, worker_id: WorkerId) -> Result<Option<TimeEntry>, StoreError>;

    /// Close the worker's open entry, provided it is still `expected`.
    ///
    /// Fails with `PreconditionFailed` if the entry is no longer open.
    async fn close_open(
        &self,
        worker_id: WorkerId,
        expected: TimeEntryId,
        end_time: OffsetDateTime,
    ) -> Result<TimeEntry, StoreError>;

    /// Close `expected` at `at` and open `next`, as one transaction.
    ///
    /// Either both writes happen or neither does. Returns `(closed, opened)`.
    async fn switch_open(
        &self,
        worker_id: WorkerId,
        expected: TimeEntryId,
        at: OffsetDateTime,
        next: &NewTimeEntry,
    ) -> Result<(TimeEntry, TimeEntry), StoreError>;
}

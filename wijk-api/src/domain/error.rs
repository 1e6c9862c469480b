use thiserror::Error;

use crate::domain::{
    models::{TimeEntry, TimeEntryId},
    ports::outbound::StoreError,
};

/// Errors that can occur during time tracking operations.
///
/// Everything except `StoreUnavailable` and `Store` is a validation outcome
/// meant to be shown to the worker.
#[derive(Debug, Error)]
pub enum TimeTrackingError {
    #[error("a session is already active")]
    ActiveSessionExists,
    #[error("no active session")]
    NoActiveSession,
    #[error("invalid interval: {0}")]
    InvalidInterval(String),
    #[error("interval overlaps {} existing entries", .0.len())]
    OverlapConflict(Vec<TimeEntry>),
    #[error("entry is older than the edit window")]
    EditWindowExpired,
    #[error("invalid activity: {0}")]
    InvalidActivity(String),
    #[error("not allowed to act on another worker's entries")]
    Forbidden,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("time entry store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("time entry store error: {0}")]
    Store(String),
}

impl TimeTrackingError {
    pub fn entry_not_found(id: TimeEntryId) -> Self {
        Self::NotFound(format!("time entry {id}"))
    }

    pub fn invalid_interval(msg: impl Into<String>) -> Self {
        Self::InvalidInterval(msg.into())
    }
}

impl From<StoreError> for TimeTrackingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(reason) | StoreError::Busy(reason) => {
                Self::StoreUnavailable(reason)
            }
            StoreError::OpenEntryExists => Self::ActiveSessionExists,
            StoreError::PreconditionFailed => Self::NoActiveSession,
            // Callers that can name the conflicting entries re-read them first.
            StoreError::Overlap => Self::OverlapConflict(Vec::new()),
            StoreError::InvalidInterval => {
                Self::invalid_interval("end time must be after start time")
            }
            StoreError::NotFound(id) => Self::entry_not_found(id),
            StoreError::Backend(reason) => Self::Store(reason),
        }
    }
}

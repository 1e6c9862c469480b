use time::{Duration, OffsetDateTime};

use super::{ActivityDetail, ActivityKind, TimeEntry, WorkerId};

/// Request to start a new session.
#[derive(Debug, Clone)]
pub struct StartSessionRequest {
    pub activity_kind: ActivityKind,
    pub activity_detail: ActivityDetail,
    pub note: Option<String>,
}

impl StartSessionRequest {
    pub fn new(activity_kind: ActivityKind, activity_detail: ActivityDetail) -> Self {
        Self {
            activity_kind,
            activity_detail,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Request to close the active session and open a new one.
#[derive(Debug, Clone)]
pub struct SwitchSessionRequest {
    pub activity_kind: ActivityKind,
    pub activity_detail: ActivityDetail,
    pub note: Option<String>,
    /// Backdated switch instant. `None` means now.
    pub at: Option<OffsetDateTime>,
}

impl SwitchSessionRequest {
    pub fn new(activity_kind: ActivityKind, activity_detail: ActivityDetail) -> Self {
        Self {
            activity_kind,
            activity_detail,
            note: None,
            at: None,
        }
    }

    pub fn at(mut self, at: OffsetDateTime) -> Self {
        self.at = Some(at);
        self
    }
}

/// Request to create an already closed entry (manual/backdated registration).
#[derive(Debug, Clone)]
pub struct CreateEntryRequest {
    /// Owner of the entry. `None` means the acting worker.
    pub worker_id: Option<WorkerId>,
    pub start_time: OffsetDateTime,
    pub end_time: OffsetDateTime,
    pub activity_kind: ActivityKind,
    pub activity_detail: ActivityDetail,
    pub note: Option<String>,
}

impl CreateEntryRequest {
    pub fn new(
        start_time: OffsetDateTime,
        end_time: OffsetDateTime,
        activity_kind: ActivityKind,
        activity_detail: ActivityDetail,
    ) -> Self {
        Self {
            worker_id: None,
            start_time,
            end_time,
            activity_kind,
            activity_detail,
            note: None,
        }
    }

    pub fn for_worker(mut self, worker_id: WorkerId) -> Self {
        self.worker_id = Some(worker_id);
        self
    }
}

/// The worker's open entry together with its live elapsed time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub entry: TimeEntry,
    /// Approximate: computed against the clock at read time.
    pub elapsed: Duration,
}

impl ActiveSession {
    /// Get elapsed time as (hours, minutes, seconds).
    pub fn elapsed_hms(&self) -> (i64, i64, i64) {
        let total_seconds = self.elapsed.whole_seconds().max(0);
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;
        (hours, minutes, seconds)
    }
}

/// A distinct activity the worker used recently, for quick restarts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentActivity {
    pub activity_kind: ActivityKind,
    pub activity_detail: ActivityDetail,
    pub note: Option<String>,
    pub last_started: OffsetDateTime,
}

use std::sync::Arc;

use time::{Duration, OffsetDateTime};

use crate::domain::{
    models::{TimeEntry, WorkerProfile},
    ports::outbound::Clock,
    TimeTrackingError,
};

/// Days a non-privileged worker may still change an entry.
///
/// Earlier call sites disagreed between 14 and 21 days; this is the single
/// value everything reads, overridable through `time_tracking.edit_window_days`.
pub const DEFAULT_EDIT_WINDOW_DAYS: i64 = 14;

/// Decides whether a historical entry may still be mutated.
#[derive(Clone)]
pub struct EditWindowPolicy {
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl EditWindowPolicy {
    pub fn new(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { window, clock }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether `acting` may mutate `entry` right now.
    pub fn can_edit(&self, entry: &TimeEntry, acting: &WorkerProfile) -> bool {
        self.allows_start(entry.start_time, acting)
    }

    /// Gate applied before any mutate/delete reaches the store.
    pub fn enforce(
        &self,
        entry: &TimeEntry,
        acting: &WorkerProfile,
    ) -> Result<(), TimeTrackingError> {
        self.enforce_start(entry.start_time, acting)
    }

    /// Gate for entries that do not exist yet (backdated manual registration).
    pub fn enforce_start(
        &self,
        start_time: OffsetDateTime,
        acting: &WorkerProfile,
    ) -> Result<(), TimeTrackingError> {
        if self.allows_start(start_time, acting) {
            Ok(())
        } else {
            tracing::debug!(
                worker_id = %acting.id,
                start_time = %start_time,
                window_days = self.window.whole_days(),
                "edit window expired"
            );
            Err(TimeTrackingError::EditWindowExpired)
        }
    }

    fn allows_start(&self, start_time: OffsetDateTime, acting: &WorkerProfile) -> bool {
        acting.is_privileged() || self.clock.now() - start_time <= self.window
    }
}

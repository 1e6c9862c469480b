use std::sync::Arc;

use time::{Duration, OffsetDateTime};

use crate::domain::{
    models::{
        Activity, ActivityDetail, ActivityKind, NewTimeEntry, Switched, TimeEntry, WorkerId,
        FAR_FUTURE,
    },
    ports::outbound::{Clock, StoreError, TimeEntryStore},
    TimeTrackingError,
};

use super::OverlapValidator;

/// Owns the start/switch/stop transitions of a worker's session.
///
/// States are "no session" and "active session"; the store's conditional
/// writes keep the one-open-entry invariant under concurrent calls.
pub struct SessionManager<S> {
    store: Arc<S>,
    validator: OverlapValidator<S>,
    clock: Arc<dyn Clock>,
    clock_skew_tolerance: Duration,
}

impl<S: TimeEntryStore> SessionManager<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, clock_skew_tolerance: Duration) -> Self {
        Self {
            validator: OverlapValidator::new(store.clone()),
            store,
            clock,
            clock_skew_tolerance,
        }
    }

    /// Open a new session at the current instant.
    pub async fn start(
        &self,
        worker_id: WorkerId,
        kind: ActivityKind,
        detail: ActivityDetail,
        note: Option<String>,
    ) -> Result<TimeEntry, TimeTrackingError> {
        let activity = Activity::new(kind, detail)?;
        let now = self.clock.now();

        // The open entry covers [now, +inf) until it is stopped.
        self.validator
            .ensure_clear(worker_id, now, FAR_FUTURE, None)
            .await?;

        let entry = NewTimeEntry::open(worker_id, now, activity).with_note(note);

        // The conditional insert is the existence check; no read-then-write.
        let started = self.store.create(&entry).await.map_err(|err| match err {
            StoreError::OpenEntryExists => TimeTrackingError::ActiveSessionExists,
            other => other.into(),
        })?;

        tracing::info!(
            worker_id = %worker_id,
            entry_id = %started.id,
            activity = %started.activity_kind,
            "session started"
        );
        Ok(started)
    }

    /// Close the active session and open a new one at the same instant.
    pub async fn switch(
        &self,
        worker_id: WorkerId,
        kind: ActivityKind,
        detail: ActivityDetail,
        note: Option<String>,
        at: Option<OffsetDateTime>,
    ) -> Result<Switched, TimeTrackingError> {
        let activity = Activity::new(kind, detail)?;
        let current = self.require_active(worker_id).await?;
        let at = self.close_instant(&current, at)?;

        // Covers both the closed half and the new open entry from `at` on.
        self.validator
            .ensure_clear(worker_id, current.start_time, FAR_FUTURE, Some(current.id))
            .await?;

        let next = NewTimeEntry::open(worker_id, at, activity).with_note(note);
        let (closed, opened) = match self
            .store
            .switch_open(worker_id, current.id, at, &next)
            .await
        {
            Ok(pair) => pair,
            Err(StoreError::PreconditionFailed) => return Err(TimeTrackingError::NoActiveSession),
            Err(err) => {
                return Err(self
                    .validator
                    .explain(err, worker_id, current.start_time, at, Some(current.id))
                    .await)
            }
        };

        tracing::info!(
            worker_id = %worker_id,
            closed_id = %closed.id,
            opened_id = %opened.id,
            activity = %opened.activity_kind,
            "session switched"
        );
        Ok(Switched { closed, opened })
    }

    /// Close the active session, now or at an explicit end time.
    pub async fn stop(
        &self,
        worker_id: WorkerId,
        at: Option<OffsetDateTime>,
    ) -> Result<TimeEntry, TimeTrackingError> {
        let current = self.require_active(worker_id).await?;
        let end = self.close_instant(&current, at)?;

        self.validator
            .ensure_clear(worker_id, current.start_time, end, Some(current.id))
            .await?;

        let stopped = match self.store.close_open(worker_id, current.id, end).await {
            Ok(entry) => entry,
            Err(StoreError::PreconditionFailed) => return Err(TimeTrackingError::NoActiveSession),
            Err(err) => {
                return Err(self
                    .validator
                    .explain(err, worker_id, current.start_time, end, Some(current.id))
                    .await)
            }
        };

        tracing::info!(
            worker_id = %worker_id,
            entry_id = %stopped.id,
            minutes = (end - stopped.start_time).whole_minutes(),
            "session stopped"
        );
        Ok(stopped)
    }

    /// The worker's open entry. Read-only.
    pub async fn get_active(
        &self,
        worker_id: WorkerId,
    ) -> Result<Option<TimeEntry>, TimeTrackingError> {
        Ok(self.store.open_entry(worker_id).await?)
    }

    /// Live elapsed time of an open entry; closed entries report their length.
    pub fn elapsed(&self, entry: &TimeEntry) -> Duration {
        let end = entry.end_time.unwrap_or_else(|| self.clock.now());
        (end - entry.start_time).max(Duration::ZERO)
    }

    async fn require_active(&self, worker_id: WorkerId) -> Result<TimeEntry, TimeTrackingError> {
        self.store
            .open_entry(worker_id)
            .await?
            .ok_or(TimeTrackingError::NoActiveSession)
    }

    /// The instant `current` gets closed at, validated against its start and the clock.
    fn close_instant(
        &self,
        current: &TimeEntry,
        at: Option<OffsetDateTime>,
    ) -> Result<OffsetDateTime, TimeTrackingError> {
        let now = self.clock.now();
        let end = at.unwrap_or(now);

        if end <= current.start_time {
            return Err(TimeTrackingError::invalid_interval(if at.is_some() {
                "end time must be after the session start"
            } else {
                "clock is at or before the session start; supply an explicit end time"
            }));
        }
        if end > now + self.clock_skew_tolerance {
            return Err(TimeTrackingError::invalid_interval("end time is in the future"));
        }

        Ok(end)
    }
}

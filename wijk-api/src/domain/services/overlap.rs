use std::sync::Arc;

use time::OffsetDateTime;

use crate::domain::{
    models::{TimeEntry, TimeEntryId, TimeRange, WorkerId},
    ports::outbound::{StoreError, TimeEntryStore},
    TimeTrackingError,
};

/// Outcome of checking a candidate interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlapCheck {
    Clear,
    /// Every closed entry the candidate intersects, ordered by start time.
    Conflict(Vec<TimeEntry>),
}

/// Closed entries intersecting `[start, end)`, skipping `exclude`.
///
/// Touching boundaries are not conflicts.
pub fn find_conflicts<'a>(
    entries: impl IntoIterator<Item = &'a TimeEntry>,
    start: OffsetDateTime,
    end: OffsetDateTime,
    exclude: Option<TimeEntryId>,
) -> Vec<TimeEntry> {
    let mut conflicts: Vec<TimeEntry> = entries
        .into_iter()
        .filter(|entry| Some(entry.id) != exclude)
        .filter(|entry| entry.intersects(start, end))
        .cloned()
        .collect();
    conflicts.sort_by_key(|entry| (entry.start_time, entry.id));
    conflicts
}

/// Checks candidate intervals against a worker's closed entries.
pub struct OverlapValidator<S> {
    store: Arc<S>,
}

impl<S> Clone for OverlapValidator<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: TimeEntryStore> OverlapValidator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Check `[start, end)` against the worker's closed entries.
    ///
    /// `exclude` supports editing an entry in place. Callers reject
    /// degenerate candidates (start >= end) before getting here.
    pub async fn validate(
        &self,
        worker_id: WorkerId,
        start: OffsetDateTime,
        end: OffsetDateTime,
        exclude: Option<TimeEntryId>,
    ) -> Result<OverlapCheck, StoreError> {
        let candidates = self
            .store
            .query(worker_id, Some(TimeRange { start, end }))
            .await?;

        let conflicts = find_conflicts(&candidates, start, end, exclude);
        if conflicts.is_empty() {
            Ok(OverlapCheck::Clear)
        } else {
            tracing::debug!(
                worker_id = %worker_id,
                conflicts = conflicts.len(),
                "candidate interval overlaps existing entries"
            );
            Ok(OverlapCheck::Conflict(conflicts))
        }
    }

    /// Like [`Self::validate`], but as a gate.
    pub async fn ensure_clear(
        &self,
        worker_id: WorkerId,
        start: OffsetDateTime,
        end: OffsetDateTime,
        exclude: Option<TimeEntryId>,
    ) -> Result<(), TimeTrackingError> {
        match self.validate(worker_id, start, end, exclude).await? {
            OverlapCheck::Clear => Ok(()),
            OverlapCheck::Conflict(conflicts) => Err(TimeTrackingError::OverlapConflict(conflicts)),
        }
    }

    /// Turn a store-level overlap rejection into a conflict naming the entries.
    ///
    /// Used when the store's own constraint caught an overlap that appeared
    /// between validation and write.
    pub async fn explain(
        &self,
        err: StoreError,
        worker_id: WorkerId,
        start: OffsetDateTime,
        end: OffsetDateTime,
        exclude: Option<TimeEntryId>,
    ) -> TimeTrackingError {
        if err != StoreError::Overlap {
            return err.into();
        }

        match self.validate(worker_id, start, end, exclude).await {
            Ok(OverlapCheck::Conflict(conflicts)) => TimeTrackingError::OverlapConflict(conflicts),
            Ok(OverlapCheck::Clear) => TimeTrackingError::OverlapConflict(Vec::new()),
            Err(read_err) => read_err.into(),
        }
    }
}

//! In-memory adapters for tests.
//!
//! The store enforces the same constraints as the PostgreSQL schema so the
//! domain can be exercised without a database.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Mutex,
};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::domain::{
    models::{
        NewTimeEntry, TimeEntry, TimeEntryId, TimeEntryPatch, TimeRange, WorkerId, WorkerProfile,
    },
    ports::outbound::{StoreError, TimeEntryStore, UserDirectory},
    TimeTrackingError,
};

#[derive(Default)]
struct Inner {
    entries: BTreeMap<TimeEntryId, TimeEntry>,
    next_id: i64,
    failing_calls: usize,
    busy_calls: usize,
    fail_open_insert: bool,
}

impl Inner {
    fn take_failure(&mut self) -> Result<(), StoreError> {
        if self.failing_calls > 0 {
            self.failing_calls -= 1;
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        if self.busy_calls > 0 {
            self.busy_calls -= 1;
            return Err(StoreError::Busy("injected serialization failure".to_string()));
        }
        Ok(())
    }

    fn allocate(&mut self, new: &NewTimeEntry) -> TimeEntry {
        self.next_id += 1;
        TimeEntry {
            id: TimeEntryId::new(self.next_id),
            worker_id: new.worker_id,
            start_time: new.start_time,
            end_time: new.end_time,
            activity_kind: new.activity_kind,
            activity_detail: new.activity_detail.clone(),
            note: new.note.clone(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Mirrors the table constraints: end after start, one open entry per
/// worker, no intersecting closed entries per worker.
fn check_constraints(
    entries: &BTreeMap<TimeEntryId, TimeEntry>,
    candidate: &TimeEntry,
) -> Result<(), StoreError> {
    let siblings = entries
        .values()
        .filter(|e| e.worker_id == candidate.worker_id && e.id != candidate.id);

    match candidate.end_time {
        Some(end) if end <= candidate.start_time => Err(StoreError::InvalidInterval),
        Some(end) => {
            if siblings
                .into_iter()
                .any(|e| e.intersects(candidate.start_time, end))
            {
                Err(StoreError::Overlap)
            } else {
                Ok(())
            }
        }
        None => {
            if siblings.into_iter().any(TimeEntry::is_open) {
                Err(StoreError::OpenEntryExists)
            } else {
                Ok(())
            }
        }
    }
}

#[derive(Default)]
pub struct InMemoryTimeEntryStore {
    inner: Mutex<Inner>,
}

impl InMemoryTimeEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` calls fail with `Unavailable`.
    pub fn fail_next(&self, n: usize) {
        self.inner.lock().unwrap().failing_calls = n;
    }

    /// Make the next `n` calls fail with `Busy`.
    pub fn busy_next(&self, n: usize) {
        self.inner.lock().unwrap().busy_calls = n;
    }

    /// Make the insert half of the next switch fail after the close was staged.
    pub fn fail_next_open_insert(&self) {
        self.inner.lock().unwrap().fail_open_insert = true;
    }

    fn sorted(mut entries: Vec<TimeEntry>) -> Vec<TimeEntry> {
        entries.sort_by_key(|e| (e.start_time, e.id));
        entries
    }
}

#[async_trait]
impl TimeEntryStore for InMemoryTimeEntryStore {
    async fn create(&self, entry: &NewTimeEntry) -> Result<TimeEntry, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;

        let created = inner.allocate(entry);
        check_constraints(&inner.entries, &created)?;
        inner.entries.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        id: TimeEntryId,
        patch: &TimeEntryPatch,
    ) -> Result<TimeEntry, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;

        let current = inner.entries.get(&id).ok_or(StoreError::NotFound(id))?;
        let updated = patch.apply(current);
        check_constraints(&inner.entries, &updated)?;
        inner.entries.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: TimeEntryId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;

        inner
            .entries
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn get(&self, id: TimeEntryId) -> Result<Option<TimeEntry>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;
        Ok(inner.entries.get(&id).cloned())
    }

    async fn query(
        &self,
        worker_id: WorkerId,
        range: Option<TimeRange>,
    ) -> Result<Vec<TimeEntry>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;

        let entries = inner
            .entries
            .values()
            .filter(|e| e.worker_id == worker_id)
            .filter(|e| range.map_or(true, |r| r.intersects(e)))
            .cloned()
            .collect();
        Ok(Self::sorted(entries))
    }

    async fn query_all(&self, range: Option<TimeRange>) -> Result<Vec<TimeEntry>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;

        let entries = inner
            .entries
            .values()
            .filter(|e| range.map_or(true, |r| r.intersects(e)))
            .cloned()
            .collect();
        Ok(Self::sorted(entries))
    }

    async fn open_entry(&self, worker_id: WorkerId) -> Result<Option<TimeEntry>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;

        Ok(inner
            .entries
            .values()
            .find(|e| e.worker_id == worker_id && e.is_open())
            .cloned())
    }

    async fn close_open(
        &self,
        worker_id: WorkerId,
        expected: TimeEntryId,
        end_time: OffsetDateTime,
    ) -> Result<TimeEntry, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;

        let current = inner
            .entries
            .get(&expected)
            .filter(|e| e.worker_id == worker_id && e.is_open())
            .ok_or(StoreError::PreconditionFailed)?;
        let closed = TimeEntry {
            end_time: Some(end_time),
            ..current.clone()
        };
        check_constraints(&inner.entries, &closed)?;
        inner.entries.insert(expected, closed.clone());
        Ok(closed)
    }

    async fn switch_open(
        &self,
        worker_id: WorkerId,
        expected: TimeEntryId,
        at: OffsetDateTime,
        next: &NewTimeEntry,
    ) -> Result<(TimeEntry, TimeEntry), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.take_failure()?;

        let current = inner
            .entries
            .get(&expected)
            .filter(|e| e.worker_id == worker_id && e.is_open())
            .ok_or(StoreError::PreconditionFailed)?;
        let closed = TimeEntry {
            end_time: Some(at),
            ..current.clone()
        };

        // Stage both writes on a copy; commit only if both pass.
        let mut staged = inner.entries.clone();
        check_constraints(&staged, &closed)?;
        staged.insert(expected, closed.clone());

        if std::mem::take(&mut inner.fail_open_insert) {
            return Err(StoreError::Unavailable(
                "injected failure opening the next entry".to_string(),
            ));
        }
        let opened = inner.allocate(next);
        check_constraints(&staged, &opened)?;
        staged.insert(opened.id, opened.clone());

        inner.entries = staged;
        Ok((closed, opened))
    }
}

/// A fixed set of workers.
pub struct StaticDirectory {
    profiles: HashMap<WorkerId, WorkerProfile>,
}

impl StaticDirectory {
    pub fn new(profiles: impl IntoIterator<Item = WorkerProfile>) -> Self {
        Self {
            profiles: profiles.into_iter().map(|p| (p.id, p)).collect(),
        }
    }
}

#[async_trait]
impl UserDirectory for StaticDirectory {
    async fn resolve(&self, worker_id: WorkerId) -> Result<WorkerProfile, TimeTrackingError> {
        self.profiles
            .get(&worker_id)
            .cloned()
            .ok_or_else(|| TimeTrackingError::NotFound(format!("worker {worker_id}")))
    }
}

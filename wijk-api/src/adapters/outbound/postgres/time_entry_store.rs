//! PostgreSQL implementation of the TimeEntryStore port.
//!
//! The one-open-entry and no-overlap invariants are enforced by the schema
//! (partial unique index and exclusion constraint); this adapter only maps
//! rows and constraint violations.

use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::store_error;
use crate::domain::{
    models::{
        ActivityDetail, ActivityKind, NewTimeEntry, TimeEntry, TimeEntryId, TimeEntryPatch,
        TimeRange, WorkerId,
    },
    ports::outbound::{StoreError, TimeEntryStore},
};
use crate::repositories::{
    DatabaseTimeEntry, NewDatabaseTimeEntry, RepositoryError, TimeEntryRepository,
    TimeEntryRepositoryImpl, UpdateDatabaseTimeEntry,
};

/// Adapter that implements TimeEntryStore using PostgreSQL.
pub struct PostgresTimeEntryStore<R = TimeEntryRepositoryImpl> {
    repo: Arc<R>,
}

impl<R> PostgresTimeEntryStore<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl<R: TimeEntryRepository + Send + Sync + 'static> TimeEntryStore for PostgresTimeEntryStore<R> {
    async fn create(&self, entry: &NewTimeEntry) -> Result<TimeEntry, StoreError> {
        let row = self
            .repo
            .create_entry(&to_db_new_entry(entry)?)
            .await
            .map_err(store_error)?;
        db_entry_to_domain(row)
    }

    async fn update(
        &self,
        id: TimeEntryId,
        patch: &TimeEntryPatch,
    ) -> Result<TimeEntry, StoreError> {
        let update = UpdateDatabaseTimeEntry {
            start_time: patch.start_time,
            end_time: patch.end_time,
            activity_kind: patch.activity_kind.map(|kind| kind.to_string()),
            activity_detail: patch.activity_detail.as_ref().map(detail_to_json).transpose()?,
            note: patch.note.clone(),
        };

        let row = self
            .repo
            .update_entry(id.as_i64(), &update)
            .await
            .map_err(|err| not_found_or(err, id))?;
        db_entry_to_domain(row)
    }

    async fn delete(&self, id: TimeEntryId) -> Result<(), StoreError> {
        self.repo
            .delete_entry(id.as_i64())
            .await
            .map_err(|err| not_found_or(err, id))
    }

    async fn get(&self, id: TimeEntryId) -> Result<Option<TimeEntry>, StoreError> {
        self.repo
            .get_entry(id.as_i64())
            .await
            .map_err(store_error)?
            .map(db_entry_to_domain)
            .transpose()
    }

    async fn query(
        &self,
        worker_id: WorkerId,
        range: Option<TimeRange>,
    ) -> Result<Vec<TimeEntry>, StoreError> {
        let rows = self
            .repo
            .entries_for_worker(worker_id.as_i32(), range.map(|r| (r.start, r.end)))
            .await
            .map_err(store_error)?;

        rows.into_iter().map(db_entry_to_domain).collect()
    }

    async fn query_all(&self, range: Option<TimeRange>) -> Result<Vec<TimeEntry>, StoreError> {
        let rows = self
            .repo
            .all_entries(range.map(|r| (r.start, r.end)))
            .await
            .map_err(store_error)?;

        rows.into_iter().map(db_entry_to_domain).collect()
    }

    async fn open_entry(&self, worker_id: WorkerId) -> Result<Option<TimeEntry>, StoreError> {
        self.repo
            .open_entry(worker_id.as_i32())
            .await
            .map_err(store_error)?
            .map(db_entry_to_domain)
            .transpose()
    }

    async fn close_open(
        &self,
        worker_id: WorkerId,
        expected: TimeEntryId,
        end_time: OffsetDateTime,
    ) -> Result<TimeEntry, StoreError> {
        let row = self
            .repo
            .close_open_entry(worker_id.as_i32(), expected.as_i64(), end_time)
            .await
            .map_err(store_error)?
            .ok_or(StoreError::PreconditionFailed)?;
        db_entry_to_domain(row)
    }

    async fn switch_open(
        &self,
        worker_id: WorkerId,
        expected: TimeEntryId,
        at: OffsetDateTime,
        next: &NewTimeEntry,
    ) -> Result<(TimeEntry, TimeEntry), StoreError> {
        let (closed, opened) = self
            .repo
            .switch_open_entry(
                worker_id.as_i32(),
                expected.as_i64(),
                at,
                &to_db_new_entry(next)?,
            )
            .await
            .map_err(store_error)?
            .ok_or(StoreError::PreconditionFailed)?;

        Ok((db_entry_to_domain(closed)?, db_entry_to_domain(opened)?))
    }
}

fn not_found_or(err: RepositoryError, id: TimeEntryId) -> StoreError {
    match err {
        RepositoryError::NotFound(_) => StoreError::NotFound(id),
        other => store_error(other),
    }
}

fn detail_to_json(detail: &ActivityDetail) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(detail)
        .map_err(|e| StoreError::Backend(format!("failed to encode activity detail: {e}")))
}

fn to_db_new_entry(entry: &NewTimeEntry) -> Result<NewDatabaseTimeEntry, StoreError> {
    Ok(NewDatabaseTimeEntry {
        worker_id: entry.worker_id.as_i32(),
        start_time: entry.start_time,
        end_time: entry.end_time,
        activity_kind: entry.activity_kind.to_string(),
        activity_detail: detail_to_json(&entry.activity_detail)?,
        note: entry.note.clone(),
    })
}

/// Rows that do not decode are reported, never silently dropped.
fn db_entry_to_domain(row: DatabaseTimeEntry) -> Result<TimeEntry, StoreError> {
    let activity_kind: ActivityKind = row.activity_kind.parse().map_err(|_| {
        StoreError::Backend(format!(
            "time entry {} has unknown activity kind '{}'",
            row.id, row.activity_kind
        ))
    })?;
    let activity_detail: ActivityDetail = serde_json::from_value(row.activity_detail)
        .map_err(|e| StoreError::Backend(format!("time entry {} has bad detail: {e}", row.id)))?;

    Ok(TimeEntry {
        id: TimeEntryId::new(row.id),
        worker_id: WorkerId::new(row.worker_id),
        start_time: row.start_time,
        end_time: row.end_time,
        activity_kind,
        activity_detail,
        note: row.note,
        created_at: row.created_at,
    })
}

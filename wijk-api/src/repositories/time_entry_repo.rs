use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use super::repo_error::RepositoryError;

const ENTRY_COLUMNS: &str = "id, worker_id, start_time, end_time, activity_kind, activity_detail, note, created_at";

#[async_trait]
pub trait TimeEntryRepository {
    async fn create_entry(
        &self,
        entry: &NewDatabaseTimeEntry,
    ) -> Result<DatabaseTimeEntry, RepositoryError>;
    async fn update_entry(
        &self,
        id: i64,
        update: &UpdateDatabaseTimeEntry,
    ) -> Result<DatabaseTimeEntry, RepositoryError>;
    async fn delete_entry(&self, id: i64) -> Result<(), RepositoryError>;
    async fn get_entry(&self, id: i64) -> Result<Option<DatabaseTimeEntry>, RepositoryError>;
    async fn entries_for_worker(
        &self,
        worker_id: i32,
        range: Option<(OffsetDateTime, OffsetDateTime)>,
    ) -> Result<Vec<DatabaseTimeEntry>, RepositoryError>;
    async fn all_entries(
        &self,
        range: Option<(OffsetDateTime, OffsetDateTime)>,
    ) -> Result<Vec<DatabaseTimeEntry>, RepositoryError>;
    async fn open_entry(
        &self,
        worker_id: i32,
    ) -> Result<Option<DatabaseTimeEntry>, RepositoryError>;
    /// Close `id` if it is still the worker's open entry. `None` if it is not.
    async fn close_open_entry(
        &self,
        worker_id: i32,
        id: i64,
        end_time: OffsetDateTime,
    ) -> Result<Option<DatabaseTimeEntry>, RepositoryError>;
    /// Close `id` and insert `next` in one transaction. `None` if `id` was no longer open.
    async fn switch_open_entry(
        &self,
        worker_id: i32,
        id: i64,
        at: OffsetDateTime,
        next: &NewDatabaseTimeEntry,
    ) -> Result<Option<(DatabaseTimeEntry, DatabaseTimeEntry)>, RepositoryError>;
}

pub struct TimeEntryRepositoryImpl {
    pool: PgPool,
}

impl TimeEntryRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DatabaseTimeEntry {
    pub id: i64,
    pub worker_id: i32,
    pub start_time: OffsetDateTime,
    pub end_time: Option<OffsetDateTime>,
    pub activity_kind: String,
    pub activity_detail: serde_json::Value,
    pub note: Option<String>,
    pub created_at: OffsetDateTime,
}

pub struct NewDatabaseTimeEntry {
    pub worker_id: i32,
    pub start_time: OffsetDateTime,
    pub end_time: Option<OffsetDateTime>,
    pub activity_kind: String,
    pub activity_detail: serde_json::Value,
    pub note: Option<String>,
}

/// Columns left `None` keep their value. An empty `note` clears it.
#[derive(Default)]
pub struct UpdateDatabaseTimeEntry {
    pub start_time: Option<OffsetDateTime>,
    pub end_time: Option<OffsetDateTime>,
    pub activity_kind: Option<String>,
    pub activity_detail: Option<serde_json::Value>,
    pub note: Option<String>,
}

fn insert_sql() -> String {
    format!(
        r#"
        INSERT INTO time_entries (worker_id, start_time, end_time, activity_kind, activity_detail, note)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {ENTRY_COLUMNS}
        "#
    )
}

fn close_sql() -> String {
    format!(
        r#"
        UPDATE time_entries
        SET end_time = $3, updated_at = NOW()
        WHERE worker_id = $1 AND id = $2 AND end_time IS NULL
        RETURNING {ENTRY_COLUMNS}
        "#
    )
}

#[async_trait]
impl TimeEntryRepository for TimeEntryRepositoryImpl {
    async fn create_entry(
        &self,
        entry: &NewDatabaseTimeEntry,
    ) -> Result<DatabaseTimeEntry, RepositoryError> {
        let created = sqlx::query_as::<_, DatabaseTimeEntry>(&insert_sql())
            .bind(entry.worker_id)
            .bind(entry.start_time)
            .bind(entry.end_time)
            .bind(&entry.activity_kind)
            .bind(&entry.activity_detail)
            .bind(&entry.note)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn update_entry(
        &self,
        id: i64,
        update: &UpdateDatabaseTimeEntry,
    ) -> Result<DatabaseTimeEntry, RepositoryError> {
        let sql = format!(
            r#"
            UPDATE time_entries
            SET start_time = COALESCE($2, start_time),
                end_time = COALESCE($3, end_time),
                activity_kind = COALESCE($4, activity_kind),
                activity_detail = COALESCE($5, activity_detail),
                note = CASE WHEN $6::TEXT IS NULL THEN note ELSE NULLIF(BTRIM($6), '') END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ENTRY_COLUMNS}
            "#
        );

        sqlx::query_as::<_, DatabaseTimeEntry>(&sql)
            .bind(id)
            .bind(update.start_time)
            .bind(update.end_time)
            .bind(&update.activity_kind)
            .bind(&update.activity_detail)
            .bind(&update.note)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("time entry {id}")))
    }

    async fn delete_entry(&self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM time_entries
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("time entry {id}")));
        }
        Ok(())
    }

    async fn get_entry(&self, id: i64) -> Result<Option<DatabaseTimeEntry>, RepositoryError> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM time_entries WHERE id = $1");
        let entry = sqlx::query_as::<_, DatabaseTimeEntry>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    async fn entries_for_worker(
        &self,
        worker_id: i32,
        range: Option<(OffsetDateTime, OffsetDateTime)>,
    ) -> Result<Vec<DatabaseTimeEntry>, RepositoryError> {
        // Open entries extend indefinitely, so they match any range that starts before now.
        let sql = format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM time_entries
            WHERE worker_id = $1
              AND ($2::TIMESTAMPTZ IS NULL OR end_time IS NULL OR end_time > $2)
              AND ($3::TIMESTAMPTZ IS NULL OR start_time < $3)
            ORDER BY start_time, id
            "#
        );

        let entries = sqlx::query_as::<_, DatabaseTimeEntry>(&sql)
            .bind(worker_id)
            .bind(range.map(|(start, _)| start))
            .bind(range.map(|(_, end)| end))
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    async fn all_entries(
        &self,
        range: Option<(OffsetDateTime, OffsetDateTime)>,
    ) -> Result<Vec<DatabaseTimeEntry>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM time_entries
            WHERE ($1::TIMESTAMPTZ IS NULL OR end_time IS NULL OR end_time > $1)
              AND ($2::TIMESTAMPTZ IS NULL OR start_time < $2)
            ORDER BY start_time, id
            "#
        );

        let entries = sqlx::query_as::<_, DatabaseTimeEntry>(&sql)
            .bind(range.map(|(start, _)| start))
            .bind(range.map(|(_, end)| end))
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    async fn open_entry(
        &self,
        worker_id: i32,
    ) -> Result<Option<DatabaseTimeEntry>, RepositoryError> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM time_entries WHERE worker_id = $1 AND end_time IS NULL"
        );
        let entry = sqlx::query_as::<_, DatabaseTimeEntry>(&sql)
            .bind(worker_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    async fn close_open_entry(
        &self,
        worker_id: i32,
        id: i64,
        end_time: OffsetDateTime,
    ) -> Result<Option<DatabaseTimeEntry>, RepositoryError> {
        let closed = sqlx::query_as::<_, DatabaseTimeEntry>(&close_sql())
            .bind(worker_id)
            .bind(id)
            .bind(end_time)
            .fetch_optional(&self.pool)
            .await?;

        Ok(closed)
    }

    async fn switch_open_entry(
        &self,
        worker_id: i32,
        id: i64,
        at: OffsetDateTime,
        next: &NewDatabaseTimeEntry,
    ) -> Result<Option<(DatabaseTimeEntry, DatabaseTimeEntry)>, RepositoryError> {
        // Dropping the transaction on an early return rolls it back.
        let mut tx = self.pool.begin().await?;

        let Some(closed) = sqlx::query_as::<_, DatabaseTimeEntry>(&close_sql())
            .bind(worker_id)
            .bind(id)
            .bind(at)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            return Ok(None);
        };

        let opened = sqlx::query_as::<_, DatabaseTimeEntry>(&insert_sql())
            .bind(next.worker_id)
            .bind(next.start_time)
            .bind(next.end_time)
            .bind(&next.activity_kind)
            .bind(&next.activity_detail)
            .bind(&next.note)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some((closed, opened)))
    }
}

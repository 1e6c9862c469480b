use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_error::RepositoryError;

#[async_trait]
pub trait WorkerRepository {
    async fn get_worker(&self, id: i32) -> Result<Option<DatabaseWorker>, RepositoryError>;
}

pub struct WorkerRepositoryImpl {
    pool: PgPool,
}

impl WorkerRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DatabaseWorker {
    pub id: i32,
    pub display_name: String,
    pub role: String,
}

#[async_trait]
impl WorkerRepository for WorkerRepositoryImpl {
    async fn get_worker(&self, id: i32) -> Result<Option<DatabaseWorker>, RepositoryError> {
        let worker = sqlx::query_as::<_, DatabaseWorker>(
            r#"
            SELECT id, display_name, role
            FROM workers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(worker)
    }
}

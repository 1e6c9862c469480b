//! PostgreSQL adapters for the outbound ports.

mod time_entry_store;
mod user_directory;

pub use time_entry_store::PostgresTimeEntryStore;
pub use user_directory::PostgresUserDirectory;

use crate::{domain::ports::outbound::StoreError, repositories::RepositoryError};

const UNIQUE_VIOLATION: &str = "23505";
const EXCLUSION_VIOLATION: &str = "23P01";
const CHECK_VIOLATION: &str = "23514";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Map a repository failure onto the store port's error vocabulary.
///
/// Constraint violations become their domain meaning. Failures that prove
/// the statement never committed become `Busy`, other connectivity problems
/// become `Unavailable`.
fn store_error(err: RepositoryError) -> StoreError {
    let err = match err {
        RepositoryError::DatabaseError(err) => err,
        RepositoryError::NotFound(what) => return StoreError::Backend(format!("{what} not found")),
    };

    match err {
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => StoreError::OpenEntryExists,
            Some(EXCLUSION_VIOLATION) => StoreError::Overlap,
            Some(CHECK_VIOLATION) => StoreError::InvalidInterval,
            Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                StoreError::Busy(db.to_string())
            }
            _ => {
                tracing::error!("Database error: {:?}", db);
                StoreError::Backend(db.to_string())
            }
        },
        sqlx::Error::PoolTimedOut => {
            tracing::warn!("Database pool exhausted");
            StoreError::Busy(sqlx::Error::PoolTimedOut.to_string())
        }
        err @ (sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_)) => {
            tracing::warn!("Database unavailable: {}", err);
            StoreError::Unavailable(err.to_string())
        }
        err => {
            tracing::error!("Database error: {:?}", err);
            StoreError::Backend(err.to_string())
        }
    }
}

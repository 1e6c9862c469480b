mod repo_error;
mod time_entry_repo;
mod worker_repo;

pub use repo_error::RepositoryError;
pub use time_entry_repo::*;
pub use worker_repo::*;

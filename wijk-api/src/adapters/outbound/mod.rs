mod cached_directory;
#[cfg(test)]
pub mod memory;
pub mod postgres;
mod resilient;

pub use cached_directory::CachedUserDirectory;
pub use resilient::{ResilientStore, RetryPolicy};

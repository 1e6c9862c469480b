use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated worker identifier.
///
/// Wraps i32 to match the database SERIAL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(i32);

impl WorkerId {
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for WorkerId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl From<WorkerId> for i32 {
    fn from(id: WorkerId) -> Self {
        id.0
    }
}

/// A time entry identifier (database BIGSERIAL).
///
/// Stable for the lifetime of the entry and compared by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeEntryId(i64);

impl TimeEntryId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Extract the raw i64 value (consistent with `WorkerId::as_i32()`).
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for TimeEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TimeEntryId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A project reference from the project registry.
///
/// Projects live outside the tracking engine; only the identifier is kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::Duration;

use super::{TimeRange, WorkerId};

/// Dimension a set of entries can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum GroupDimension {
    ActivityKind,
    Worker,
    Neighborhood,
    Project,
    Day,
    Week,
    Month,
}

/// Totals over an entry set, with the records that did not count reported separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub total: Duration,
    pub closed: usize,
    pub open: usize,
    pub malformed: usize,
}

impl Default for Summary {
    fn default() -> Self {
        Self {
            total: Duration::ZERO,
            closed: 0,
            open: 0,
            malformed: 0,
        }
    }
}

/// Whose entries a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportScope {
    /// The acting worker's own entries.
    Own,
    Worker(WorkerId),
    /// Every worker. Admins only.
    AllWorkers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub scope: ReportScope,
    pub range: Option<TimeRange>,
    pub group_by: GroupDimension,
}

impl ReportQuery {
    pub fn new(group_by: GroupDimension) -> Self {
        Self {
            scope: ReportScope::Own,
            range: None,
            group_by,
        }
    }

    pub fn with_scope(mut self, scope: ReportScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_range(mut self, range: TimeRange) -> Self {
        self.range = Some(range);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportBucket {
    pub key: String,
    pub duration: Duration,
}

/// Grouped durations for a dashboard or export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub group_by: GroupDimension,
    pub range: Option<TimeRange>,
    pub buckets: Vec<ReportBucket>,
    pub summary: Summary,
}

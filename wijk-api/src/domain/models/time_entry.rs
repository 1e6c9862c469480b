use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::{macros::datetime, Duration, OffsetDateTime};

use super::{ProjectId, TimeEntryId, WorkerId};
use crate::domain::TimeTrackingError;

/// Upper bound used for ranges that stay open towards the future.
pub const FAR_FUTURE: OffsetDateTime = datetime!(9999-12-31 0:00 UTC);

/// What a worker is spending time on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString,
)]
#[serde(rename_all = "PascalCase")]
#[strum(ascii_case_insensitive)]
pub enum ActivityKind {
    Project,
    NeighborhoodRound,
    InternalMeeting,
    ExternalMeeting,
    PersonalDevelopment,
    Other,
}

impl ActivityKind {
    /// Whether `detail` is the payload this kind carries.
    pub fn accepts(&self, detail: &ActivityDetail) -> bool {
        matches!(
            (self, detail),
            (ActivityKind::Project, ActivityDetail::Project { .. })
                | (ActivityKind::NeighborhoodRound, ActivityDetail::Neighborhood { .. })
                | (ActivityKind::InternalMeeting, ActivityDetail::Meeting { .. })
                | (ActivityKind::ExternalMeeting, ActivityDetail::Meeting { .. })
                | (ActivityKind::PersonalDevelopment, ActivityDetail::Description { .. })
                | (ActivityKind::Other, ActivityDetail::Description { .. })
        )
    }
}

/// Kind-specific payload of an activity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActivityDetail {
    #[serde(rename_all = "camelCase")]
    Project {
        project_id: ProjectId,
        project_name: String,
    },
    Neighborhood {
        name: String,
    },
    Meeting {
        counterpart: String,
    },
    Description {
        text: String,
    },
}

/// A kind together with a payload that matches it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Activity {
    kind: ActivityKind,
    detail: ActivityDetail,
}

impl Activity {
    pub fn new(kind: ActivityKind, detail: ActivityDetail) -> Result<Self, TimeTrackingError> {
        if !kind.accepts(&detail) {
            return Err(TimeTrackingError::InvalidActivity(format!(
                "{kind} does not accept a {} detail",
                detail.type_name()
            )));
        }

        let blank = match &detail {
            ActivityDetail::Project { project_id, .. } => project_id.as_str().trim().is_empty(),
            ActivityDetail::Neighborhood { name } => name.trim().is_empty(),
            ActivityDetail::Meeting { counterpart } => counterpart.trim().is_empty(),
            // Free text may legitimately be empty.
            ActivityDetail::Description { .. } => false,
        };
        if blank {
            return Err(TimeTrackingError::InvalidActivity(format!(
                "{kind} requires a non-empty {}",
                detail.type_name()
            )));
        }

        Ok(Self { kind, detail })
    }

    pub fn into_parts(self) -> (ActivityKind, ActivityDetail) {
        (self.kind, self.detail)
    }
}

impl ActivityDetail {
    fn type_name(&self) -> &'static str {
        match self {
            ActivityDetail::Project { .. } => "project",
            ActivityDetail::Neighborhood { .. } => "neighborhood",
            ActivityDetail::Meeting { .. } => "meeting",
            ActivityDetail::Description { .. } => "description",
        }
    }
}

/// A recorded interval of work.
///
/// `end_time == None` means the entry is the worker's active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntry {
    pub id: TimeEntryId,
    pub worker_id: WorkerId,
    pub start_time: OffsetDateTime,
    pub end_time: Option<OffsetDateTime>,
    pub activity_kind: ActivityKind,
    pub activity_detail: ActivityDetail,
    pub note: Option<String>,
    pub created_at: OffsetDateTime,
}

impl TimeEntry {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Duration of a closed, well-formed entry.
    ///
    /// Returns `None` for open entries and for malformed ones (end <= start).
    pub fn duration(&self) -> Option<Duration> {
        let end = self.end_time?;
        let duration = end - self.start_time;
        duration.is_positive().then_some(duration)
    }

    /// Half-open intersection test against `[start, end)`.
    ///
    /// Open entries never intersect here; they are handled by the session paths.
    pub fn intersects(&self, start: OffsetDateTime, end: OffsetDateTime) -> bool {
        match self.end_time {
            Some(existing_end) => start < existing_end && end > self.start_time,
            None => false,
        }
    }

    pub fn neighborhood(&self) -> Option<&str> {
        match &self.activity_detail {
            ActivityDetail::Neighborhood { name } => Some(name),
            _ => None,
        }
    }

    pub fn project(&self) -> Option<&ProjectId> {
        match &self.activity_detail {
            ActivityDetail::Project { project_id, .. } => Some(project_id),
            _ => None,
        }
    }
}

/// Data for persisting a new entry, open or already closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimeEntry {
    pub worker_id: WorkerId,
    pub start_time: OffsetDateTime,
    pub end_time: Option<OffsetDateTime>,
    pub activity_kind: ActivityKind,
    pub activity_detail: ActivityDetail,
    pub note: Option<String>,
}

impl NewTimeEntry {
    pub fn open(worker_id: WorkerId, start_time: OffsetDateTime, activity: Activity) -> Self {
        let (activity_kind, activity_detail) = activity.into_parts();
        Self {
            worker_id,
            start_time,
            end_time: None,
            activity_kind,
            activity_detail,
            note: None,
        }
    }

    pub fn closed(
        worker_id: WorkerId,
        start_time: OffsetDateTime,
        end_time: OffsetDateTime,
        activity: Activity,
    ) -> Self {
        Self {
            end_time: Some(end_time),
            ..Self::open(worker_id, start_time, activity)
        }
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note.filter(|n| !n.trim().is_empty());
        self
    }
}

/// Partial update of an existing entry. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeEntryPatch {
    pub start_time: Option<OffsetDateTime>,
    pub end_time: Option<OffsetDateTime>,
    pub activity_kind: Option<ActivityKind>,
    pub activity_detail: Option<ActivityDetail>,
    pub note: Option<String>,
}

impl TimeEntryPatch {
    pub fn with_times(mut self, start_time: OffsetDateTime, end_time: OffsetDateTime) -> Self {
        self.start_time = Some(start_time);
        self.end_time = Some(end_time);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn touches_interval(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some()
    }

    /// The entry as it would look after this patch.
    pub fn apply(&self, entry: &TimeEntry) -> TimeEntry {
        TimeEntry {
            start_time: self.start_time.unwrap_or(entry.start_time),
            end_time: self.end_time.or(entry.end_time),
            activity_kind: self.activity_kind.unwrap_or(entry.activity_kind),
            activity_detail: self
                .activity_detail
                .clone()
                .unwrap_or_else(|| entry.activity_detail.clone()),
            note: match &self.note {
                Some(note) if note.trim().is_empty() => None,
                Some(note) => Some(note.clone()),
                None => entry.note.clone(),
            },
            ..entry.clone()
        }
    }
}

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl TimeRange {
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self, TimeTrackingError> {
        if start >= end {
            return Err(TimeTrackingError::InvalidInterval(
                "range start must be before range end".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Range from `start` with no practical upper bound.
    pub fn starting_at(start: OffsetDateTime) -> Self {
        Self {
            start,
            end: FAR_FUTURE,
        }
    }

    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Whether `entry` shares any instant with this range. Open entries extend forever.
    pub fn intersects(&self, entry: &TimeEntry) -> bool {
        let ends_after_start = entry.end_time.map_or(true, |end| end > self.start);
        entry.start_time < self.end && ends_after_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn entry(start: OffsetDateTime, end: Option<OffsetDateTime>) -> TimeEntry {
        TimeEntry {
            id: TimeEntryId::new(1),
            worker_id: WorkerId::new(1),
            start_time: start,
            end_time: end,
            activity_kind: ActivityKind::Other,
            activity_detail: ActivityDetail::Description {
                text: "filing".to_string(),
            },
            note: None,
            created_at: start,
        }
    }

    #[test]
    fn activity_rejects_mismatched_detail() {
        let result = Activity::new(
            ActivityKind::Project,
            ActivityDetail::Neighborhood {
                name: "Atol".to_string(),
            },
        );
        assert!(matches!(result, Err(TimeTrackingError::InvalidActivity(_))));
    }

    #[test]
    fn activity_rejects_blank_neighborhood() {
        let result = Activity::new(
            ActivityKind::NeighborhoodRound,
            ActivityDetail::Neighborhood {
                name: "  ".to_string(),
            },
        );
        assert!(matches!(result, Err(TimeTrackingError::InvalidActivity(_))));
    }

    #[test]
    fn both_meeting_kinds_accept_a_counterpart() {
        let detail = ActivityDetail::Meeting {
            counterpart: "Housing association".to_string(),
        };
        assert!(Activity::new(ActivityKind::InternalMeeting, detail.clone()).is_ok());
        assert!(Activity::new(ActivityKind::ExternalMeeting, detail).is_ok());
    }

    #[test]
    fn activity_kind_parses_case_insensitively() {
        let kind: ActivityKind = "neighborhoodround".parse().unwrap();
        assert_eq!(kind, ActivityKind::NeighborhoodRound);
        assert_eq!(kind.to_string(), "NeighborhoodRound");
    }

    #[test]
    fn activity_detail_serializes_with_type_tag() {
        let detail = ActivityDetail::Project {
            project_id: ProjectId::new("P-12"),
            project_name: "Playground renovation".to_string(),
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["type"], "project");
        assert_eq!(json["projectId"], "P-12");
        assert_eq!(json["projectName"], "Playground renovation");
    }

    #[test]
    fn duration_skips_open_and_malformed_entries() {
        let nine = datetime!(2026-10-19 09:00 UTC);
        let ten = datetime!(2026-10-19 10:00 UTC);

        assert_eq!(entry(nine, Some(ten)).duration(), Some(Duration::hours(1)));
        assert_eq!(entry(nine, None).duration(), None);
        assert_eq!(entry(ten, Some(nine)).duration(), None);
        assert_eq!(entry(nine, Some(nine)).duration(), None);
    }

    #[test]
    fn touching_intervals_do_not_intersect() {
        let existing = entry(
            datetime!(2026-10-19 10:00 UTC),
            Some(datetime!(2026-10-19 12:00 UTC)),
        );

        assert!(existing.intersects(
            datetime!(2026-10-19 11:00 UTC),
            datetime!(2026-10-19 13:00 UTC)
        ));
        assert!(!existing.intersects(
            datetime!(2026-10-19 12:00 UTC),
            datetime!(2026-10-19 13:00 UTC)
        ));
        assert!(!existing.intersects(
            datetime!(2026-10-19 08:00 UTC),
            datetime!(2026-10-19 10:00 UTC)
        ));
    }

    #[test]
    fn patch_keeps_untouched_fields_and_clears_blank_note() {
        let mut original = entry(
            datetime!(2026-10-19 09:00 UTC),
            Some(datetime!(2026-10-19 10:00 UTC)),
        );
        original.note = Some("keys from caretaker".to_string());

        let patched = TimeEntryPatch::default()
            .with_note("")
            .apply(&original);

        assert_eq!(patched.start_time, original.start_time);
        assert_eq!(patched.end_time, original.end_time);
        assert_eq!(patched.note, None);
    }

    #[test]
    fn range_treats_open_entries_as_unbounded() {
        let range = TimeRange::new(
            datetime!(2026-10-19 12:00 UTC),
            datetime!(2026-10-19 13:00 UTC),
        )
        .unwrap();

        assert!(range.intersects(&entry(datetime!(2026-10-19 08:00 UTC), None)));
        assert!(!range.intersects(&entry(
            datetime!(2026-10-19 08:00 UTC),
            Some(datetime!(2026-10-19 12:00 UTC))
        )));
        assert!(range.contains(datetime!(2026-10-19 12:00 UTC)));
        assert!(!range.contains(datetime!(2026-10-19 13:00 UTC)));
    }
}

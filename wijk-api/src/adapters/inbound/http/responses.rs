//! HTTP response types for time tracking endpoints.
//!
//! These types serialize to the JSON format expected by the frontend.

use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::domain::models::{
    ActiveSession, ActivityDetail, ActivityKind, GroupDimension, RecentActivity, Report,
    SessionEvent, Switched, TimeEntry,
};

/// Stored time entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryResponse {
    pub id: i64,
    pub worker_id: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    /// `null` while the entry is the active session.
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    pub activity_kind: ActivityKind,
    pub activity_detail: ActivityDetail,
    pub note: Option<String>,
    /// Length in seconds; `null` for the active session.
    pub duration_seconds: Option<i64>,
}

impl From<TimeEntry> for TimeEntryResponse {
    fn from(entry: TimeEntry) -> Self {
        Self {
            id: entry.id.as_i64(),
            worker_id: entry.worker_id.as_i32(),
            duration_seconds: entry.duration().map(|d| d.whole_seconds()),
            start_time: entry.start_time,
            end_time: entry.end_time,
            activity_kind: entry.activity_kind,
            activity_detail: entry.activity_detail,
            note: entry.note,
        }
    }
}

/// Response for the get session endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSessionResponse {
    pub session: Option<ActiveSessionResponse>,
}

/// Active session with its live elapsed time.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSessionResponse {
    #[serde(flatten)]
    pub entry: TimeEntryResponse,
    /// Elapsed hours.
    pub hours: i64,
    /// Elapsed minutes (within current hour).
    pub minutes: i64,
    /// Elapsed seconds (within current minute).
    pub seconds: i64,
}

impl From<ActiveSession> for ActiveSessionResponse {
    fn from(session: ActiveSession) -> Self {
        let (hours, minutes, seconds) = session.elapsed_hms();
        Self {
            entry: session.entry.into(),
            hours,
            minutes,
            seconds,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchResponse {
    pub closed: TimeEntryResponse,
    pub opened: TimeEntryResponse,
}

impl From<Switched> for SwitchResponse {
    fn from(switched: Switched) -> Self {
        Self {
            closed: switched.closed.into(),
            opened: switched.opened.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditableResponse {
    pub editable: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivityResponse {
    pub activity_kind: ActivityKind,
    pub activity_detail: ActivityDetail,
    pub note: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub last_started: OffsetDateTime,
}

impl From<RecentActivity> for RecentActivityResponse {
    fn from(recent: RecentActivity) -> Self {
        Self {
            activity_kind: recent.activity_kind,
            activity_detail: recent.activity_detail,
            note: recent.note,
            last_started: recent.last_started,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBucketResponse {
    pub key: String,
    pub seconds: i64,
    pub hours: f64,
}

/// Grouped report plus what was left out of it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub group_by: GroupDimension,
    #[serde(with = "time::serde::rfc3339::option")]
    pub from: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub to: Option<OffsetDateTime>,
    pub buckets: Vec<ReportBucketResponse>,
    pub total_seconds: i64,
    pub total_hours: f64,
    pub closed_entries: usize,
    pub open_entries: usize,
    pub malformed_entries: usize,
}

fn hours(duration: Duration) -> f64 {
    duration.as_seconds_f64() / 3600.0
}

impl From<Report> for ReportResponse {
    fn from(report: Report) -> Self {
        Self {
            group_by: report.group_by,
            from: report.range.map(|r| r.start),
            to: report.range.map(|r| r.end),
            buckets: report
                .buckets
                .into_iter()
                .map(|bucket| ReportBucketResponse {
                    seconds: bucket.duration.whole_seconds(),
                    hours: hours(bucket.duration),
                    key: bucket.key,
                })
                .collect(),
            total_seconds: report.summary.total.whole_seconds(),
            total_hours: hours(report.summary.total),
            closed_entries: report.summary.closed,
            open_entries: report.summary.open,
            malformed_entries: report.summary.malformed,
        }
    }
}

/// Payload of a server-sent session event.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum SessionEventResponse {
    Started {
        entry: TimeEntryResponse,
    },
    Switched {
        closed: TimeEntryResponse,
        opened: TimeEntryResponse,
    },
    Stopped {
        entry: TimeEntryResponse,
    },
    #[serde(rename_all = "camelCase")]
    Discarded {
        entry_id: i64,
    },
    /// Events were missed; the client should re-read the session.
    Resync,
}

impl SessionEventResponse {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Switched { .. } => "switched",
            Self::Stopped { .. } => "stopped",
            Self::Discarded { .. } => "discarded",
            Self::Resync => "resync",
        }
    }
}

impl From<SessionEvent> for SessionEventResponse {
    fn from(event: SessionEvent) -> Self {
        match event {
            SessionEvent::Started { entry } => Self::Started {
                entry: entry.into(),
            },
            SessionEvent::Switched { closed, opened } => Self::Switched {
                closed: closed.into(),
                opened: opened.into(),
            },
            SessionEvent::Stopped { entry } => Self::Stopped {
                entry: entry.into(),
            },
            SessionEvent::Discarded { entry_id, .. } => Self::Discarded {
                entry_id: entry_id.as_i64(),
            },
        }
    }
}

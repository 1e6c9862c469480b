//! Pure reporting functions over already fetched entries.
//!
//! Only closed, well-formed entries contribute durations. Open entries and
//! malformed records (end <= start) are skipped and counted in [`Summary`].

use std::collections::BTreeMap;

use time::{Date, Duration};

use crate::domain::models::{GroupDimension, Summary, TimeEntry, TimeRange};

/// Sum of the durations of all closed, well-formed entries.
pub fn total_duration<'a>(entries: impl IntoIterator<Item = &'a TimeEntry>) -> Duration {
    entries
        .into_iter()
        .filter_map(TimeEntry::duration)
        .fold(Duration::ZERO, |acc, d| acc + d)
}

/// Durations keyed by `dimension`.
///
/// Date dimensions bucket by the UTC date of the entry's start. Entries that
/// lack the dimension (a meeting when grouping by project) are left out.
pub fn group_by<'a>(
    entries: impl IntoIterator<Item = &'a TimeEntry>,
    dimension: GroupDimension,
) -> BTreeMap<String, Duration> {
    let mut groups = BTreeMap::new();
    for entry in entries {
        let Some(duration) = entry.duration() else {
            continue;
        };
        let Some(key) = group_key(entry, dimension) else {
            continue;
        };
        *groups.entry(key).or_insert(Duration::ZERO) += duration;
    }
    groups
}

/// Entries whose start falls inside `range`.
pub fn filter_by_interval<'a>(
    entries: impl IntoIterator<Item = &'a TimeEntry>,
    range: &TimeRange,
) -> Vec<&'a TimeEntry> {
    entries
        .into_iter()
        .filter(|entry| range.contains(entry.start_time))
        .collect()
}

/// Total plus counts of what was and was not included.
pub fn summarize<'a>(entries: impl IntoIterator<Item = &'a TimeEntry>) -> Summary {
    let mut summary = Summary::default();
    for entry in entries {
        match entry.duration() {
            Some(duration) => {
                summary.total += duration;
                summary.closed += 1;
            }
            None if entry.is_open() => summary.open += 1,
            None => {
                tracing::warn!(
                    entry_id = %entry.id,
                    worker_id = %entry.worker_id,
                    "skipping malformed time entry"
                );
                summary.malformed += 1;
            }
        }
    }
    summary
}

fn group_key(entry: &TimeEntry, dimension: GroupDimension) -> Option<String> {
    let day = entry.start_time.to_offset(time::UtcOffset::UTC).date();
    match dimension {
        GroupDimension::ActivityKind => Some(entry.activity_kind.to_string()),
        GroupDimension::Worker => Some(entry.worker_id.to_string()),
        GroupDimension::Neighborhood => entry.neighborhood().map(str::to_string),
        GroupDimension::Project => entry.project().map(ToString::to_string),
        GroupDimension::Day => Some(day_key(day)),
        GroupDimension::Week => {
            let (year, week, _) = day.to_iso_week_date();
            Some(format!("{year:04}-W{week:02}"))
        }
        GroupDimension::Month => Some(format!("{:04}-{:02}", day.year(), u8::from(day.month()))),
    }
}

fn day_key(day: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        day.year(),
        u8::from(day.month()),
        day.day()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ActivityDetail, ActivityKind, ProjectId, TimeEntryId, WorkerId};
    use time::{macros::datetime, OffsetDateTime};

    fn entry(
        id: i64,
        start: OffsetDateTime,
        end: Option<OffsetDateTime>,
        kind: ActivityKind,
        detail: ActivityDetail,
    ) -> TimeEntry {
        TimeEntry {
            id: TimeEntryId::new(id),
            worker_id: WorkerId::new(1),
            start_time: start,
            end_time: end,
            activity_kind: kind,
            activity_detail: detail,
            note: None,
            created_at: start,
        }
    }

    fn round(id: i64, start: OffsetDateTime, end: OffsetDateTime, name: &str) -> TimeEntry {
        entry(
            id,
            start,
            Some(end),
            ActivityKind::NeighborhoodRound,
            ActivityDetail::Neighborhood {
                name: name.to_string(),
            },
        )
    }

    fn project(id: i64, start: OffsetDateTime, end: OffsetDateTime) -> TimeEntry {
        entry(
            id,
            start,
            Some(end),
            ActivityKind::Project,
            ActivityDetail::Project {
                project_id: ProjectId::new("P-7"),
                project_name: "Repair café".to_string(),
            },
        )
    }

    fn sample() -> Vec<TimeEntry> {
        vec![
            round(
                1,
                datetime!(2026-10-19 09:00 UTC),
                datetime!(2026-10-19 10:00 UTC),
                "Atol",
            ),
            project(
                2,
                datetime!(2026-10-19 10:00 UTC),
                datetime!(2026-10-19 11:30 UTC),
            ),
            round(
                3,
                datetime!(2026-10-20 13:00 UTC),
                datetime!(2026-10-20 13:45 UTC),
                "Centrum",
            ),
        ]
    }

    #[test]
    fn grouped_totals_add_up_to_the_total() {
        let entries = sample();
        let total = total_duration(&entries);

        for dimension in [
            GroupDimension::ActivityKind,
            GroupDimension::Worker,
            GroupDimension::Day,
            GroupDimension::Week,
            GroupDimension::Month,
        ] {
            let sum = group_by(&entries, dimension)
                .values()
                .fold(Duration::ZERO, |acc, d| acc + *d);
            assert_eq!(sum, total, "dimension {dimension}");
        }
        assert_eq!(total, Duration::minutes(195));
    }

    #[test]
    fn two_hour_day_bucket() {
        let entries = vec![
            round(
                1,
                datetime!(2026-10-19 09:00 UTC),
                datetime!(2026-10-19 10:00 UTC),
                "Atol",
            ),
            round(
                2,
                datetime!(2026-10-19 14:00 UTC),
                datetime!(2026-10-19 15:00 UTC),
                "Atol",
            ),
        ];

        let by_day = group_by(&entries, GroupDimension::Day);
        assert_eq!(by_day.len(), 1);
        assert_eq!(by_day["2026-10-19"], Duration::hours(2));
    }

    #[test]
    fn open_and_malformed_entries_are_skipped() {
        let mut entries = sample();
        entries.push(entry(
            4,
            datetime!(2026-10-20 15:00 UTC),
            None,
            ActivityKind::Other,
            ActivityDetail::Description {
                text: "admin".to_string(),
            },
        ));
        entries.push(round(
            5,
            datetime!(2026-10-20 12:00 UTC),
            datetime!(2026-10-20 11:00 UTC),
            "Atol",
        ));

        let summary = summarize(&entries);
        assert_eq!(summary.total, Duration::minutes(195));
        assert_eq!(summary.closed, 3);
        assert_eq!(summary.open, 1);
        assert_eq!(summary.malformed, 1);
        assert_eq!(total_duration(&entries), summary.total);
    }

    #[test]
    fn totals_add_across_disjoint_sets() {
        let mut entries = sample();
        entries.push(entry(
            4,
            datetime!(2026-10-20 15:00 UTC),
            None,
            ActivityKind::Other,
            ActivityDetail::Description {
                text: "admin".to_string(),
            },
        ));
        entries.push(round(
            5,
            datetime!(2026-10-20 12:00 UTC),
            datetime!(2026-10-20 11:00 UTC),
            "Atol",
        ));
        let whole = total_duration(&entries);

        // Every split of the entries into two disjoint sets.
        for mask in 0u32..(1 << entries.len()) {
            let (left, right): (Vec<_>, Vec<_>) = entries
                .iter()
                .enumerate()
                .partition(|(i, _)| mask & (1 << *i) != 0);
            let left = total_duration(left.into_iter().map(|(_, e)| e));
            let right = total_duration(right.into_iter().map(|(_, e)| e));

            assert_eq!(left + right, whole, "split {mask:#07b}");
        }
        assert_eq!(total_duration(&[] as &[TimeEntry]), Duration::ZERO);
    }

    #[test]
    fn entries_without_the_dimension_are_left_out() {
        let entries = sample();

        let by_neighborhood = group_by(&entries, GroupDimension::Neighborhood);
        assert_eq!(by_neighborhood["Atol"], Duration::hours(1));
        assert_eq!(by_neighborhood["Centrum"], Duration::minutes(45));
        assert_eq!(by_neighborhood.len(), 2);

        let by_project = group_by(&entries, GroupDimension::Project);
        assert_eq!(by_project["P-7"], Duration::minutes(90));
        assert_eq!(by_project.len(), 1);
    }

    #[test]
    fn week_and_month_keys() {
        let entries = vec![
            round(
                1,
                datetime!(2026-12-31 09:00 UTC),
                datetime!(2026-12-31 10:00 UTC),
                "Atol",
            ),
            round(
                2,
                datetime!(2027-01-04 09:00 UTC),
                datetime!(2027-01-04 09:30 UTC),
                "Atol",
            ),
        ];

        let by_week = group_by(&entries, GroupDimension::Week);
        assert_eq!(by_week["2026-W53"], Duration::hours(1));
        assert_eq!(by_week["2027-W01"], Duration::minutes(30));

        let by_month = group_by(&entries, GroupDimension::Month);
        assert_eq!(by_month["2026-12"], Duration::hours(1));
        assert_eq!(by_month["2027-01"], Duration::minutes(30));
    }

    #[test]
    fn day_buckets_use_the_utc_start_date() {
        let late = round(
            1,
            datetime!(2026-10-19 23:30 -2),
            datetime!(2026-10-20 00:30 -2),
            "Atol",
        );

        let by_day = group_by([&late], GroupDimension::Day);
        assert_eq!(by_day["2026-10-20"], Duration::hours(1));
    }

    #[test]
    fn filter_keeps_entries_starting_inside_the_range() {
        let entries = sample();
        let range = TimeRange::new(
            datetime!(2026-10-19 10:00 UTC),
            datetime!(2026-10-20 13:00 UTC),
        )
        .unwrap();

        let ids: Vec<_> = filter_by_interval(&entries, &range)
            .into_iter()
            .map(|e| e.id.as_i64())
            .collect();
        assert_eq!(ids, vec![2]);
    }
}

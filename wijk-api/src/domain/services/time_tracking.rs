use std::sync::Arc;

use async_trait::async_trait;
use itertools::Itertools;
use time::{Duration, OffsetDateTime};
use tokio::sync::broadcast;
use tracing::instrument;

use crate::domain::{
    models::{
        ActiveSession, Activity, CreateEntryRequest, NewTimeEntry, RecentActivity, Report,
        ReportBucket, ReportQuery, ReportScope, SessionEvent, StartSessionRequest,
        SwitchSessionRequest, Switched, TimeEntry, TimeEntryId, TimeEntryPatch, TimeRange,
        WorkerId, WorkerProfile, FAR_FUTURE,
    },
    ports::{
        inbound::TimeTrackingService,
        outbound::{Clock, TimeEntryStore, UserDirectory},
    },
    TimeTrackingError,
};

use super::{
    aggregation, EditWindowPolicy, OverlapValidator, SessionManager, SessionNotifier,
    DEFAULT_EDIT_WINDOW_DAYS,
};

/// How far back `recent_activities` looks.
const RECENT_LOOKBACK_DAYS: i64 = 60;

/// Tunables of the tracking rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingRules {
    pub edit_window: Duration,
    /// How far past the server clock an explicit end time may be.
    pub clock_skew_tolerance: Duration,
}

impl Default for TrackingRules {
    fn default() -> Self {
        Self {
            edit_window: Duration::days(DEFAULT_EDIT_WINDOW_DAYS),
            clock_skew_tolerance: Duration::seconds(60),
        }
    }
}

/// Implementation of the TimeTrackingService inbound port.
///
/// Composes the session state machine, the overlap and edit-window rules and
/// the aggregator over one store, and publishes session transitions.
pub struct TimeTrackingServiceImpl<S, U> {
    store: Arc<S>,
    directory: Arc<U>,
    clock: Arc<dyn Clock>,
    rules: TrackingRules,
    sessions: SessionManager<S>,
    validator: OverlapValidator<S>,
    edit_window: EditWindowPolicy,
    notifier: SessionNotifier,
}

impl<S: TimeEntryStore, U: UserDirectory> TimeTrackingServiceImpl<S, U> {
    pub fn new(
        store: Arc<S>,
        directory: Arc<U>,
        clock: Arc<dyn Clock>,
        rules: TrackingRules,
    ) -> Self {
        Self {
            sessions: SessionManager::new(store.clone(), clock.clone(), rules.clock_skew_tolerance),
            validator: OverlapValidator::new(store.clone()),
            edit_window: EditWindowPolicy::new(rules.edit_window, clock.clone()),
            notifier: SessionNotifier::new(),
            store,
            directory,
            clock,
            rules,
        }
    }

    async fn acting_profile(&self, acting: WorkerId) -> Result<WorkerProfile, TimeTrackingError> {
        self.directory.resolve(acting).await
    }

    async fn owned_entry(
        &self,
        profile: &WorkerProfile,
        id: TimeEntryId,
    ) -> Result<TimeEntry, TimeTrackingError> {
        let entry = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| TimeTrackingError::entry_not_found(id))?;

        if !profile.may_act_for(entry.worker_id) {
            tracing::warn!(
                worker_id = %profile.id,
                owner_id = %entry.worker_id,
                entry_id = %id,
                "rejected access to another worker's entry"
            );
            return Err(TimeTrackingError::Forbidden);
        }
        Ok(entry)
    }

    /// Validate a closed interval coming from a manual create or edit.
    fn check_closed_interval(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<(), TimeTrackingError> {
        if start >= end {
            return Err(TimeTrackingError::invalid_interval(
                "end time must be after start time",
            ));
        }
        if end > self.clock.now() + self.rules.clock_skew_tolerance {
            return Err(TimeTrackingError::invalid_interval(
                "end time is in the future",
            ));
        }
        Ok(())
    }

    /// Overlap gate for manual paths: closed entries plus the open session.
    ///
    /// The open entry counts as `[start, +inf)` so a later stop can never be
    /// blocked by a manually registered interval.
    async fn ensure_manual_clear(
        &self,
        worker_id: WorkerId,
        start: OffsetDateTime,
        end: OffsetDateTime,
        exclude: Option<TimeEntryId>,
    ) -> Result<(), TimeTrackingError> {
        if let Some(open) = self.store.open_entry(worker_id).await? {
            if Some(open.id) != exclude && end > open.start_time {
                return Err(TimeTrackingError::OverlapConflict(vec![open]));
            }
        }
        self.validator
            .ensure_clear(worker_id, start, end, exclude)
            .await
    }

    /// Checks for editing the worker's open entry: no end, start not in the future.
    async fn check_open_edit(
        &self,
        entry: &TimeEntry,
        patch: &TimeEntryPatch,
    ) -> Result<(), TimeTrackingError> {
        if patch.end_time.is_some() {
            return Err(TimeTrackingError::invalid_interval(
                "the active session is closed by stopping it",
            ));
        }
        let Some(start) = patch.start_time else {
            return Ok(());
        };
        if start > self.clock.now() + self.rules.clock_skew_tolerance {
            return Err(TimeTrackingError::invalid_interval(
                "session cannot start in the future",
            ));
        }
        let range = TimeRange::starting_at(start);
        self.validator
            .ensure_clear(entry.worker_id, range.start, range.end, Some(entry.id))
            .await
    }

    async fn report_entries(
        &self,
        profile: &WorkerProfile,
        query: &ReportQuery,
    ) -> Result<Vec<TimeEntry>, TimeTrackingError> {
        let entries = match query.scope {
            ReportScope::Own => self.store.query(profile.id, query.range).await?,
            ReportScope::Worker(worker_id) => {
                if !profile.may_act_for(worker_id) {
                    return Err(TimeTrackingError::Forbidden);
                }
                self.store.query(worker_id, query.range).await?
            }
            ReportScope::AllWorkers => {
                if !profile.is_privileged() {
                    return Err(TimeTrackingError::Forbidden);
                }
                self.store.query_all(query.range).await?
            }
        };
        Ok(entries)
    }
}

#[async_trait]
impl<S: TimeEntryStore, U: UserDirectory> TimeTrackingService for TimeTrackingServiceImpl<S, U> {
    async fn get_active_session(
        &self,
        acting: WorkerId,
    ) -> Result<Option<ActiveSession>, TimeTrackingError> {
        self.acting_profile(acting).await?;
        let session = self.sessions.get_active(acting).await?.map(|entry| ActiveSession {
            elapsed: self.sessions.elapsed(&entry),
            entry,
        });
        Ok(session)
    }

    #[instrument(skip(self, request), fields(worker_id = %acting))]
    async fn start_session(
        &self,
        acting: WorkerId,
        request: StartSessionRequest,
    ) -> Result<TimeEntry, TimeTrackingError> {
        self.acting_profile(acting).await?;
        let entry = self
            .sessions
            .start(
                acting,
                request.activity_kind,
                request.activity_detail,
                request.note,
            )
            .await?;

        self.notifier.publish(SessionEvent::Started {
            entry: entry.clone(),
        });
        Ok(entry)
    }

    #[instrument(skip(self, request), fields(worker_id = %acting))]
    async fn switch_session(
        &self,
        acting: WorkerId,
        request: SwitchSessionRequest,
    ) -> Result<Switched, TimeTrackingError> {
        self.acting_profile(acting).await?;
        let switched = self
            .sessions
            .switch(
                acting,
                request.activity_kind,
                request.activity_detail,
                request.note,
                request.at,
            )
            .await?;

        self.notifier.publish(switched.clone().into());
        Ok(switched)
    }

    #[instrument(skip(self), fields(worker_id = %acting))]
    async fn stop_session(
        &self,
        acting: WorkerId,
        at: Option<OffsetDateTime>,
    ) -> Result<TimeEntry, TimeTrackingError> {
        self.acting_profile(acting).await?;
        let entry = self.sessions.stop(acting, at).await?;

        self.notifier.publish(SessionEvent::Stopped {
            entry: entry.clone(),
        });
        Ok(entry)
    }

    async fn list_entries(
        &self,
        acting: WorkerId,
        worker: Option<WorkerId>,
        range: Option<TimeRange>,
    ) -> Result<Vec<TimeEntry>, TimeTrackingError> {
        let profile = self.acting_profile(acting).await?;
        let owner = worker.unwrap_or(acting);
        if !profile.may_act_for(owner) {
            return Err(TimeTrackingError::Forbidden);
        }

        Ok(self.store.query(owner, range).await?)
    }

    #[instrument(skip(self, request), fields(worker_id = %acting))]
    async fn create_entry(
        &self,
        acting: WorkerId,
        request: CreateEntryRequest,
    ) -> Result<TimeEntry, TimeTrackingError> {
        let profile = self.acting_profile(acting).await?;
        let owner = request.worker_id.unwrap_or(acting);
        if !profile.may_act_for(owner) {
            return Err(TimeTrackingError::Forbidden);
        }
        if owner != acting {
            self.directory.resolve(owner).await?;
        }

        self.edit_window.enforce_start(request.start_time, &profile)?;
        let activity = Activity::new(request.activity_kind, request.activity_detail)?;
        self.check_closed_interval(request.start_time, request.end_time)?;
        self.ensure_manual_clear(owner, request.start_time, request.end_time, None)
            .await?;

        let new_entry =
            NewTimeEntry::closed(owner, request.start_time, request.end_time, activity)
                .with_note(request.note);
        let entry = match self.store.create(&new_entry).await {
            Ok(entry) => entry,
            Err(err) => {
                return Err(self
                    .validator
                    .explain(err, owner, request.start_time, request.end_time, None)
                    .await)
            }
        };

        tracing::info!(entry_id = %entry.id, owner_id = %owner, "manual entry created");
        Ok(entry)
    }

    #[instrument(skip(self, patch), fields(worker_id = %acting, entry_id = %id))]
    async fn edit_entry(
        &self,
        acting: WorkerId,
        id: TimeEntryId,
        patch: TimeEntryPatch,
    ) -> Result<TimeEntry, TimeTrackingError> {
        let profile = self.acting_profile(acting).await?;
        let entry = self.owned_entry(&profile, id).await?;

        // Window checks come before any interval validation.
        self.edit_window.enforce(&entry, &profile)?;
        if let Some(start) = patch.start_time {
            self.edit_window.enforce_start(start, &profile)?;
        }

        let updated = patch.apply(&entry);
        Activity::new(updated.activity_kind, updated.activity_detail.clone())?;

        if entry.is_open() {
            self.check_open_edit(&entry, &patch).await?;
        } else if let Some(end) = updated.end_time {
            self.check_closed_interval(updated.start_time, end)?;
            if patch.touches_interval() {
                self.ensure_manual_clear(entry.worker_id, updated.start_time, end, Some(id))
                    .await?;
            }
        }

        match self.store.update(id, &patch).await {
            Ok(saved) => {
                tracing::info!("entry edited");
                Ok(saved)
            }
            Err(err) => Err(self
                .validator
                .explain(
                    err,
                    entry.worker_id,
                    updated.start_time,
                    updated.end_time.unwrap_or(FAR_FUTURE),
                    Some(id),
                )
                .await),
        }
    }

    #[instrument(skip(self), fields(worker_id = %acting, entry_id = %id))]
    async fn delete_entry(
        &self,
        acting: WorkerId,
        id: TimeEntryId,
    ) -> Result<(), TimeTrackingError> {
        let profile = self.acting_profile(acting).await?;
        let entry = self.owned_entry(&profile, id).await?;
        self.edit_window.enforce(&entry, &profile)?;

        self.store.delete(id).await?;

        if entry.is_open() {
            self.notifier.publish(SessionEvent::Discarded {
                worker_id: entry.worker_id,
                entry_id: id,
            });
        }
        tracing::info!(discarded_session = entry.is_open(), "entry deleted");
        Ok(())
    }

    async fn can_edit(&self, acting: WorkerId, id: TimeEntryId) -> Result<bool, TimeTrackingError> {
        let profile = self.acting_profile(acting).await?;
        let entry = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| TimeTrackingError::entry_not_found(id))?;

        Ok(profile.may_act_for(entry.worker_id) && self.edit_window.can_edit(&entry, &profile))
    }

    #[instrument(skip(self), fields(worker_id = %acting))]
    async fn report(
        &self,
        acting: WorkerId,
        query: ReportQuery,
    ) -> Result<Report, TimeTrackingError> {
        let profile = self.acting_profile(acting).await?;
        let entries = self.report_entries(&profile, &query).await?;

        let selected: Vec<&TimeEntry> = match &query.range {
            Some(range) => aggregation::filter_by_interval(&entries, range),
            None => entries.iter().collect(),
        };

        let buckets = aggregation::group_by(selected.iter().copied(), query.group_by)
            .into_iter()
            .map(|(key, duration)| ReportBucket { key, duration })
            .collect();
        let summary = aggregation::summarize(selected.iter().copied());

        Ok(Report {
            group_by: query.group_by,
            range: query.range,
            buckets,
            summary,
        })
    }

    async fn recent_activities(
        &self,
        acting: WorkerId,
        limit: usize,
    ) -> Result<Vec<RecentActivity>, TimeTrackingError> {
        self.acting_profile(acting).await?;
        let since = self.clock.now() - Duration::days(RECENT_LOOKBACK_DAYS);
        let mut entries = self
            .store
            .query(acting, Some(TimeRange::starting_at(since)))
            .await?;

        entries.sort_by(|a, b| b.start_time.cmp(&a.start_time));

        let recent = entries
            .into_iter()
            .unique_by(|entry| {
                (
                    entry.activity_kind,
                    entry.activity_detail.clone(),
                    entry.note.clone(),
                )
            })
            .take(limit)
            .map(|entry| RecentActivity {
                activity_kind: entry.activity_kind,
                activity_detail: entry.activity_detail,
                note: entry.note,
                last_started: entry.start_time,
            })
            .collect();
        Ok(recent)
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.notifier.subscribe()
    }
}

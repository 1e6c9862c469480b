use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::instrument;

use super::query_range;
use crate::{
    adapters::inbound::http::{EditableResponse, RecentActivityResponse, TimeEntryResponse},
    app_state::AppState,
    auth::AuthWorker,
    domain::models::{
        ActivityDetail, ActivityKind, CreateEntryRequest, TimeEntryId, TimeEntryPatch, WorkerId,
    },
    routes::ApiError,
};

const DEFAULT_RECENT_LIMIT: usize = 10;

// ============================================================================
// List Entries
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntriesQuery {
    worker_id: Option<WorkerId>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    from: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    to: Option<OffsetDateTime>,
}

#[instrument(name = "list_entries", skip(app_state))]
pub async fn list_entries(
    worker: AuthWorker,
    State(app_state): State<AppState>,
    Query(query): Query<ListEntriesQuery>,
) -> Result<Json<Vec<TimeEntryResponse>>, ApiError> {
    let range = query_range(query.from, query.to)?;
    let entries = app_state
        .time_tracking
        .list_entries(worker.id, query.worker_id, range)
        .await?;

    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

// ============================================================================
// Create Entry
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryPayload {
    /// Admins may register time for another worker.
    worker_id: Option<WorkerId>,
    #[serde(with = "time::serde::rfc3339")]
    start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    end_time: OffsetDateTime,
    activity_kind: ActivityKind,
    activity_detail: ActivityDetail,
    note: Option<String>,
}

#[instrument(name = "create_entry", skip(app_state))]
pub async fn create_entry(
    worker: AuthWorker,
    State(app_state): State<AppState>,
    Json(body): Json<CreateEntryPayload>,
) -> Result<(StatusCode, Json<TimeEntryResponse>), ApiError> {
    let mut request = CreateEntryRequest::new(
        body.start_time,
        body.end_time,
        body.activity_kind,
        body.activity_detail,
    );
    request.note = body.note;
    if let Some(owner) = body.worker_id {
        request = request.for_worker(owner);
    }

    let entry = app_state
        .time_tracking
        .create_entry(worker.id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(entry.into())))
}

// ============================================================================
// Edit Entry
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditEntryPayload {
    #[serde(default, with = "time::serde::rfc3339::option")]
    start_time: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    end_time: Option<OffsetDateTime>,
    activity_kind: Option<ActivityKind>,
    activity_detail: Option<ActivityDetail>,
    /// An empty note clears the stored one.
    note: Option<String>,
}

impl From<EditEntryPayload> for TimeEntryPatch {
    fn from(body: EditEntryPayload) -> Self {
        TimeEntryPatch {
            start_time: body.start_time,
            end_time: body.end_time,
            activity_kind: body.activity_kind,
            activity_detail: body.activity_detail,
            note: body.note,
        }
    }
}

#[instrument(name = "edit_entry", skip(app_state))]
pub async fn edit_entry(
    worker: AuthWorker,
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<EditEntryPayload>,
) -> Result<Json<TimeEntryResponse>, ApiError> {
    let entry = app_state
        .time_tracking
        .edit_entry(worker.id, TimeEntryId::new(id), body.into())
        .await?;

    Ok(Json(entry.into()))
}

// ============================================================================
// Delete Entry
// ============================================================================

#[instrument(name = "delete_entry", skip(app_state))]
pub async fn delete_entry(
    worker: AuthWorker,
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    app_state
        .time_tracking
        .delete_entry(worker.id, TimeEntryId::new(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Editable
// ============================================================================

#[instrument(name = "can_edit", skip(app_state))]
pub async fn can_edit(
    worker: AuthWorker,
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<EditableResponse>, ApiError> {
    let editable = app_state
        .time_tracking
        .can_edit(worker.id, TimeEntryId::new(id))
        .await?;

    Ok(Json(EditableResponse { editable }))
}

// ============================================================================
// Recent Activities
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    limit: Option<usize>,
}

#[instrument(name = "recent_activities", skip(app_state))]
pub async fn recent_activities(
    worker: AuthWorker,
    State(app_state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<RecentActivityResponse>>, ApiError> {
    let recent = app_state
        .time_tracking
        .recent_activities(worker.id, query.limit.unwrap_or(DEFAULT_RECENT_LIMIT))
        .await?;

    Ok(Json(recent.into_iter().map(Into::into).collect()))
}

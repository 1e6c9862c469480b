use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::{stream, Stream};
use serde::Deserialize;
use time::OffsetDateTime;
use tokio::sync::broadcast::error::RecvError;
use tracing::instrument;

use crate::{
    adapters::inbound::http::{
        GetSessionResponse, SessionEventResponse, SwitchResponse, TimeEntryResponse,
    },
    app_state::AppState,
    auth::AuthWorker,
    domain::models::{ActivityDetail, ActivityKind, StartSessionRequest, SwitchSessionRequest},
    routes::ApiError,
};

// ============================================================================
// Get Session
// ============================================================================

#[instrument(name = "get_session", skip(app_state))]
pub async fn get_session(
    worker: AuthWorker,
    State(app_state): State<AppState>,
) -> Result<Json<GetSessionResponse>, ApiError> {
    let session = app_state.time_tracking.get_active_session(worker.id).await?;

    Ok(Json(GetSessionResponse {
        session: session.map(Into::into),
    }))
}

// ============================================================================
// Start Session
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionPayload {
    activity_kind: ActivityKind,
    activity_detail: ActivityDetail,
    note: Option<String>,
}

#[instrument(name = "start_session", skip(app_state))]
pub async fn start_session(
    worker: AuthWorker,
    State(app_state): State<AppState>,
    Json(body): Json<StartSessionPayload>,
) -> Result<(StatusCode, Json<TimeEntryResponse>), ApiError> {
    let mut request = StartSessionRequest::new(body.activity_kind, body.activity_detail);
    if let Some(note) = body.note {
        request = request.with_note(note);
    }

    let entry = app_state
        .time_tracking
        .start_session(worker.id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(entry.into())))
}

// ============================================================================
// Switch Session
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchSessionPayload {
    activity_kind: ActivityKind,
    activity_detail: ActivityDetail,
    note: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    at: Option<OffsetDateTime>,
}

#[instrument(name = "switch_session", skip(app_state))]
pub async fn switch_session(
    worker: AuthWorker,
    State(app_state): State<AppState>,
    Json(body): Json<SwitchSessionPayload>,
) -> Result<Json<SwitchResponse>, ApiError> {
    let mut request = SwitchSessionRequest::new(body.activity_kind, body.activity_detail);
    request.note = body.note;
    if let Some(at) = body.at {
        request = request.at(at);
    }

    let switched = app_state
        .time_tracking
        .switch_session(worker.id, request)
        .await?;

    Ok(Json(switched.into()))
}

// ============================================================================
// Stop Session
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopSessionPayload {
    /// Explicit end time, for recovering from clock skew.
    #[serde(default, with = "time::serde::rfc3339::option")]
    at: Option<OffsetDateTime>,
}

/// The body is optional; an empty one means "stop now".
#[instrument(name = "stop_session", skip(app_state, body))]
pub async fn stop_session(
    worker: AuthWorker,
    State(app_state): State<AppState>,
    body: Bytes,
) -> Result<Json<TimeEntryResponse>, ApiError> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        StopSessionPayload::default()
    } else {
        serde_json::from_slice::<StopSessionPayload>(&body)
            .map_err(|e| ApiError::bad_request(format!("invalid stop payload: {e}")))?
    };

    let entry = app_state
        .time_tracking
        .stop_session(worker.id, body.at)
        .await?;

    Ok(Json(entry.into()))
}

// ============================================================================
// Session Events (SSE)
// ============================================================================

#[instrument(name = "session_events", skip(app_state))]
pub async fn session_events(
    worker: AuthWorker,
    State(app_state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let worker_id = worker.id;
    let receiver = app_state.time_tracking.subscribe();

    let events = stream::unfold(receiver, move |mut receiver| async move {
        loop {
            let payload = match receiver.recv().await {
                Ok(event) if event.worker_id() == worker_id => SessionEventResponse::from(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(worker_id = %worker_id, skipped, "session event stream lagged");
                    SessionEventResponse::Resync
                }
                Err(RecvError::Closed) => return None,
            };

            let event = Event::default().event(payload.name()).json_data(&payload);
            return Some((event, receiver));
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

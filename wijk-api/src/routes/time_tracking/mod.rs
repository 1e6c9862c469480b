mod entries;
mod reports;
mod session;

use axum::{
    routing::{get, post, put},
    Router,
};
use time::OffsetDateTime;

use super::ApiError;
use crate::{app_state::AppState, domain::models::TimeRange};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session", get(session::get_session))
        .route("/session/start", post(session::start_session))
        .route("/session/switch", post(session::switch_session))
        .route("/session/stop", post(session::stop_session))
        .route("/session/events", get(session::session_events))
        .route(
            "/entries",
            get(entries::list_entries).post(entries::create_entry),
        )
        .route("/entries/recent", get(entries::recent_activities))
        .route(
            "/entries/:id",
            put(entries::edit_entry).delete(entries::delete_entry),
        )
        .route("/entries/:id/editable", get(entries::can_edit))
        .route("/reports/summary", get(reports::summary))
}

/// Build a range from optional `from`/`to` query bounds.
fn query_range(
    from: Option<OffsetDateTime>,
    to: Option<OffsetDateTime>,
) -> Result<Option<TimeRange>, ApiError> {
    let range = match (from, to) {
        (None, None) => return Ok(None),
        (Some(from), None) => TimeRange::starting_at(from),
        (from, Some(to)) => TimeRange::new(from.unwrap_or(OffsetDateTime::UNIX_EPOCH), to)?,
    };
    Ok(Some(range))
}

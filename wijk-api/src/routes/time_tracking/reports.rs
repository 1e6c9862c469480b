use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::instrument;

use super::query_range;
use crate::{
    adapters::inbound::http::ReportResponse,
    app_state::AppState,
    auth::AuthWorker,
    domain::models::{GroupDimension, ReportQuery, ReportScope, WorkerId},
    routes::ApiError,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    group_by: GroupDimension,
    #[serde(default, with = "time::serde::rfc3339::option")]
    from: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    to: Option<OffsetDateTime>,
    worker_id: Option<WorkerId>,
    /// Report across every worker. Admins only.
    #[serde(default)]
    all_workers: bool,
}

#[instrument(name = "report_summary", skip(app_state))]
pub async fn summary(
    worker: AuthWorker,
    State(app_state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<ReportResponse>, ApiError> {
    let scope = match (query.all_workers, query.worker_id) {
        (true, Some(_)) => {
            return Err(ApiError::bad_request(
                "allWorkers and workerId are mutually exclusive",
            ))
        }
        (true, None) => ReportScope::AllWorkers,
        (false, Some(worker_id)) => ReportScope::Worker(worker_id),
        (false, None) => ReportScope::Own,
    };

    let mut report_query = ReportQuery::new(query.group_by).with_scope(scope);
    if let Some(range) = query_range(query.from, query.to)? {
        report_query = report_query.with_range(range);
    }

    let report = app_state
        .time_tracking
        .report(worker.id, report_query)
        .await?;

    Ok(Json(report.into()))
}

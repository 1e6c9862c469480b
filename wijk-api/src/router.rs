use axum::{
    http::{header::CONTENT_TYPE, HeaderName, Method},
    routing::get,
    Router,
};
use sqlx::PgPool;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::{app_state::AppState, auth::WORKER_ID_HEADER, config::Settings, factory, routes};

pub fn create(connection_pool: PgPool, config: &Settings) -> Router<()> {
    let time_tracking = factory::time_tracking_service(connection_pool, &config.time_tracking);
    build(AppState::new(time_tracking), config.application.app_url.clone())
}

/// Assemble the HTTP surface around an already wired state.
pub fn build(app_state: AppState, app_url: String) -> Router<()> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(WORKER_ID_HEADER)])
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            origin.to_str().unwrap_or_default() == app_url
        }));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest("/time-tracking", routes::time_tracking::router())
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
}

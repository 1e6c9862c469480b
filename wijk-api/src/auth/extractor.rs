use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{domain::models::WorkerId, routes::ApiError};

/// Header set by the authentication gateway in front of this service.
pub const WORKER_ID_HEADER: &str = "x-worker-id";

/// A custom Axum extractor for the authenticated worker.
///
/// Authentication itself happens upstream; this only reads the identity it
/// forwarded. Returns 401 Unauthorized when the header is missing or malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthWorker {
    pub id: WorkerId,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthWorker
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(WORKER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

        let id = raw
            .to_str()
            .ok()
            .and_then(|value| value.trim().parse::<i32>().ok())
            .ok_or_else(|| ApiError::unauthorized("Malformed worker identity"))?;

        Ok(AuthWorker {
            id: WorkerId::new(id),
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Request, StatusCode};

    use super::*;

    async fn extract(header: Option<&str>) -> Result<AuthWorker, ApiError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(WORKER_ID_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AuthWorker::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_the_forwarded_worker() {
        let worker = extract(Some("42")).await.unwrap();
        assert_eq!(worker.id, WorkerId::new(42));
    }

    #[tokio::test]
    async fn missing_or_malformed_identity_is_unauthorized() {
        for header in [None, Some("abc"), Some("")] {
            let err = extract(header).await.unwrap_err();
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        }
    }
}

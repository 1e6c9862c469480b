use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

use crate::{adapters::inbound::http::TimeEntryResponse, domain::TimeTrackingError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ActiveSessionExists,
    NoActiveSession,
    InvalidInterval,
    OverlapConflict,
    EditWindowExpired,
    InvalidActivity,
    Forbidden,
    NotFound,
    StoreUnavailable,
    StoreError,
    Unauthenticated,
    BadRequest,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    conflicts: Vec<TimeEntryResponse>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: Option<ErrorCode>,
    conflicts: Vec<TimeEntryResponse>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
            conflicts: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_conflicts(mut self, conflicts: Vec<TimeEntryResponse>) -> Self {
        self.conflicts = conflicts;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message).with_code(ErrorCode::BadRequest)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message).with_code(ErrorCode::Unauthenticated)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            code: self.code,
            conflicts: self.conflicts,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<TimeTrackingError> for ApiError {
    fn from(err: TimeTrackingError) -> Self {
        let message = err.to_string();
        match err {
            TimeTrackingError::ActiveSessionExists => {
                Self::conflict(message).with_code(ErrorCode::ActiveSessionExists)
            }
            TimeTrackingError::OverlapConflict(conflicts) => Self::conflict(message)
                .with_code(ErrorCode::OverlapConflict)
                .with_conflicts(conflicts.into_iter().map(TimeEntryResponse::from).collect()),
            TimeTrackingError::NoActiveSession => {
                Self::not_found(message).with_code(ErrorCode::NoActiveSession)
            }
            TimeTrackingError::NotFound(_) => {
                Self::not_found(message).with_code(ErrorCode::NotFound)
            }
            TimeTrackingError::InvalidInterval(_) => {
                Self::new(StatusCode::BAD_REQUEST, message).with_code(ErrorCode::InvalidInterval)
            }
            TimeTrackingError::InvalidActivity(_) => {
                Self::new(StatusCode::BAD_REQUEST, message).with_code(ErrorCode::InvalidActivity)
            }
            TimeTrackingError::EditWindowExpired => {
                Self::forbidden(message).with_code(ErrorCode::EditWindowExpired)
            }
            TimeTrackingError::Forbidden => {
                Self::forbidden(message).with_code(ErrorCode::Forbidden)
            }
            TimeTrackingError::StoreUnavailable(ref reason) => {
                tracing::warn!("Time entry store unavailable: {}", reason);
                Self::unavailable("time entry store unavailable, try again")
                    .with_code(ErrorCode::StoreUnavailable)
            }
            TimeTrackingError::Store(ref reason) => {
                tracing::error!("Time entry store error: {}", reason);
                Self::internal("time entry store error").with_code(ErrorCode::StoreError)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (TimeTrackingError::ActiveSessionExists, StatusCode::CONFLICT),
            (TimeTrackingError::OverlapConflict(vec![]), StatusCode::CONFLICT),
            (TimeTrackingError::NoActiveSession, StatusCode::NOT_FOUND),
            (TimeTrackingError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (TimeTrackingError::invalid_interval("x"), StatusCode::BAD_REQUEST),
            (TimeTrackingError::InvalidActivity("x".into()), StatusCode::BAD_REQUEST),
            (TimeTrackingError::EditWindowExpired, StatusCode::FORBIDDEN),
            (TimeTrackingError::Forbidden, StatusCode::FORBIDDEN),
            (
                TimeTrackingError::StoreUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                TimeTrackingError::Store("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn codes_serialize_screaming_snake_case() {
        let json = serde_json::to_value(ErrorCode::EditWindowExpired).unwrap();
        assert_eq!(json, "EDIT_WINDOW_EXPIRED");
    }
}

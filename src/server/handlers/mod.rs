pub mod auth;
pub mod meetings;
pub mod notifications;
pub mod schedules;
pub mod users;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::scheduling::SchedulingError;

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

/// Standard error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

/// `{"error": ...}` with the given status
pub fn error_response(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(msg))).into_response()
}

/// Log a store failure and answer 500
pub fn internal_error(error: impl std::fmt::Display) -> Response {
    tracing::error!("Request failed: {:#}", error);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

impl IntoResponse for SchedulingError {
    fn into_response(self) -> Response {
        let status = match &self {
            SchedulingError::NoParticipants
            | SchedulingError::InvalidDuration(_)
            | SchedulingError::InvalidTimeRange
            | SchedulingError::MissingTitle
            | SchedulingError::NotIfNeeded(_) => StatusCode::BAD_REQUEST,
            SchedulingError::NotParticipant | SchedulingError::NotOrganizer => {
                StatusCode::FORBIDDEN
            }
            SchedulingError::MeetingNotFound => StatusCode::NOT_FOUND,
            SchedulingError::MeetingCancelled => StatusCode::CONFLICT,
            SchedulingError::Store(e) => return internal_error(e),
        };
        error_response(status, self.to_string())
    }
}

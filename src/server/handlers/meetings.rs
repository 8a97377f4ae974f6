use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::{error_response, internal_error, SuccessResponse};
use crate::models::{MeetingDraft, RespondRequest, SuggestRequest};
use crate::scheduling::{clock, SchedulingError};
use crate::server::middleware::AuthenticatedUser;
use crate::server::AppState;

/// Rank the best start times for a group on one day
pub async fn suggest(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SuggestRequest>,
) -> Response {
    let date = match clock::parse_meeting_date(&req.meeting_date) {
        Ok(date) => date,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match state
        .scheduler
        .suggest_times(&req.participants, date, req.duration)
        .await
    {
        Ok(suggestions) => Json(suggestions).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Book a meeting organized by the caller
pub async fn create_meeting(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Json(draft): Json<MeetingDraft>,
) -> Response {
    match state.scheduler.commit_meeting(&user.email, draft).await {
        Ok(meeting) => (StatusCode::CREATED, Json(meeting)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Meetings the caller organizes or is invited to
pub async fn list_meetings(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Response {
    match state
        .scheduler
        .meetings()
        .list_for_participant(&user.email)
        .await
    {
        Ok(meetings) => Json(meetings).into_response(),
        Err(e) => internal_error(e),
    }
}

pub async fn get_meeting(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Response {
    match state.scheduler.meetings().get_by_id(&id).await {
        Ok(Some(meeting)) if meeting.involves(&user.email) => Json(meeting).into_response(),
        Ok(Some(_)) => SchedulingError::NotParticipant.into_response(),
        Ok(None) => SchedulingError::MeetingNotFound.into_response(),
        Err(e) => internal_error(e),
    }
}

/// Accept or reject an invitation the caller was only if-needed for
pub async fn respond_to_meeting(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(req): Json<RespondRequest>,
) -> Response {
    match state
        .scheduler
        .respond_to_meeting(&id, &user.email, req.response)
        .await
    {
        Ok(meeting) => Json(meeting).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Cancel a meeting the caller organizes
pub async fn cancel_meeting(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Response {
    match state.scheduler.cancel_meeting(&id, &user.email).await {
        Ok(_) => Json(SuccessResponse::new("Meeting deleted successfully")).into_response(),
        Err(e) => e.into_response(),
    }
}

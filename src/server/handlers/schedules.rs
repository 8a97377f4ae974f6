use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{error_response, internal_error};
use crate::models::AvailabilityGrid;
use crate::scheduling::{dedup_emails, UserGrid};
use crate::server::middleware::AuthenticatedUser;
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub user_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub schedule: AvailabilityGrid,
}

impl From<UserGrid> for ScheduleResponse {
    fn from(user: UserGrid) -> Self {
        Self {
            user_email: user.email,
            name: user.name,
            schedule: user.grid,
        }
    }
}

#[derive(Deserialize)]
pub struct UpdateScheduleRequest {
    pub schedule: AvailabilityGrid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSchedulesRequest {
    pub user_emails: Vec<String>,
}

/// A single user's weekly grid
pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Response {
    match state.scheduler.schedules().get_grids(&[email]).await {
        Ok(mut grids) if !grids.is_empty() => {
            Json(ScheduleResponse::from(grids.swap_remove(0))).into_response()
        }
        Ok(_) => error_response(StatusCode::NOT_FOUND, "Schedule not found for this user"),
        Err(e) => internal_error(e),
    }
}

/// Replace the caller's own grid
pub async fn update_schedule(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(email): Path<String>,
    Json(req): Json<UpdateScheduleRequest>,
) -> Response {
    if email != user.email {
        return error_response(StatusCode::FORBIDDEN, "You can only update your own schedule");
    }

    match state.scheduler.replace_grid(&user.email, &req.schedule).await {
        Ok(schedule) => {
            tracing::info!("Updated schedule for {}", user.email);
            Json(ScheduleResponse {
                user_email: user.email,
                name: Some(user.name),
                schedule,
            })
            .into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Grids for several users; unknown emails are left out
pub async fn batch_schedules(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchSchedulesRequest>,
) -> Response {
    let emails = dedup_emails(req.user_emails.iter().map(String::as_str));
    if emails.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "User emails array is required");
    }

    match state.scheduler.schedules().get_grids(&emails).await {
        Ok(grids) => {
            tracing::debug!("Found schedules for {} of {} users", grids.len(), emails.len());
            let schedules: Vec<ScheduleResponse> =
                grids.into_iter().map(ScheduleResponse::from).collect();
            Json(schedules).into_response()
        }
        Err(e) => internal_error(e),
    }
}

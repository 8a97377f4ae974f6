use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream::Stream;
use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use super::{error_response, internal_error, SuccessResponse};
use crate::server::middleware::AuthenticatedUser;
use crate::server::AppState;

/// How often the stream checks for new notifications
const STREAM_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// The caller's notifications, newest first
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Response {
    match state.db.list_notifications(&user.email) {
        Ok(notifications) => Json(notifications).into_response(),
        Err(e) => internal_error(e),
    }
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Response {
    match state.db.mark_notification_read(&user.email, &id) {
        Ok(true) => Json(SuccessResponse::new("Notification marked as read")).into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Notification not found"),
        Err(e) => internal_error(e),
    }
}

pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Response {
    match state.db.mark_all_notifications_read(&user.email) {
        Ok(count) => Json(SuccessResponse::new(format!(
            "{} notification(s) marked as read",
            count
        )))
        .into_response(),
        Err(e) => internal_error(e),
    }
}

pub async fn clear_notifications(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Response {
    match state.db.clear_notifications(&user.email) {
        Ok(count) => {
            tracing::info!("Cleared {} notification(s) for {}", count, user.email);
            Json(SuccessResponse::new("Notifications cleared")).into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// Stream new unread notifications via SSE
pub async fn stream_notifications(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let email = user.email;
    let db = state.db.clone();

    // Only notifications arriving after the stream opens are pushed
    let mut seen_ids: HashSet<String> = db
        .list_unread_notifications(&email)
        .map(|existing| existing.into_iter().map(|n| n.id).collect())
        .unwrap_or_default();

    let stream = async_stream::stream! {
        let mut interval = tokio::time::interval(STREAM_POLL_INTERVAL);

        loop {
            interval.tick().await;

            let unread = match db.list_unread_notifications(&email) {
                Ok(unread) => unread,
                Err(e) => {
                    tracing::warn!("Notification poll failed for {}: {}", email, e);
                    continue;
                }
            };

            for notification in unread {
                if !seen_ids.insert(notification.id.clone()) {
                    continue;
                }
                if let Ok(json) = serde_json::to_string(&notification) {
                    yield Ok(Event::default().event("notification").data(json));
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

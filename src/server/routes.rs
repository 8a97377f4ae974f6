use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::middleware::auth_middleware;
use super::AppState;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/register", post(handlers::auth::register));

    // Protected routes (require API key)
    let protected_routes = Router::new()
        // Users
        .route("/v1/users", get(handlers::users::list_users))
        .route("/v1/users/me", get(handlers::users::current_user))
        // Schedules
        .route(
            "/v1/schedules/batch",
            post(handlers::schedules::batch_schedules),
        )
        .route(
            "/v1/schedules/:email",
            get(handlers::schedules::get_schedule).put(handlers::schedules::update_schedule),
        )
        // Meetings
        .route("/v1/meetings/suggest", post(handlers::meetings::suggest))
        .route(
            "/v1/meetings",
            get(handlers::meetings::list_meetings).post(handlers::meetings::create_meeting),
        )
        .route(
            "/v1/meetings/:id",
            get(handlers::meetings::get_meeting).delete(handlers::meetings::cancel_meeting),
        )
        .route(
            "/v1/meetings/:id/respond",
            post(handlers::meetings::respond_to_meeting),
        )
        // Notifications
        .route(
            "/v1/notifications",
            get(handlers::notifications::list_notifications)
                .delete(handlers::notifications::clear_notifications),
        )
        .route(
            "/v1/notifications/read-all",
            post(handlers::notifications::mark_all_read),
        )
        .route(
            "/v1/notifications/stream",
            get(handlers::notifications::stream_notifications),
        )
        .route(
            "/v1/notifications/:id/read",
            post(handlers::notifications::mark_read),
        )
        // API key rotation
        .route("/auth/key/rotate", post(handlers::auth::rotate_api_key))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

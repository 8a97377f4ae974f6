use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::AppState;
use crate::models::User;

/// Extension for authenticated user
#[derive(Clone)]
pub struct AuthenticatedUser(pub User);

/// API key authentication middleware
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let api_key = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let user = state
        .db
        .find_user_by_api_key(api_key)
        .map_err(|e| {
            tracing::error!("API key lookup failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    tracing::debug!(user = %user.email, "Authenticated request");
    request.extensions_mut().insert(AuthenticatedUser(user));

    Ok(next.run(request).await)
}

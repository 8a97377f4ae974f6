use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::{error_response, internal_error};
use crate::crypto::{generate_api_key, hash_api_key};
use crate::models::User;
use crate::server::middleware::AuthenticatedUser;
use crate::server::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub team: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: String,
    pub api_key: String,
}

/// Register a new user; they start with an empty schedule
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Response {
    let email = req.email.trim().to_string();
    let name = req.name.trim();
    if email.is_empty() || !email.contains('@') || name.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Name and email are required");
    }

    match state.db.get_user_by_email(&email) {
        Ok(Some(_)) => {
            return error_response(StatusCode::CONFLICT, "A user with this email already exists")
        }
        Ok(None) => {}
        Err(e) => return internal_error(e),
    }

    let api_key = generate_api_key();
    let api_key_hash = match hash_api_key(&api_key) {
        Ok(h) => h,
        Err(e) => return internal_error(e),
    };

    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        name: name.to_string(),
        team: req.team.filter(|t| !t.trim().is_empty()),
        api_key_hash,
        created_at: Utc::now().timestamp(),
    };

    if let Err(e) = state.db.create_user(&user) {
        return internal_error(e);
    }
    tracing::info!("Registered user {}", user.email);

    (
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id,
            api_key,
        }),
    )
        .into_response()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotateKeyResponse {
    pub api_key: String,
}

/// Rotate API key
pub async fn rotate_api_key(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Response {
    let api_key = generate_api_key();
    let api_key_hash = match hash_api_key(&api_key) {
        Ok(h) => h,
        Err(e) => return internal_error(e),
    };

    if let Err(e) = state.db.update_user_api_key_hash(&user.id, &api_key_hash) {
        return internal_error(e);
    }
    tracing::info!("Rotated API key for {}", user.email);

    Json(RotateKeyResponse { api_key }).into_response()
}

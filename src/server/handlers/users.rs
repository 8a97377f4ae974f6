use axum::{
    extract::{Extension, State},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::internal_error;
use crate::models::UserInfo;
use crate::server::middleware::AuthenticatedUser;
use crate::server::AppState;

/// Everyone who can be invited
pub async fn list_users(State(state): State<Arc<AppState>>) -> Response {
    match state.db.list_users() {
        Ok(users) => {
            let users: Vec<UserInfo> = users.into_iter().map(UserInfo::from).collect();
            Json(users).into_response()
        }
        Err(e) => internal_error(e),
    }
}

pub async fn current_user(
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Json<UserInfo> {
    Json(user.into())
}

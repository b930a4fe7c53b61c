//! Authentication HTTP handlers
//!
//! Thin wrappers over [`AuthService`]: deserialize, call the flow,
//! wrap the result in the success envelope. All failure translation
//! happens in [`AppError`].

use crate::auth::{
    AuthData, AuthService, Identity, LoginRequest, LogoutRequest, Profile, RefreshRequest,
};
use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Success envelope for login and refresh
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthSuccess {
    pub success: bool,
    pub data: AuthData,
}

/// Success envelope carrying only a message (logout)
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Success envelope for the profile endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub data: Profile,
}

/// Admin request to revoke every session of a user
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeSessionsRequest {
    #[serde(default)]
    pub user_id: i64,
}

/// Result of a session revocation
#[derive(Debug, Serialize, Deserialize)]
pub struct RevokeSessionsResponse {
    pub success: bool,
    pub revoked: u64,
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(state.db.clone(), state.config.auth.clone())
}

/// `POST /auth/login`
///
/// Verifies credentials and returns an access/refresh token pair plus
/// the session user. 400 on missing or malformed input, 401 with
/// `INVALID_CREDENTIALS` on any credential mismatch.
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let data = auth_service(&state).login(request).await?;

    Ok(Json(AuthSuccess {
        success: true,
        data,
    }))
}

/// `POST /auth/refresh`
///
/// Exchanges a persisted refresh token for a fresh access token. The
/// refresh token is returned unchanged - sessions are not rotated.
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let data = auth_service(&state).refresh(request).await?;

    Ok(Json(AuthSuccess {
        success: true,
        data,
    }))
}

/// `POST /auth/logout`
///
/// Deletes the refresh token's session row. Requires authentication;
/// succeeds even if the token is no longer in the store.
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<LogoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_service(&state).logout(&identity, request).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Logged out successfully".to_string(),
    }))
}

/// `GET /auth/me`
///
/// Returns the authenticated user's current profile from the store.
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, AppError> {
    let profile = auth_service(&state).current_user(&identity).await?;

    Ok(Json(ProfileResponse {
        success: true,
        data: profile,
    }))
}

/// `POST /auth/sessions/revoke` (Admin only)
///
/// Deletes every refresh-token row of the target user, terminating all
/// of their sessions.
pub async fn revoke_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<RevokeSessionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let revoked = auth_service(&state)
        .revoke_user_sessions(&identity, request.user_id)
        .await?;

    Ok(Json(RevokeSessionsResponse {
        success: true,
        revoked,
    }))
}

//! Authentication service layer
//!
//! Owns the login, refresh, and logout flows: credential verification,
//! token issuance, and the persisted refresh-token session rows.
//!
//! Sessions are multi-device: every login inserts its own refresh-token
//! row, and refresh does NOT rotate - the same refresh token stays valid
//! until logout or revocation. A refresh exchange always re-reads the
//! user row so role and tenant claims reflect the current state.

use crate::audit::{audit_log, AuditEvent};
use crate::auth::jwt;
use crate::auth::models::Identity;
use crate::auth::password::verify_password;
use crate::auth::repository::{RefreshTokenRepository, UserRepository};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use orgadmin_core::AuthConfig;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Login request body
///
/// Fields default to empty so that a missing field and an empty one are
/// rejected the same way, through our own envelope rather than a
/// deserialization error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Token refresh request body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// Logout request body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// Token pair plus the session's user, as returned by login and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    pub access_token: String,
    pub refresh_token: String,
    pub user: SessionUser,
}

/// The user summary embedded in auth responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub email: String,
    pub role: String,
}

/// Profile returned by `GET /auth/me`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub company_id: i64,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    tokens: RefreshTokenRepository,
    auth: AuthConfig,
}

impl AuthService {
    pub fn new(pool: PgPool, auth: AuthConfig) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            tokens: RefreshTokenRepository::new(pool),
            auth,
        }
    }

    /// Login with email and password
    ///
    /// Unknown email, deactivated account, and wrong password all
    /// produce the identical `INVALID_CREDENTIALS` response so the
    /// endpoint cannot be used to enumerate accounts.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthData, AppError> {
        if request.email.is_empty() || request.password.is_empty() {
            tracing::warn!(email = %request.email, "login attempt with missing credentials");
            return Err(AppError::bad_request(
                "MISSING_CREDENTIALS",
                "Email and password are required",
            ));
        }

        if !request.email.contains('@') {
            tracing::warn!(email = %request.email, "login attempt with invalid email format");
            return Err(AppError::bad_request("INVALID_EMAIL", "Invalid email format"));
        }

        audit_log(&AuditEvent::LoginAttempt {
            email: request.email.clone(),
        });

        let user = match self.users.find_active_by_email(&request.email).await? {
            Some(user) => user,
            None => {
                audit_log(&AuditEvent::LoginFailure {
                    email: request.email.clone(),
                    reason: "user not found".to_string(),
                });
                return Err(invalid_credentials());
            }
        };

        let password_matches = verify_password(&request.password, &user.password_hash)
            .map_err(|e| AppError::internal(format!("Failed to verify password: {e}")))?;

        if !password_matches {
            audit_log(&AuditEvent::LoginFailure {
                email: request.email.clone(),
                reason: "invalid password".to_string(),
            });
            return Err(invalid_credentials());
        }

        let identity = user.identity();

        let access_token = jwt::issue_access_token(&self.auth, &identity)
            .map_err(|e| AppError::internal(format!("Failed to generate access token: {e}")))?;
        let refresh_token = jwt::issue_refresh_token(&self.auth, user.id)
            .map_err(|e| AppError::internal(format!("Failed to generate refresh token: {e}")))?;

        // The row expiry mirrors the exp claim of the token just issued.
        let claims = jwt::verify_refresh_token(&self.auth, &refresh_token)
            .map_err(|e| AppError::internal(format!("Failed to decode refresh token: {e}")))?;
        let expires_at = epoch_to_datetime(claims.exp)?;

        self.tokens.save(user.id, &refresh_token, expires_at).await?;

        audit_log(&AuditEvent::LoginSuccess {
            user_id: user.id,
            email: user.email.clone(),
        });
        tracing::info!(user_id = user.id, "user logged in");

        Ok(AuthData {
            access_token,
            refresh_token,
            user: SessionUser {
                id: user.id,
                email: user.email,
                role: user.role,
            },
        })
    }

    /// Exchange a refresh token for a new access token
    ///
    /// The refresh token itself is not rotated: the same token and the
    /// same persisted row stay valid until logout. Every failure mode -
    /// bad signature, unknown row, expired row, deactivated user -
    /// surfaces as the same `INVALID_REFRESH_TOKEN` response.
    pub async fn refresh(&self, request: RefreshRequest) -> Result<AuthData, AppError> {
        if request.refresh_token.is_empty() {
            return Err(AppError::bad_request(
                "MISSING_REFRESH_TOKEN",
                "Refresh token is required",
            ));
        }

        jwt::verify_refresh_token(&self.auth, &request.refresh_token)
            .map_err(|_| invalid_refresh_token())?;

        let record = self
            .tokens
            .find(&request.refresh_token)
            .await?
            .ok_or_else(invalid_refresh_token)?;

        if record.is_expired() {
            // Expired rows are dead weight; drop them on sight.
            self.tokens.delete(&request.refresh_token).await?;
            return Err(invalid_refresh_token());
        }

        // Re-derive role and tenant from the current user row; a role
        // change or deactivation since login must show up here.
        let user = self
            .users
            .find_active_by_id(record.user_id)
            .await?
            .ok_or_else(invalid_refresh_token)?;

        let access_token = jwt::issue_access_token(&self.auth, &user.identity())
            .map_err(|e| AppError::internal(format!("Failed to generate access token: {e}")))?;

        audit_log(&AuditEvent::TokenRefresh { user_id: user.id });
        tracing::debug!(user_id = user.id, "access token refreshed");

        Ok(AuthData {
            access_token,
            refresh_token: request.refresh_token,
            user: SessionUser {
                id: user.id,
                email: user.email,
                role: user.role,
            },
        })
    }

    /// Logout by deleting the refresh token's session row
    ///
    /// Idempotent: logging out with a token that is not in the store
    /// still succeeds. The access token stays valid until it expires.
    pub async fn logout(&self, identity: &Identity, request: LogoutRequest) -> Result<(), AppError> {
        if request.refresh_token.is_empty() {
            tracing::warn!(user_id = identity.id, "logout attempt without refresh token");
            return Err(AppError::bad_request(
                "MISSING_REFRESH_TOKEN",
                "Refresh token is required",
            ));
        }

        self.tokens.delete(&request.refresh_token).await?;

        audit_log(&AuditEvent::Logout {
            user_id: identity.id,
        });
        tracing::info!(user_id = identity.id, "user logged out");

        Ok(())
    }

    /// Delete every session of a user (admin operation)
    ///
    /// Returns the number of revoked sessions; revoking a user with no
    /// sessions is not an error.
    pub async fn revoke_user_sessions(
        &self,
        admin: &Identity,
        user_id: i64,
    ) -> Result<u64, AppError> {
        if user_id <= 0 {
            return Err(AppError::bad_request("INVALID_USER_ID", "Invalid user id"));
        }

        let count = self.tokens.delete_all_for_user(user_id).await?;

        audit_log(&AuditEvent::SessionsRevoked {
            user_id,
            revoked_by: admin.id,
            count,
        });
        tracing::info!(user_id, revoked_by = admin.id, count, "user sessions revoked");

        Ok(count)
    }

    /// Load the authenticated user's profile
    pub async fn current_user(&self, identity: &Identity) -> Result<Profile, AppError> {
        let user = self
            .users
            .find_active_by_id(identity.id)
            .await?
            .ok_or_else(|| AppError::not_found("USER_NOT_FOUND", "User not found"))?;

        Ok(Profile {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            company_id: user.company_id,
        })
    }
}

fn invalid_credentials() -> AppError {
    AppError::unauthorized("INVALID_CREDENTIALS", "Invalid credentials")
}

fn invalid_refresh_token() -> AppError {
    AppError::unauthorized("INVALID_REFRESH_TOKEN", "Invalid refresh token")
}

fn epoch_to_datetime(secs: u64) -> Result<DateTime<Utc>, AppError> {
    DateTime::<Utc>::from_timestamp(secs as i64, 0)
        .ok_or_else(|| AppError::internal("Token expiry out of range"))
}

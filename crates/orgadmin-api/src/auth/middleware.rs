//! Request authentication and role-based authorization middleware
//!
//! `authenticate` validates the bearer access token and attaches the
//! decoded [`Identity`] to request extensions - the only place identity
//! context is populated. `require_roles` is a middleware factory gating
//! a route on a static role allow-list; it must be layered inside
//! `authenticate`.
//!
//! Both take their configuration (secrets, bypass flag) from
//! [`AppState`] injected at construction time; nothing is read from the
//! environment during request handling.

use crate::audit::{audit_log, AuditEvent};
use crate::auth::jwt::{self, JwtError};
use crate::auth::models::{Identity, UserRole};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// The identity injected when the development bypass is active
fn mock_identity() -> Identity {
    Identity {
        id: 1,
        role: UserRole::Admin.as_str().to_string(),
        company_id: 1,
    }
}

/// Authentication middleware
///
/// Per request: extract the `Authorization` header, validate the bearer
/// token's signature and expiry against the access-token secret, and
/// insert the resulting [`Identity`] into request extensions.
///
/// Failure codes, in order of detection: `TOKEN_MISSING` (no header),
/// `INVALID_TOKEN_FORMAT` (no token after the scheme), `TOKEN_EXPIRED`,
/// `INVALID_TOKEN` (any other verification failure).
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();

    if state.auth_bypass {
        tracing::warn!(path = %path, "authentication disabled - using mock identity");
        audit_log(&AuditEvent::AuthBypassed { path });
        request.extensions_mut().insert(mock_identity());
        return Ok(next.run(request).await);
    }

    let auth_header = match request.headers().get(header::AUTHORIZATION) {
        Some(value) => value,
        None => {
            tracing::warn!(path = %path, "missing authentication token");
            audit_log(&AuditEvent::InvalidToken {
                reason: "missing Authorization header".to_string(),
                path,
            });
            return Err(AppError::unauthorized("TOKEN_MISSING", "Token missing"));
        }
    };

    let token = auth_header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty());

    let token = match token {
        Some(token) => token,
        None => {
            tracing::warn!(path = %path, "invalid authorization header format");
            audit_log(&AuditEvent::InvalidToken {
                reason: "malformed Authorization header".to_string(),
                path,
            });
            return Err(AppError::unauthorized(
                "INVALID_TOKEN_FORMAT",
                "Invalid token format",
            ));
        }
    };

    let claims = match jwt::verify_access_token(&state.config.auth, token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "token verification failed");
            audit_log(&AuditEvent::InvalidToken {
                reason: e.to_string(),
                path,
            });
            return Err(match e {
                JwtError::Expired => AppError::unauthorized("TOKEN_EXPIRED", "Token expired"),
                _ => AppError::unauthorized("INVALID_TOKEN", "Invalid token"),
            });
        }
    };

    let identity = Identity::from(claims);
    if identity.id <= 0 {
        // Signed by us, so the subject is always numeric; anything else
        // is a foreign or tampered token.
        audit_log(&AuditEvent::InvalidToken {
            reason: "non-numeric subject claim".to_string(),
            path,
        });
        return Err(AppError::unauthorized("INVALID_TOKEN", "Invalid token"));
    }

    tracing::debug!(user_id = identity.id, "token verified");
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

type RoleCheckFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>;

/// Middleware factory for role-based access control
///
/// The allow-list is fixed at route-registration time. An identity
/// whose role is not a member is rejected with 403 `INSUFFICIENT_ROLE`;
/// a request that reaches the gate without an identity (the authorizer
/// was layered without - or outside - the authenticator) is rejected
/// with 401 `USER_NOT_FOUND`.
///
/// # Example
///
/// ```ignore
/// let admin_routes = Router::new()
///     .route("/auth/sessions/revoke", post(revoke_sessions_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), require_roles(&["Admin"])))
///     .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));
/// ```
pub fn require_roles(
    allowed: &'static [&'static str],
) -> impl Fn(State<Arc<AppState>>, Request<Body>, Next) -> RoleCheckFuture + Clone {
    move |State(state): State<Arc<AppState>>, request: Request<Body>, next: Next| {
        Box::pin(async move {
            let path = request.uri().path().to_string();

            if state.auth_bypass {
                tracing::debug!(path = %path, "authorization disabled - all roles allowed");
                return Ok(next.run(request).await);
            }

            let identity = match request.extensions().get::<Identity>() {
                Some(identity) => identity.clone(),
                None => {
                    tracing::warn!(path = %path, "no identity in authorize middleware");
                    return Err(AppError::unauthorized("USER_NOT_FOUND", "Unauthorized"));
                }
            };

            if !allowed.contains(&identity.role.as_str()) {
                audit_log(&AuditEvent::AccessDenied {
                    user_id: identity.id,
                    role: identity.role.clone(),
                    required: allowed.join(","),
                    path,
                });
                return Err(AppError::forbidden(
                    "INSUFFICIENT_ROLE",
                    "You do not have permission to access this resource",
                ));
            }

            tracing::debug!(user_id = identity.id, role = %identity.role, "user authorized");
            Ok(next.run(request).await)
        })
    }
}

//! API route definitions
//!
//! The pipeline per protected request is authenticate, then authorize,
//! then handle: `route_layer` ordering below puts the authenticator
//! outside the role gate.

use crate::auth::middleware::{authenticate, require_roles};
use crate::auth::UserRole;
use crate::handlers::auth;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Routes that may only be invoked by administrators
pub const ADMIN_ONLY: &[&str] = &[UserRole::Admin.as_str()];

/// Create the API routes
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/refresh", post(auth::refresh_handler));

    // Admin-only routes, role-gated on top of authentication
    let admin_routes = Router::new()
        .route("/auth/sessions/revoke", post(auth::revoke_sessions_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_roles(ADMIN_ONLY),
        ));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/me", get(auth::me_handler))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state, authenticate));

    Router::new().merge(public_routes).merge(protected_routes)
}

//! Authentication and authorization
//!
//! The auth core of the backend:
//! - JWT issuance and verification (separate access/refresh secrets)
//! - Password hashing with Argon2
//! - Request authentication and role-gating middleware
//! - The login/refresh/logout service flows
//! - Repositories for users and the refresh-token store

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;

pub use jwt::{
    issue_access_token, issue_refresh_token, verify_access_token, verify_refresh_token,
    AccessClaims, JwtError, RefreshClaims,
};
pub use middleware::{authenticate, require_roles};
pub use models::{Identity, RefreshTokenRecord, UserRecord, UserRole};
pub use password::{hash_password, validate_password_strength, verify_password};
pub use repository::{RefreshTokenRepository, RepositoryError, UserRepository};
pub use service::{
    AuthData, AuthService, LoginRequest, LogoutRequest, Profile, RefreshRequest, SessionUser,
};

//! Data models for authentication and authorization
//!
//! - `Identity`: the authenticated principal attached to a request
//! - `UserRole`: the known role names of the master-data schema
//! - `UserRecord`: the collaborator view of a persisted user
//! - `RefreshTokenRecord`: a persisted refresh-token row

use crate::auth::jwt::AccessClaims;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role names known to the system
///
/// Roles are master data; these are the names seeded by default.
/// Allow-lists and claims work on the string form, so an unrecognized
/// role name in the database still flows through without breaking
/// verification - it simply matches no allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    Manager,
    Viewer,
}

impl UserRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Manager => "Manager",
            UserRole::Viewer => "Viewer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Admin" => Some(UserRole::Admin),
            "Manager" => Some(UserRole::Manager),
            "Viewer" => Some(UserRole::Viewer),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The authenticated principal for one request
///
/// Populated exclusively by the request authenticator from verified
/// access-token claims, and immutable for the request's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// User id
    pub id: i64,
    /// Role name (e.g. "Admin")
    pub role: String,
    /// Owning company id (tenant scope)
    pub company_id: i64,
}

impl From<AccessClaims> for Identity {
    fn from(claims: AccessClaims) -> Self {
        Self {
            // A non-numeric subject can only come from a foreign token;
            // the authenticator rejects id 0 after conversion.
            id: claims.sub.parse().unwrap_or(0),
            role: claims.role,
            company_id: claims.company_id,
        }
    }
}

/// Persisted user as seen by the auth core
///
/// The role name is joined in from the roles table; lookups used for
/// login and refresh return active rows only.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
}

impl UserRecord {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            role: self.role.clone(),
            company_id: self.company_id,
        }
    }
}

/// A persisted refresh-token row
///
/// Exactly one row exists per active refresh token; the token value is
/// unique across all rows. Rows are deleted at logout or revocation,
/// never updated.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_conversion() {
        assert_eq!(UserRole::Admin.as_str(), "Admin");
        assert_eq!(UserRole::parse("Manager"), Some(UserRole::Manager));
        assert_eq!(UserRole::parse("manager"), None);
        assert_eq!(UserRole::parse("Root"), None);
        assert_eq!(UserRole::Viewer.to_string(), "Viewer");
    }

    #[test]
    fn test_identity_from_claims() {
        let claims = AccessClaims {
            iss: "orgadmin-api".to_string(),
            sub: "17".to_string(),
            iat: 1000,
            exp: 2000,
            role: "Admin".to_string(),
            company_id: 3,
        };

        let identity = Identity::from(claims);
        assert_eq!(identity.id, 17);
        assert_eq!(identity.role, "Admin");
        assert_eq!(identity.company_id, 3);
    }

    #[test]
    fn test_identity_from_claims_bad_subject() {
        let claims = AccessClaims {
            iss: "orgadmin-api".to_string(),
            sub: "not-a-number".to_string(),
            iat: 1000,
            exp: 2000,
            role: "Viewer".to_string(),
            company_id: 1,
        };

        assert_eq!(Identity::from(claims).id, 0);
    }

    #[test]
    fn test_refresh_record_expiry() {
        let mut record = RefreshTokenRecord {
            id: 1,
            user_id: 42,
            token: "tok".to_string(),
            expires_at: Utc::now() + chrono::Duration::days(7),
            created_at: Utc::now(),
        };
        assert!(!record.is_expired());

        record.expires_at = Utc::now() - chrono::Duration::seconds(1);
        assert!(record.is_expired());
    }
}

//! JWT token issuance and verification
//!
//! Two token classes, each signed with its own HMAC-SHA256 secret:
//!
//! - Access tokens carry the full identity (user id, role, tenant) and
//!   are verified statelessly on every request.
//! - Refresh tokens carry only the user id. Role and tenant are
//!   deliberately left out so that a refresh exchange always re-derives
//!   them from the current user record.

use crate::auth::models::Identity;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use orgadmin_core::AuthConfig;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Claims embedded in an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Token issuer
    pub iss: String,
    /// Subject - user id
    pub sub: String,
    /// Issued at (Unix epoch seconds)
    pub iat: u64,
    /// Expiration (Unix epoch seconds)
    pub exp: u64,
    /// Role name (e.g. "Admin")
    pub role: String,
    /// Owning company id (tenant scope)
    pub company_id: i64,
}

/// Claims embedded in a refresh token
///
/// Only the subject. Anything else would go stale over the token's
/// week-long lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub iss: String,
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
}

/// Token issuance and verification errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token")]
    Invalid,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Identity has no valid user id")]
    InvalidUser,

    #[error("System time error: {0}")]
    SystemTime(#[from] std::time::SystemTimeError),
}

fn now_epoch_secs() -> Result<u64, JwtError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Issue an access token for an authenticated identity
///
/// Claims carry the identity's id, role, and company id, signed with the
/// access-token secret. Fails with [`JwtError::InvalidUser`] if the
/// identity's id is not positive.
pub fn issue_access_token(config: &AuthConfig, identity: &Identity) -> Result<String, JwtError> {
    if identity.id <= 0 {
        return Err(JwtError::InvalidUser);
    }

    let now = now_epoch_secs()?;
    let claims = AccessClaims {
        iss: config.issuer.clone(),
        sub: identity.id.to_string(),
        iat: now,
        exp: now + config.access_expiry_secs,
        role: identity.role.clone(),
        company_id: identity.company_id,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.access_secret.as_bytes()),
    )?;

    Ok(token)
}

/// Issue a refresh token for a user id
///
/// Signed with the refresh-token secret, which is distinct from the
/// access secret: compromise of one token class must not allow forging
/// the other.
pub fn issue_refresh_token(config: &AuthConfig, user_id: i64) -> Result<String, JwtError> {
    if user_id <= 0 {
        return Err(JwtError::InvalidUser);
    }

    let now = now_epoch_secs()?;
    let claims = RefreshClaims {
        iss: config.issuer.clone(),
        sub: user_id.to_string(),
        iat: now,
        exp: now + config.refresh_expiry_secs,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.refresh_secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify an access token and extract its claims
///
/// Distinguishes expiry from every other verification failure so callers
/// can surface `TOKEN_EXPIRED` instead of a generic invalid-token error.
pub fn verify_access_token(config: &AuthConfig, token: &str) -> Result<AccessClaims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);

    let token_data = decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(config.access_secret.as_bytes()),
        &validation,
    )
    .map_err(map_decode_error)?;

    Ok(token_data.claims)
}

/// Verify a refresh token and extract its claims
pub fn verify_refresh_token(config: &AuthConfig, token: &str) -> Result<RefreshClaims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);

    let token_data = decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(config.refresh_secret.as_bytes()),
        &validation,
    )
    .map_err(map_decode_error)?;

    Ok(token_data.claims)
}

fn map_decode_error(e: jsonwebtoken::errors::Error) -> JwtError {
    match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        _ => JwtError::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig::default()
    }

    fn test_identity() -> Identity {
        Identity {
            id: 42,
            role: "Manager".to_string(),
            company_id: 7,
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let config = test_config();
        let identity = test_identity();

        let token = issue_access_token(&config, &identity).expect("failed to issue token");
        let claims = verify_access_token(&config, &token).expect("failed to verify token");

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, "Manager");
        assert_eq!(claims.company_id, 7);
        assert_eq!(claims.iss, config.issuer);
        assert_eq!(claims.exp, claims.iat + config.access_expiry_secs);
    }

    #[test]
    fn test_refresh_token_carries_only_subject() {
        let config = test_config();

        let token = issue_refresh_token(&config, 42).unwrap();
        let claims = verify_refresh_token(&config, &token).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.exp, claims.iat + config.refresh_expiry_secs);

        // The payload must not leak role or tenant.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        let raw = decode::<serde_json::Value>(
            &token,
            &DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            &validation,
        )
        .unwrap();
        assert!(raw.claims.get("role").is_none());
        assert!(raw.claims.get("company_id").is_none());
    }

    #[test]
    fn test_invalid_user_id_rejected() {
        let config = test_config();
        let identity = Identity {
            id: 0,
            role: "Admin".to_string(),
            company_id: 1,
        };

        assert!(matches!(
            issue_access_token(&config, &identity),
            Err(JwtError::InvalidUser)
        ));
        assert!(matches!(
            issue_refresh_token(&config, -3),
            Err(JwtError::InvalidUser)
        ));
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let config = test_config();
        let other = AuthConfig {
            access_secret: "a-completely-different-secret".to_string(),
            ..AuthConfig::default()
        };

        let token = issue_access_token(&config, &test_identity()).unwrap();
        let result = verify_access_token(&other, &token);

        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_refresh_token_rejected_by_access_verifier() {
        // Separate secrets per token class: a refresh token must never
        // pass access-token verification.
        let config = test_config();
        let refresh = issue_refresh_token(&config, 42).unwrap();

        assert!(verify_access_token(&config, &refresh).is_err());
    }

    #[test]
    fn test_expired_token_reported_as_expired() {
        let config = test_config();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        // Expired two hours ago, well past any validation leeway.
        let claims = AccessClaims {
            iss: config.issuer.clone(),
            sub: "42".to_string(),
            iat: now - 10_800,
            exp: now - 7_200,
            role: "Viewer".to_string(),
            company_id: 1,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.access_secret.as_bytes()),
        )
        .unwrap();

        let result = verify_access_token(&config, &token);
        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        let config = test_config();
        let result = verify_access_token(&config, "not.a.token");
        assert!(result.is_err());
        assert!(!matches!(result, Err(JwtError::Expired)));
    }
}

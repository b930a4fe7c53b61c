//! Security audit logging for authentication decisions
//!
//! Every auth decision - login attempt, success, failure, token
//! issuance and refresh, logout, authorization denial, bypass - emits a
//! typed event, logged at INFO with the dedicated "audit" target so
//! security tooling can route it separately from application logs. The
//! full event is serialized to JSON for log aggregators.

use serde::{Deserialize, Serialize};
use tracing::info;

/// Audit events emitted by the auth core
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Login request received, before any validation
    LoginAttempt { email: String },

    /// Credentials verified and tokens issued
    LoginSuccess { user_id: i64, email: String },

    /// Login rejected
    LoginFailure { email: String, reason: String },

    /// Refresh token deleted at the user's request
    Logout { user_id: i64 },

    /// Access token re-issued from a refresh token
    TokenRefresh { user_id: i64 },

    /// Authenticated identity lacked a required role
    AccessDenied {
        user_id: i64,
        role: String,
        required: String,
        path: String,
    },

    /// A request carried a missing, malformed, expired, or invalid token
    InvalidToken { reason: String, path: String },

    /// The development bypass short-circuited authentication
    AuthBypassed { path: String },

    /// An administrator revoked every session of a user
    SessionsRevoked {
        user_id: i64,
        revoked_by: i64,
        count: u64,
    },
}

impl AuditEvent {
    fn summary(&self) -> &'static str {
        match self {
            AuditEvent::LoginAttempt { .. } => "Login attempt",
            AuditEvent::LoginSuccess { .. } => "Login successful",
            AuditEvent::LoginFailure { .. } => "Login failed",
            AuditEvent::Logout { .. } => "User logged out",
            AuditEvent::TokenRefresh { .. } => "Access token refreshed",
            AuditEvent::AccessDenied { .. } => "Access denied",
            AuditEvent::InvalidToken { .. } => "Invalid token",
            AuditEvent::AuthBypassed { .. } => "Authentication bypassed",
            AuditEvent::SessionsRevoked { .. } => "User sessions revoked",
        }
    }
}

/// Log an audit event
pub fn audit_log(event: &AuditEvent) {
    let payload = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"failed to serialize audit event: {e}\"}}"));

    info!(target: "audit", event = %payload, "{}", event.summary());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_tags() {
        let event = AuditEvent::LoginFailure {
            email: "a@x.com".to_string(),
            reason: "invalid password".to_string(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "login_failure");
        assert_eq!(json["email"], "a@x.com");
        assert_eq!(json["reason"], "invalid password");
    }

    #[test]
    fn test_access_denied_carries_context() {
        let event = AuditEvent::AccessDenied {
            user_id: 5,
            role: "Viewer".to_string(),
            required: "Admin".to_string(),
            path: "/auth/sessions/revoke".to_string(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "access_denied");
        assert_eq!(json["user_id"], 5);
        assert_eq!(json["required"], "Admin");
    }
}

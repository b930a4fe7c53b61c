//! Database access for authentication entities
//!
//! Two repositories over the shared PostgreSQL pool:
//! - `UserRepository`: read-only lookups of active users (role name
//!   joined in from the roles table)
//! - `RefreshTokenRepository`: the refresh-token store - insert, lookup
//!   by token value, and idempotent delete
//!
//! Absence is modeled as `Ok(None)`; a `RepositoryError` always means
//! the storage layer itself failed. Uniqueness of the token value is
//! enforced by the store's unique index, so no application-level locking
//! is needed around insert/delete.

use crate::auth::models::{RefreshTokenRecord, UserRecord};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;

/// Repository errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read-only lookups of persisted users
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an active user by email
    ///
    /// Deactivated users are invisible to the auth core, so a
    /// deactivated account fails login exactly like an unknown one.
    pub async fn find_active_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT u.id, u.company_id, u.name, u.email, u.password_hash,
                   r.name AS role, u.is_active
            FROM users u
            JOIN roles r ON r.id = u.role_id
            WHERE u.email = $1 AND u.is_active = TRUE
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find an active user by id
    ///
    /// Used at refresh time so that role and tenant claims are always
    /// re-derived from the current row, never from stale token claims.
    pub async fn find_active_by_id(
        &self,
        user_id: i64,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT u.id, u.company_id, u.name, u.email, u.password_hash,
                   r.name AS role, u.is_active
            FROM users u
            JOIN roles r ON r.id = u.role_id
            WHERE u.id = $1 AND u.is_active = TRUE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

/// The refresh-token store
#[derive(Clone)]
pub struct RefreshTokenRepository {
    pool: PgPool,
}

impl RefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a newly issued refresh token
    ///
    /// One row per login; concurrent logins from multiple devices each
    /// insert their own row.
    pub async fn save(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO refresh_tokens (user_id, token, expires_at, created_at) \
             VALUES ($1, $2, $3, NOW())",
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Look up a refresh token by its value
    pub async fn find(&self, token: &str) -> Result<Option<RefreshTokenRecord>, RepositoryError> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            "SELECT id, user_id, token, expires_at, created_at \
             FROM refresh_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Delete a refresh token by its value
    ///
    /// Idempotent: deleting a token that is not in the store succeeds.
    pub async fn delete(&self, token: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete every refresh token owned by a user
    ///
    /// Terminates all of the user's sessions at once (admin revocation).
    /// Returns the number of deleted rows.
    pub async fn delete_all_for_user(&self, user_id: i64) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete expired rows (operational cleanup)
    pub async fn delete_expired(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

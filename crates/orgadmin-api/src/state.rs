//! Application state shared across handlers

use orgadmin_core::AppConfig;
use sqlx::PgPool;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Shared application state
///
/// Signing secrets and the bypass decision live here, resolved once at
/// construction - request handling never consults the environment.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Database connection pool
    pub db: PgPool,
    /// Whether the development auth bypass is active. Only ever true in
    /// the development profile; a production config asking for it is
    /// overridden here.
    pub auth_bypass: bool,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: AtomicU64,
}

impl AppState {
    pub fn new(config: AppConfig, db: PgPool) -> Self {
        let auth_bypass = config.auth.disable_auth && config.profile.is_development();

        Self {
            config,
            db,
            auth_bypass,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        }
    }

    /// True when the config requested the bypass but the profile vetoed it
    pub fn bypass_overridden(&self) -> bool {
        self.config.auth.disable_auth && !self.auth_bypass
    }

    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orgadmin_core::Profile;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://orgadmin@localhost:5432/orgadmin_test")
            .expect("lazy pool")
    }

    #[tokio::test]
    async fn test_bypass_honored_in_development() {
        let mut config = AppConfig::default();
        config.auth.disable_auth = true;

        let state = AppState::new(config, lazy_pool());
        assert!(state.auth_bypass);
        assert!(!state.bypass_overridden());
    }

    #[tokio::test]
    async fn test_bypass_vetoed_in_production() {
        let mut config = AppConfig::default();
        config.profile = Profile::Production;
        config.auth.disable_auth = true;

        let state = AppState::new(config, lazy_pool());
        assert!(!state.auth_bypass);
        assert!(state.bypass_overridden());
    }

    #[tokio::test]
    async fn test_request_counter() {
        let state = AppState::new(AppConfig::default(), lazy_pool());
        assert_eq!(state.get_request_count(), 0);
        state.increment_requests();
        state.increment_requests();
        assert_eq!(state.get_request_count(), 2);
    }
}

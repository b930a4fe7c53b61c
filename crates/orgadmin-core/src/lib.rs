//! orgadmin core - configuration and shared types
//!
//! This crate holds the pieces shared by every orgadmin service:
//! - Configuration management (environment + TOML, profile-aware)
//! - The deployment profile type used to guard development-only switches

pub mod config;

pub use config::{
    AppConfig, AuthConfig, ConfigError, DatabaseConfig, LoggingConfig, Profile, ServerConfig,
};

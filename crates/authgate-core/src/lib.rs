//! authgate core - domain models, configuration and credential storage
//!
//! This crate defines the pieces shared by the authgate service:
//! - User and refresh token models
//! - Configuration management
//! - The `CredentialStore` trait and its PostgreSQL implementation
//! - Embedded SQL migrations

pub mod config;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod migrate;
pub mod models;
pub mod postgres;
pub mod store;

pub use config::{AppConfig, AuthConfig, ConfigError, DatabaseConfig, LogFormat, LoggingConfig};
#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryCredentialStore;
pub use models::{NewUser, RefreshTokenRecord, User, UserProfile};
pub use postgres::PgCredentialStore;
pub use store::{CredentialStore, StoreError, StoreResult};

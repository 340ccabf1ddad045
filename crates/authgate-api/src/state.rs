//! Application state management

use crate::auth::jwt::TokenIssuer;
use crate::auth::password::PasswordHasher;
use crate::auth::service::AuthService;
use authgate_core::{AppConfig, CredentialStore};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    pub auth: AuthService,
}

impl AppState {
    /// Wire the auth service from the configuration and a credential store
    pub fn new(config: AppConfig, store: Arc<dyn CredentialStore>) -> Self {
        Self::with_hasher(config, store, PasswordHasher::default())
    }

    pub fn with_hasher(
        config: AppConfig,
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
    ) -> Self {
        let tokens = TokenIssuer::from_config(&config.auth);
        Self {
            config,
            start_time: Instant::now(),
            auth: AuthService::new(store, tokens, hasher),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

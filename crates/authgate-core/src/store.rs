//! Credential store abstraction
//!
//! The auth flows only talk to this trait, so the PostgreSQL store and the
//! in-memory test store are interchangeable.

use crate::models::{NewUser, RefreshTokenRecord, User};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Email already exists")]
    DuplicateEmail,

    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    Database(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Users and their refresh tokens
///
/// Calls are independent; no operation spans a transaction. Rotation is
/// expressed by callers as `delete_refresh_tokens` followed by
/// `insert_refresh_token`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find a user by exact email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Find a user by ID
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Create a user, failing with `DuplicateEmail` on an email collision
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// Replace a user's password hash
    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<User>;

    /// Replace a user's push-notification token
    async fn update_fcm_token(&self, id: Uuid, fcm_token: &str) -> StoreResult<User>;

    /// Delete every refresh token of a user, returning how many were removed
    async fn delete_refresh_tokens(&self, user_id: Uuid) -> StoreResult<u64>;

    /// Persist a refresh token
    async fn insert_refresh_token(&self, record: &RefreshTokenRecord) -> StoreResult<()>;

    /// Find the refresh token record holding exactly this token string
    async fn find_refresh_token(&self, token: &str) -> StoreResult<Option<RefreshTokenRecord>>;

    /// Check store connectivity
    async fn ping(&self) -> StoreResult<()>;
}

//! In-memory credential store
//!
//! Backs the integration tests with the same semantics as the PostgreSQL
//! store: unique emails and independent, non-transactional calls.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{NewUser, RefreshTokenRecord, User};
use crate::store::{CredentialStore, StoreError, StoreResult};

/// In-memory credential store
#[derive(Default)]
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<Uuid, User>>,
    refresh_tokens: RwLock<Vec<RefreshTokenRecord>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All refresh token records currently held for a user
    pub async fn refresh_tokens_for(&self, user_id: Uuid) -> Vec<RefreshTokenRecord> {
        self.refresh_tokens
            .read()
            .await
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Number of stored users
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            display_name: user.display_name,
            fcm_token: None,
            image_url: None,
            phone: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());

        Ok(created)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(StoreError::UserNotFound)?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_fcm_token(&self, id: Uuid, fcm_token: &str) -> StoreResult<User> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(StoreError::UserNotFound)?;
        user.fcm_token = Some(fcm_token.to_string());
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_refresh_tokens(&self, user_id: Uuid) -> StoreResult<u64> {
        let mut tokens = self.refresh_tokens.write().await;
        let before = tokens.len();
        tokens.retain(|r| r.user_id != user_id);
        Ok((before - tokens.len()) as u64)
    }

    async fn insert_refresh_token(&self, record: &RefreshTokenRecord) -> StoreResult<()> {
        self.refresh_tokens.write().await.push(record.clone());
        Ok(())
    }

    async fn find_refresh_token(&self, token: &str) -> StoreResult<Option<RefreshTokenRecord>> {
        let tokens = self.refresh_tokens.read().await;
        Ok(tokens.iter().find(|r| r.token == token).cloned())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

//! Domain models for users and refresh tokens
//!
//! These map to the `users` and `refresh_tokens` tables created by the
//! embedded migrations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// User account record
///
/// Created by registration, mutated by password change and profile updates.
/// Never deleted by the service.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    /// Unique, compared case-sensitively
    pub email: String,
    /// PHC-format password hash, only written by the auth flows
    pub password_hash: String,
    pub display_name: String,
    /// Push-notification token
    pub fcm_token: Option<String>,
    pub image_url: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Public view without credential material
    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            display_name: self.display_name.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
            fcm_token: self.fcm_token.clone(),
            image_url: self.image_url.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Fields required to create a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
}

/// Public user representation (safe for API responses)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub email: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    pub fcm_token: Option<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    pub phone: Option<String>,
}

/// The persisted refresh token of a user
///
/// At most one record exists per user: every credential event deletes the
/// user's records before inserting the new one.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub user_id: Uuid,
    /// Signed token string exactly as handed to the client
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    /// Check if the record is past its expiry
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

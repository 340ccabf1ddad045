//! Authentication service layer
//!
//! Business logic for login, registration, token refresh, password change
//! and the profile operations behind the session middleware.
//!
//! Every credential event (login, registration, password change) rotates the
//! user's refresh token: all stored records for the user are deleted, then
//! the freshly issued token is inserted. The two calls are not wrapped in a
//! transaction. A crash between them leaves the user with no refresh token
//! (forcing a new login); two concurrent logins may race, and either token
//! can end up as the surviving row.
//!
//! The refresh path issues a new access token only and hands the caller's
//! refresh token back unchanged.

use super::jwt::{JwtError, SignedToken, TokenIssuer};
use super::password::{PasswordError, PasswordHasher};
use authgate_core::{
    CredentialStore, NewUser, RefreshTokenRecord, StoreError, User, UserProfile,
};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// User login request
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// User registration request
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Token refresh request
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

/// Password change request
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    /// Replaced by the authenticated subject on protected routes
    pub uid: Option<String>,
    /// New password
    pub password: Option<String>,
    #[serde(rename = "prevPassword")]
    pub prev_password: Option<String>,
}

/// Push-notification token update request
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateFcmTokenRequest {
    pub uid: Option<String>,
    pub fcm_token: Option<String>,
}

/// Sign-out request
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SignOutRequest {
    pub uid: Option<String>,
}

/// Access and refresh token pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthTokens {
    pub token: SignedToken,
    #[serde(rename = "refreshToken")]
    pub refresh_token: SignedToken,
}

/// Response of every token-issuing flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub id: Uuid,
    pub email: String,
    pub auth: AuthTokens,
}

/// Auth flow failures
///
/// The first group is the client-facing taxonomy; the wrapped errors are
/// internal faults.
#[derive(Debug, Error)]
pub enum AuthFlowError {
    #[error("{0}")]
    Validation(String),

    /// Unknown email and wrong password look the same
    #[error("Invalid Email or password")]
    InvalidCredentials,

    #[error("Invalid user")]
    InvalidUser,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Cannot be same password")]
    SamePassword,

    #[error("Email already exists.")]
    DuplicateEmail,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("User info not found")]
    UserNotFound,

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
}

impl AuthFlowError {
    /// True for faults that are not the caller's doing
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Token(_) | Self::Password(_))
    }
}

impl From<StoreError> for AuthFlowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => Self::DuplicateEmail,
            StoreError::UserNotFound => Self::UserNotFound,
            other => Self::Store(other),
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    tokens: TokenIssuer,
    hasher: PasswordHasher,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(store: Arc<dyn CredentialStore>, tokens: TokenIssuer, hasher: PasswordHasher) -> Self {
        Self {
            store,
            tokens,
            hasher,
        }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Login with email and password
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthFlowError> {
        let email = required(request.email, "Email id cannot be empty")?;
        let password = required(request.password, "Password cannot be empty")?;

        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthFlowError::InvalidCredentials)?;

        if !self.hasher.verify(&password, &user.password_hash)? {
            return Err(AuthFlowError::InvalidCredentials);
        }

        self.issue_and_rotate(&user).await
    }

    /// Register a new user and sign them in
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthFlowError> {
        let name = required(request.name, "Name cannot be empty")?;
        let email = required(request.email, "Email id cannot be empty")?;
        let password = required(request.password, "Password cannot be empty")?;

        let password_hash = self.hasher.hash(&password)?;

        let user = self
            .store
            .create_user(NewUser {
                email,
                password_hash,
                display_name: name,
            })
            .await?;

        self.issue_and_rotate(&user).await
    }

    /// Exchange a stored refresh token for a new access token
    ///
    /// The refresh token is not rotated here; the same string is returned.
    pub async fn refresh(&self, request: RefreshRequest) -> Result<AuthResponse, AuthFlowError> {
        let refresh_token = request
            .refresh_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthFlowError::InvalidRefreshToken)?;

        let record = self
            .store
            .find_refresh_token(&refresh_token)
            .await?
            .ok_or(AuthFlowError::InvalidRefreshToken)?;
        if record.is_expired() {
            return Err(AuthFlowError::InvalidRefreshToken);
        }

        let claims = self
            .tokens
            .verify_refresh_token(&refresh_token)
            .map_err(|e| {
                tracing::debug!(error = %e, "Stored refresh token failed verification");
                AuthFlowError::InvalidRefreshToken
            })?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthFlowError::InvalidRefreshToken)?;
        let token = self.tokens.issue_access_token(user_id, &claims.email)?;

        Ok(AuthResponse {
            id: user_id,
            email: claims.email,
            auth: AuthTokens {
                token,
                refresh_token: SignedToken {
                    token: refresh_token,
                    issued: claims.iat,
                    expires: claims.exp,
                },
            },
        })
    }

    /// Change a user's password and rotate their refresh token
    pub async fn change_password(
        &self,
        request: ChangePasswordRequest,
    ) -> Result<AuthResponse, AuthFlowError> {
        let uid = required(request.uid, "User id cannot be empty")?;
        let password = required(request.password, "Password cannot be empty")?;
        let prev_password = required(request.prev_password, "Previous password cannot be empty")?;
        let user_id = Uuid::parse_str(&uid).map_err(|_| AuthFlowError::InvalidUser)?;

        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthFlowError::InvalidUser)?;

        if !self.hasher.verify(&prev_password, &user.password_hash)? {
            return Err(AuthFlowError::InvalidPassword);
        }
        if self.hasher.verify(&password, &user.password_hash)? {
            return Err(AuthFlowError::SamePassword);
        }

        let password_hash = self.hasher.hash(&password)?;
        let user = self
            .store
            .update_password(user.id, &password_hash)
            .await
            .map_err(|e| match e {
                StoreError::UserNotFound => AuthFlowError::InvalidUser,
                other => other.into(),
            })?;

        self.issue_and_rotate(&user).await
    }

    /// Profile of the given user
    pub async fn profile(&self, uid: &str) -> Result<UserProfile, AuthFlowError> {
        let user_id = Uuid::parse_str(uid).map_err(|_| AuthFlowError::InvalidUser)?;

        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthFlowError::UserNotFound)?;

        Ok(user.to_profile())
    }

    /// Replace the push-notification token of a user
    pub async fn update_fcm_token(
        &self,
        request: UpdateFcmTokenRequest,
    ) -> Result<UserProfile, AuthFlowError> {
        let uid = request.uid.unwrap_or_default();
        let user_id = Uuid::parse_str(&uid).map_err(|_| AuthFlowError::InvalidUser)?;
        let fcm_token = required(request.fcm_token, "Valid fcm_token required.")?;

        let user = self.store.update_fcm_token(user_id, &fcm_token).await?;

        Ok(user.to_profile())
    }

    /// Delete every refresh token of a user
    ///
    /// Access tokens already issued stay valid until they expire.
    pub async fn sign_out(&self, request: SignOutRequest) -> Result<u64, AuthFlowError> {
        let uid = request.uid.unwrap_or_default();
        let user_id = Uuid::parse_str(&uid).map_err(|_| AuthFlowError::InvalidUser)?;

        Ok(self.store.delete_refresh_tokens(user_id).await?)
    }

    /// Issue a token pair and make the new refresh token the user's only one
    async fn issue_and_rotate(&self, user: &User) -> Result<AuthResponse, AuthFlowError> {
        let token = self.tokens.issue_access_token(user.id, &user.email)?;
        let refresh_token = self.tokens.issue_refresh_token(user.id, &user.email)?;

        let removed = self.store.delete_refresh_tokens(user.id).await?;
        self.store
            .insert_refresh_token(&RefreshTokenRecord {
                user_id: user.id,
                token: refresh_token.token.clone(),
                issued_at: unix_to_datetime(refresh_token.issued),
                expires_at: unix_to_datetime(refresh_token.expires),
            })
            .await?;

        tracing::debug!(user_id = %user.id, removed, "Refresh token rotated");

        Ok(AuthResponse {
            id: user.id,
            email: user.email.clone(),
            auth: AuthTokens {
                token,
                refresh_token,
            },
        })
    }
}

fn required(value: Option<String>, message: &str) -> Result<String, AuthFlowError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AuthFlowError::Validation(message.to_string()))
}

fn unix_to_datetime(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}

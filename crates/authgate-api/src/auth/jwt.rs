//! Token issuance and verification
//!
//! Two classes of HMAC-SHA256 signed tokens share one claim layout but are
//! signed with independent secrets:
//! - access tokens, valid for 15 minutes, verified statelessly by the
//!   session middleware
//! - refresh tokens, valid for 30 days, also persisted server-side so they
//!   can be revoked by deleting the stored record
//!
//! Access tokens are never looked up in the store. Signing out or rotating
//! refresh tokens does not invalidate access tokens already handed out; they
//! simply run out within their short lifetime.

use authgate_core::AuthConfig;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Access token lifetime: 15 minutes
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;

/// Refresh token lifetime: 30 days
pub const REFRESH_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Claims embedded in both token classes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: String,
    /// User's email address
    pub email: String,
    /// Issued at timestamp (Unix seconds)
    pub iat: i64,
    /// Expiration timestamp (Unix seconds)
    pub exp: i64,
    /// Unique token identifier, keeps tokens issued in the same second distinct
    pub jti: String,
}

/// Token generation and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token signature")]
    InvalidSignature,
}

/// A signed token together with its issue and expiry times
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SignedToken {
    pub token: String,
    /// Unix seconds
    pub issued: i64,
    /// Unix seconds
    pub expires: i64,
}

impl SignedToken {
    fn from_claims(token: String, claims: &Claims) -> Self {
        Self {
            token,
            issued: claims.iat,
            expires: claims.exp,
        }
    }
}

/// Signs and verifies access and refresh tokens
#[derive(Clone)]
pub struct TokenIssuer {
    access_secret: String,
    refresh_secret: String,
}

impl TokenIssuer {
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.access_token_secret, &config.refresh_token_secret)
    }

    /// Issue a 15-minute access token
    pub fn issue_access_token(&self, subject_id: Uuid, email: &str) -> Result<SignedToken, JwtError> {
        issue(
            subject_id,
            email,
            ACCESS_TOKEN_TTL_SECS,
            self.access_secret.as_bytes(),
        )
    }

    /// Issue a 30-day refresh token
    pub fn issue_refresh_token(
        &self,
        subject_id: Uuid,
        email: &str,
    ) -> Result<SignedToken, JwtError> {
        issue(
            subject_id,
            email,
            REFRESH_TOKEN_TTL_SECS,
            self.refresh_secret.as_bytes(),
        )
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Claims, JwtError> {
        verify(token, self.access_secret.as_bytes())
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, JwtError> {
        verify(token, self.refresh_secret.as_bytes())
    }
}

fn issue(
    subject_id: Uuid,
    email: &str,
    ttl_secs: i64,
    secret: &[u8],
) -> Result<SignedToken, JwtError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: subject_id.to_string(),
        email: email.to_string(),
        iat: now,
        exp: now + ttl_secs,
        jti: Uuid::new_v4().to_string(),
    };

    let token = sign(&claims, secret)?;
    Ok(SignedToken::from_claims(token, &claims))
}

/// Sign arbitrary claims with HS256
pub fn sign(claims: &Claims, secret: &[u8]) -> Result<String, JwtError> {
    let token = encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret),
    )?;

    Ok(token)
}

/// Verify a token against a secret and return its claims
///
/// Fails with `InvalidSignature` when the token was signed with another
/// secret and with `Expired` once the current time is past `exp`. There is
/// no leeway on expiry.
pub fn verify(token: &str, secret: &[u8]) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            _ => JwtError::InvalidToken,
        })?;

    Ok(token_data.claims)
}

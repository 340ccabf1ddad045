//! Security audit logging for authentication events
//!
//! Every credential event (login, registration, token refresh, password
//! change, sign-out) and every rejected access token is logged at INFO level
//! with the "audit" target, so the stream can be filtered and routed
//! separately from application logs.
//!
//! # Example
//!
//! ```ignore
//! use authgate_api::audit::{AuditEvent, audit_log};
//!
//! audit_log(&AuditEvent::LoginSuccess {
//!     user_id: user.id,
//!     email: user.email.clone(),
//!     ip_address: Some("192.168.1.1".to_string()),
//!     user_agent: Some("Mozilla/5.0...".to_string()),
//! });
//! ```

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Security audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    LoginSuccess {
        user_id: Uuid,
        email: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    LoginFailure {
        email: Option<String>,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    RegistrationSuccess {
        user_id: Uuid,
        email: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    RegistrationFailure {
        email: Option<String>,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// New access token issued against a stored refresh token
    TokenRefresh {
        user_id: Uuid,
        email: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    TokenRefreshFailure {
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    PasswordChange {
        user_id: Uuid,
        email: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Refresh tokens of a user deleted
    SignOut {
        user_id: String,
        email: String,
        tokens_removed: u64,
        ip_address: Option<String>,
    },

    /// Access token rejected by the session middleware
    InvalidToken {
        ip_address: Option<String>,
        user_agent: Option<String>,
        reason: String,
    },
}

impl AuditEvent {
    /// Short human-readable label used as the log message
    pub fn label(&self) -> &'static str {
        match self {
            Self::LoginSuccess { .. } => "Login successful",
            Self::LoginFailure { .. } => "Login failed",
            Self::RegistrationSuccess { .. } => "Registration successful",
            Self::RegistrationFailure { .. } => "Registration failed",
            Self::TokenRefresh { .. } => "Token refresh",
            Self::TokenRefreshFailure { .. } => "Token refresh failed",
            Self::PasswordChange { .. } => "Password changed",
            Self::SignOut { .. } => "User signed out",
            Self::InvalidToken { .. } => "Invalid token",
        }
    }

    fn ip_address(&self) -> Option<&str> {
        match self {
            Self::LoginSuccess { ip_address, .. }
            | Self::LoginFailure { ip_address, .. }
            | Self::RegistrationSuccess { ip_address, .. }
            | Self::RegistrationFailure { ip_address, .. }
            | Self::TokenRefresh { ip_address, .. }
            | Self::TokenRefreshFailure { ip_address, .. }
            | Self::PasswordChange { ip_address, .. }
            | Self::SignOut { ip_address, .. }
            | Self::InvalidToken { ip_address, .. } => ip_address.as_deref(),
        }
    }
}

/// Client metadata attached to audit events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: extract_ip_address(headers),
            user_agent: extract_user_agent(headers),
        }
    }
}

/// Log a security audit event with structured fields
///
/// The event is serialized to JSON for log aggregators. Example output:
///
/// ```json
/// {
///   "event_type": "login_success",
///   "user_id": "550e8400-e29b-41d4-a716-446655440000",
///   "email": "user@example.com",
///   "ip_address": "192.168.1.1",
///   "user_agent": "Mozilla/5.0..."
/// }
/// ```
pub fn audit_log(event: &AuditEvent) {
    let timestamp: DateTime<Utc> = Utc::now();

    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    info!(
        target: "audit",
        timestamp = %timestamp,
        event = %event_json,
        ip_address = ?event.ip_address(),
        "{}",
        event.label()
    );
}

/// Extract the client IP address from proxy headers
///
/// Checks X-Forwarded-For (first hop) then X-Real-IP. The socket address is
/// not consulted.
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(xff) = headers.get("x-forwarded-for") {
        if let Ok(xff_str) = xff.to_str() {
            if let Some(first_ip) = xff_str.split(',').next() {
                return Some(first_ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}

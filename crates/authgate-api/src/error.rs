//! API response envelope and error handling
//!
//! Every response body, success or failure, is `{code, data, message}`.

use crate::auth::service::{AuthFlowError, AuthResponse};
use authgate_core::UserProfile;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Message used for every internal failure
pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong.";

/// Response envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[aliases(
    AuthEnvelope = ApiResponse<AuthResponse>,
    ProfileEnvelope = ApiResponse<UserProfile>,
    EmptyEnvelope = ApiResponse<EmptyObject>
)]
pub struct ApiResponse<T> {
    /// Mirrors the HTTP status code
    pub code: u16,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            data,
            message: "Success".to_string(),
        }
    }
}

/// Serializes as `{}`
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct EmptyObject {}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// Error envelope, `data` is `null` or `{}`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorEnvelope {
    pub code: u16,
    #[schema(value_type = Option<Object>)]
    pub data: Option<serde_json::Value>,
    pub message: String,
}

/// Application error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    /// Details are logged, never sent to the client
    Internal(String),
}

impl AppError {
    /// Build an error carrying `message` for one of the client statuses
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            StatusCode::BAD_REQUEST => Self::BadRequest(message),
            StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            _ => Self::Internal(message),
        }
    }

    /// Map an auth flow failure onto the status an endpoint uses for its
    /// domain errors; internal faults always become 500
    pub fn from_flow(err: AuthFlowError, status: StatusCode) -> Self {
        if err.is_internal() {
            return Self::Internal(err.to_string());
        }
        Self::with_status(status, err.to_string())
    }

    /// Malformed JSON bodies are reported with the endpoint's failure status
    pub fn from_rejection(rejection: JsonRejection, status: StatusCode) -> Self {
        Self::with_status(status, rejection.body_text())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn envelope(self) -> ErrorEnvelope {
        let status = self.status();
        let (data, message) = match self {
            Self::NotFound(msg) => (Some(serde_json::json!({})), msg),
            Self::Internal(details) => {
                tracing::error!(error = %details, "Internal error");
                (None, INTERNAL_ERROR_MESSAGE.to_string())
            }
            Self::BadRequest(msg) | Self::Unauthorized(msg) | Self::Forbidden(msg) => (None, msg),
        };

        ErrorEnvelope {
            code: status.as_u16(),
            data,
            message,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::Internal(msg) => write!(f, "{}: {msg}", self.status()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.envelope())).into_response()
    }
}

//! Public authentication endpoints: login, registration, token refresh

use crate::audit::{audit_log, AuditEvent, ClientInfo};
use crate::auth::service::{AuthFlowError, AuthResponse, LoginRequest, RefreshRequest, RegisterRequest};
use crate::error::{ApiResponse, AppError, AuthEnvelope, ErrorEnvelope, INTERNAL_ERROR_MESSAGE};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

/// Login with email and password
///
/// Returns a fresh access/refresh token pair. The new refresh token replaces
/// any previously stored one for the user.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthEnvelope),
        (status = 400, description = "Missing field or invalid credentials", body = ErrorEnvelope),
        (status = 500, description = "Internal server error", body = ErrorEnvelope),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let Json(request) =
        payload.map_err(|e| AppError::from_rejection(e, StatusCode::BAD_REQUEST))?;
    let client = ClientInfo::from_headers(&headers);
    let email = request.email.clone();

    match state.auth.login(request).await {
        Ok(response) => {
            audit_log(&AuditEvent::LoginSuccess {
                user_id: response.id,
                email: response.email.clone(),
                ip_address: client.ip_address,
                user_agent: client.user_agent,
            });
            Ok(ApiResponse::success(response))
        }
        Err(e) => {
            audit_log(&AuditEvent::LoginFailure {
                email,
                reason: e.to_string(),
                ip_address: client.ip_address,
                user_agent: client.user_agent,
            });
            Err(AppError::from_flow(e, StatusCode::BAD_REQUEST))
        }
    }
}

/// Register a new account
///
/// A duplicate email is reported as 400; any other failure, including
/// missing fields, as 403.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered and signed in", body = AuthEnvelope),
        (status = 400, description = "Email already exists", body = ErrorEnvelope),
        (status = 403, description = "Registration failed", body = ErrorEnvelope),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::from_rejection(e, StatusCode::FORBIDDEN))?;
    let client = ClientInfo::from_headers(&headers);
    let email = request.email.clone();

    match state.auth.register(request).await {
        Ok(response) => {
            audit_log(&AuditEvent::RegistrationSuccess {
                user_id: response.id,
                email: response.email.clone(),
                ip_address: client.ip_address,
                user_agent: client.user_agent,
            });
            Ok(ApiResponse::success(response))
        }
        Err(e) => {
            audit_log(&AuditEvent::RegistrationFailure {
                email,
                reason: e.to_string(),
                ip_address: client.ip_address,
                user_agent: client.user_agent,
            });
            Err(registration_error(e))
        }
    }
}

fn registration_error(err: AuthFlowError) -> AppError {
    match err {
        AuthFlowError::DuplicateEmail => AppError::BadRequest(err.to_string()),
        err if err.is_internal() => {
            tracing::error!(error = %err, "Registration failed");
            AppError::Forbidden(INTERNAL_ERROR_MESSAGE.to_string())
        }
        err => AppError::Forbidden(err.to_string()),
    }
}

/// Exchange a refresh token for a new access token
///
/// The refresh token itself is echoed back unchanged.
#[utoipa::path(
    post,
    path = "/auth/refresh-token",
    tag = "Authentication",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token issued", body = AuthEnvelope),
        (status = 404, description = "Invalid or expired refresh token", body = ErrorEnvelope),
        (status = 500, description = "Internal server error", body = ErrorEnvelope),
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::from_rejection(e, StatusCode::NOT_FOUND))?;
    let client = ClientInfo::from_headers(&headers);

    match state.auth.refresh(request).await {
        Ok(response) => {
            audit_log(&AuditEvent::TokenRefresh {
                user_id: response.id,
                email: response.email.clone(),
                ip_address: client.ip_address,
                user_agent: client.user_agent,
            });
            Ok(ApiResponse::success(response))
        }
        Err(e) => {
            audit_log(&AuditEvent::TokenRefreshFailure {
                reason: e.to_string(),
                ip_address: client.ip_address,
                user_agent: client.user_agent,
            });
            Err(AppError::from_flow(e, StatusCode::NOT_FOUND))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authgate_core::StoreError;

    #[test]
    fn test_registration_error_statuses() {
        assert_eq!(
            registration_error(AuthFlowError::DuplicateEmail).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            registration_error(AuthFlowError::Validation("Name cannot be empty".to_string())),
            AppError::Forbidden("Name cannot be empty".to_string())
        );
        assert_eq!(
            registration_error(AuthFlowError::Store(StoreError::Database("down".to_string()))),
            AppError::Forbidden(INTERNAL_ERROR_MESSAGE.to_string())
        );
    }
}

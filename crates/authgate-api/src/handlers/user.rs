//! Profile endpoints behind the session middleware
//!
//! The subject of the verified access token always wins over a `uid` sent
//! in the request body.

use crate::audit::{audit_log, AuditEvent, ClientInfo};
use crate::auth::middleware::AuthenticatedUser;
use crate::auth::service::{
    AuthResponse, ChangePasswordRequest, SignOutRequest, UpdateFcmTokenRequest,
};
use crate::error::{
    ApiResponse, AppError, AuthEnvelope, EmptyEnvelope, EmptyObject, ErrorEnvelope, ProfileEnvelope,
};
use crate::state::AppState;
use authgate_core::UserProfile;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use std::sync::Arc;

/// Current user's profile
#[utoipa::path(
    get,
    path = "/user/me",
    tag = "User",
    responses(
        (status = 200, description = "Profile of the caller", body = ProfileEnvelope),
        (status = 401, description = "Missing or invalid access token", body = ErrorEnvelope),
        (status = 404, description = "User info not found", body = ErrorEnvelope),
    ),
    security(("bearer_auth" = []))
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<ApiResponse<UserProfile>, AppError> {
    let profile = state
        .auth
        .profile(&user.user_id)
        .await
        .map_err(|e| AppError::from_flow(e, StatusCode::NOT_FOUND))?;

    Ok(ApiResponse::success(profile))
}

/// Change password and receive a fresh token pair
#[utoipa::path(
    post,
    path = "/user/change-password",
    tag = "User",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = AuthEnvelope),
        (status = 400, description = "Invalid user or password", body = ErrorEnvelope),
        (status = 401, description = "Missing or invalid access token", body = ErrorEnvelope),
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_password_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    headers: HeaderMap,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<ApiResponse<AuthResponse>, AppError> {
    let Json(mut request) =
        payload.map_err(|e| AppError::from_rejection(e, StatusCode::BAD_REQUEST))?;
    request.uid = Some(user.user_id);

    let response = state
        .auth
        .change_password(request)
        .await
        .map_err(|e| AppError::from_flow(e, StatusCode::BAD_REQUEST))?;

    let client = ClientInfo::from_headers(&headers);
    audit_log(&AuditEvent::PasswordChange {
        user_id: response.id,
        email: response.email.clone(),
        ip_address: client.ip_address,
        user_agent: client.user_agent,
    });

    Ok(ApiResponse::success(response))
}

/// Replace the push-notification token
#[utoipa::path(
    post,
    path = "/user/update_fcm_token",
    tag = "User",
    request_body = UpdateFcmTokenRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileEnvelope),
        (status = 401, description = "Missing or invalid access token", body = ErrorEnvelope),
        (status = 404, description = "Missing token or unknown user", body = ErrorEnvelope),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_fcm_token_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    payload: Result<Json<UpdateFcmTokenRequest>, JsonRejection>,
) -> Result<ApiResponse<UserProfile>, AppError> {
    let Json(mut request) =
        payload.map_err(|e| AppError::from_rejection(e, StatusCode::NOT_FOUND))?;
    request.uid = Some(user.user_id);

    let profile = state
        .auth
        .update_fcm_token(request)
        .await
        .map_err(|e| AppError::from_flow(e, StatusCode::NOT_FOUND))?;

    Ok(ApiResponse::success(profile))
}

/// Sign out by deleting every stored refresh token of the caller
///
/// Outstanding access tokens stay valid until they expire.
#[utoipa::path(
    post,
    path = "/user/signout",
    tag = "User",
    request_body = SignOutRequest,
    responses(
        (status = 200, description = "Signed out", body = EmptyEnvelope),
        (status = 401, description = "Missing or invalid access token", body = ErrorEnvelope),
        (status = 404, description = "User not found", body = ErrorEnvelope),
    ),
    security(("bearer_auth" = []))
)]
pub async fn signout_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    headers: HeaderMap,
) -> Result<ApiResponse<EmptyObject>, AppError> {
    let request = SignOutRequest {
        uid: Some(user.user_id.clone()),
    };

    let removed = state.auth.sign_out(request).await.map_err(|e| {
        if e.is_internal() {
            AppError::Internal(e.to_string())
        } else {
            AppError::NotFound("User not found.".to_string())
        }
    })?;

    audit_log(&AuditEvent::SignOut {
        user_id: user.user_id,
        email: user.email,
        tokens_removed: removed,
        ip_address: ClientInfo::from_headers(&headers).ip_address,
    });

    Ok(ApiResponse::success(EmptyObject::default()))
}

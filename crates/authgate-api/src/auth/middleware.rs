/// Session middleware for the `/user` routes
///
/// Extracts the bearer access token from the Authorization header and
/// verifies it against the access-token secret held in the application
/// state. On success the verified subject is added to the request
/// extensions. The store is never consulted.
use super::jwt::JwtError;
use crate::audit::{audit_log, AuditEvent, ClientInfo};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use thiserror::Error;

/// Message sent for every rejected access token
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid token";

/// Verified subject of an access token
///
/// Handlers extract it with `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
}

/// Session middleware errors, all reported as 401
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] JwtError),

    #[error("Token has no subject")]
    MissingSubject,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        tracing::debug!(reason = %self, "Rejected access token");
        AppError::Unauthorized(INVALID_TOKEN_MESSAGE.to_string()).into_response()
    }
}

/// Token portion of a `Bearer <token>` header value
///
/// The scheme is matched case-insensitively.
pub fn extract_bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim_start().split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    Some(token.trim()).filter(|token| !token.is_empty())
}

/// Authentication middleware that requires a valid access token
///
/// # Usage
///
/// ```ignore
/// use axum::{Router, routing::get, middleware};
/// use authgate_api::auth::middleware::auth_middleware;
///
/// let app = Router::new()
///     .route("/user/me", get(me))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
///     .with_state(state);
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = extract_bearer_token(auth_header).ok_or(AuthError::InvalidAuthHeader)?;

    let claims = match state.auth.tokens().verify_access_token(token) {
        Ok(c) => c,
        Err(e) => {
            let client = ClientInfo::from_headers(request.headers());
            audit_log(&AuditEvent::InvalidToken {
                ip_address: client.ip_address,
                user_agent: client.user_agent,
                reason: e.to_string(),
            });
            return Err(AuthError::InvalidToken(e));
        }
    };

    if claims.sub.is_empty() {
        return Err(AuthError::MissingSubject);
    }

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: claims.sub,
        email: claims.email,
    });

    Ok(next.run(request).await)
}

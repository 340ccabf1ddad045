//! Client credential gate
//!
//! When both an API key and an app id are configured, requests must carry
//! them in the `x-api-key` and `x-app-id` headers. With either value unset
//! the gate lets everything through.

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const APP_ID_HEADER: &str = "x-app-id";

const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid api key or app id.";

/// True when the headers carry exactly the expected key and app id
pub fn credentials_match(headers: &HeaderMap, api_key: &str, app_id: &str) -> bool {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    header(API_KEY_HEADER) == Some(api_key) && header(APP_ID_HEADER) == Some(app_id)
}

pub async fn api_key_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if let Some((api_key, app_id)) = state.config.auth.api_key_gate() {
        if !credentials_match(request.headers(), api_key, app_id) {
            tracing::debug!(path = %request.uri().path(), "Rejected client credentials");
            return AppError::Unauthorized(INVALID_CREDENTIALS_MESSAGE.to_string())
                .into_response();
        }
    }

    next.run(request).await
}

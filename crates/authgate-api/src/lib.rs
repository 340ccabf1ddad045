//! authgate API - authentication and user profile REST server
//!
//! Provides login, registration, token refresh and profile endpoints on top
//! of a [`authgate_core::CredentialStore`].

pub mod audit;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::{http::HeaderValue, routing::get, Router};
use openapi::{ApiDoc, OPENAPI_JSON_PATH};
use state::AppState;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Build the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(routes::api_routes(state.clone()))
        .merge(SwaggerUi::new("/docs").url(OPENAPI_JSON_PATH, ApiDoc::openapi()))
        .fallback(handlers::not_found_handler)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any origin when none are configured, else exactly the listed ones
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(origins)
}

/// Router over an in-memory store with cheap password hashing
#[cfg(feature = "test-utils")]
pub fn create_router_for_testing() -> Router {
    create_router_for_testing_with_store().0
}

/// Like [`create_router_for_testing`], also handing back the store so
/// tests can inspect persisted refresh tokens
#[cfg(feature = "test-utils")]
pub fn create_router_for_testing_with_store(
) -> (Router, Arc<authgate_core::MemoryCredentialStore>) {
    create_router_for_testing_with_config(authgate_core::AppConfig::for_testing())
}

#[cfg(feature = "test-utils")]
pub fn create_router_for_testing_with_config(
    config: authgate_core::AppConfig,
) -> (Router, Arc<authgate_core::MemoryCredentialStore>) {
    let store = Arc::new(authgate_core::MemoryCredentialStore::new());
    let state = AppState::with_hasher(
        config,
        store.clone(),
        auth::PasswordHasher::new(auth::PasswordConfig::for_testing()),
    );

    (create_router(Arc::new(state)), store)
}

//! API route definitions

use crate::auth::middleware::auth_middleware;
use crate::handlers::{auth, user};
use crate::middleware::api_key_middleware;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// `/auth` and `/user` routes behind the client credential gate
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no access token required)
    let public_routes = Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/refresh-token", post(auth::refresh_handler));

    // Protected routes (access token required)
    let protected_routes = Router::new()
        .route("/user/me", get(user::me_handler))
        .route("/user/change-password", post(user::change_password_handler))
        .route("/user/update_fcm_token", post(user::update_fcm_token_handler))
        .route("/user/signout", post(user::signout_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .route_layer(middleware::from_fn_with_state(state, api_key_middleware))
}

//! OpenAPI document served by Swagger UI

use crate::auth::jwt::SignedToken;
use crate::auth::service::{
    AuthResponse, AuthTokens, ChangePasswordRequest, LoginRequest, RefreshRequest,
    RegisterRequest, SignOutRequest, UpdateFcmTokenRequest,
};
use crate::error::{AuthEnvelope, EmptyEnvelope, EmptyObject, ErrorEnvelope, ProfileEnvelope};
use crate::handlers::{auth, health, user};
use authgate_core::UserProfile;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

/// Path of the JSON document
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "authgate",
        description = "User authentication and profile service"
    ),
    paths(
        auth::login_handler,
        auth::register_handler,
        auth::refresh_handler,
        user::me_handler,
        user::change_password_handler,
        user::update_fcm_token_handler,
        user::signout_handler,
        health::health_check,
    ),
    components(schemas(
        LoginRequest,
        RegisterRequest,
        RefreshRequest,
        ChangePasswordRequest,
        UpdateFcmTokenRequest,
        SignOutRequest,
        AuthResponse,
        AuthTokens,
        SignedToken,
        UserProfile,
        EmptyObject,
        AuthEnvelope,
        ProfileEnvelope,
        EmptyEnvelope,
        ErrorEnvelope,
        health::HealthResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Authentication", description = "Login, registration and token refresh"),
        (name = "User", description = "Profile management for the signed-in user"),
        (name = "Health", description = "Liveness probe"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

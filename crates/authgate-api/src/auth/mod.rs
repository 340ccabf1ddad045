//! Authentication module
//!
//! - Token issuance and verification (two HS256 secrets)
//! - Password hashing with Argon2
//! - Session middleware for the protected routes
//! - Auth flow service: login, registration, refresh, password change

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use jwt::{Claims, JwtError, SignedToken, TokenIssuer};
pub use middleware::{auth_middleware, AuthError, AuthenticatedUser};
pub use password::{PasswordConfig, PasswordError, PasswordHasher};
pub use service::{
    AuthFlowError, AuthResponse, AuthService, AuthTokens, ChangePasswordRequest, LoginRequest,
    RefreshRequest, RegisterRequest, SignOutRequest, UpdateFcmTokenRequest,
};

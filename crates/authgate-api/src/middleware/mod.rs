//! HTTP middleware applied around the route handlers
//!
//! The session middleware guarding `/user` lives in `auth::middleware`.

pub mod api_key;
pub mod security_headers;

pub use api_key::api_key_middleware;
pub use security_headers::security_headers_middleware;

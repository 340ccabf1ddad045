//! API handlers

pub mod auth;
pub mod health;
pub mod user;

use crate::error::AppError;

/// Fallback for unknown routes
pub async fn not_found_handler() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

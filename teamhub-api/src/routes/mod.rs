/// API route handlers
///
/// - `health`: health check
/// - `auth`: login, registration, own profile
/// - `users`: profile lookup for API clients
/// - `admin`: the session-authenticated admin panel

pub mod admin;
pub mod auth;
pub mod health;
pub mod users;

use crate::error::ApiError;

/// Fallback for paths no route matches
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Resource not found".to_string())
}

/// Authentication endpoints
///
/// - `POST /api/v1/auth/login` - exchange credentials for a bearer token
/// - `POST /api/v1/auth/register` - self-service sign-up (MEMBER role)
/// - `GET /api/v1/auth/profile` - the caller's profile
/// - `POST /api/v1/auth/logout` - acknowledges logout; tokens are stateless

use crate::{
    app::AppState,
    error::{ApiResult, MessageResponse},
    extract::ApiJson,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use teamhub_shared::{
    auth::{jwt, middleware::AuthContext},
    models::user::UserRole,
    services::users::{self, RegisterInput, UserProfile},
};
use tracing::info;
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,

    /// Always `Bearer`
    #[serde(rename = "type")]
    pub token_type: &'static str,

    pub email: String,

    pub role: UserRole,

    pub user_id: i64,
}

/// Checks credentials and issues a signed token
///
/// # Errors
///
/// - `400 Bad Request`: email or password missing
/// - `401 Unauthorized`: wrong credentials or inactive account
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate().map_err(teamhub_shared::services::ServiceError::from)?;

    let user = users::authenticate(&state.db, &req.email, &req.password).await?;

    let claims = jwt::Claims::new(
        user.id,
        &user.email,
        user.role,
        chrono::Duration::hours(state.config.jwt.expiration_hours),
    );
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        email: user.email,
        role: user.role,
        user_id: user.id,
    }))
}

/// Creates a MEMBER account
///
/// # Errors
///
/// - `400 Bad Request`: validation failed or the email is already in use
pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    users::register(&state.db, input).await?;
    Ok((
        StatusCode::CREATED,
        MessageResponse::ok("User registered successfully"),
    ))
}

pub async fn profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(users::profile(&state.db, auth.user_id).await?))
}

pub async fn logout(Extension(auth): Extension<AuthContext>) -> Json<MessageResponse> {
    info!(user_id = auth.user_id, "User logged out");
    MessageResponse::ok("Logged out successfully")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_shape() {
        let response = LoginResponse {
            token: "abc".to_string(),
            token_type: "Bearer",
            email: "jane@example.com".to_string(),
            role: UserRole::Member,
            user_id: 5,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["type"], "Bearer");
        assert_eq!(json["userId"], 5);
        assert_eq!(json["role"], "MEMBER");
    }

    #[test]
    fn test_login_request_requires_fields() {
        let req = LoginRequest {
            email: String::new(),
            password: "secret".to_string(),
        };
        assert!(req.validate().is_err());
    }
}

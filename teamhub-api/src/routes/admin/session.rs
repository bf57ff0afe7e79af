/// Admin panel login and logout
///
/// A successful login stores a hashed session token in `admin_sessions` and
/// hands the raw token to the browser in an `HttpOnly` cookie scoped to
/// `/admin`.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use teamhub_shared::{
    auth::{
        middleware::cookie_value,
        session_token::{generate_session_token, hash_session_token},
    },
    models::{admin_session::AdminSession, user::UserRole},
    services::{users, ServiceError},
};
use tracing::{debug, info};
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, MessageResponse},
    extract::JsonOrForm,
};

#[derive(Debug, Deserialize, Validate)]
pub struct AdminLoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// `Set-Cookie` value; `max_age_seconds = 0` clears the cookie
pub fn session_cookie(name: &str, token: &str, max_age_seconds: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/admin; HttpOnly; SameSite=Lax; Max-Age={}",
        name, token, max_age_seconds
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub async fn login(
    State(state): State<AppState>,
    JsonOrForm(req): JsonOrForm<AdminLoginRequest>,
) -> ApiResult<Response> {
    req.validate().map_err(ServiceError::from)?;

    let user = users::authenticate(&state.db, &req.email, &req.password).await?;
    if user.role != UserRole::Admin {
        debug!(user_id = user.id, "Non-admin tried the admin panel");
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }

    let ttl = Duration::hours(state.config.session.ttl_hours);
    let (token, token_hash) = generate_session_token();
    AdminSession::create(&state.db, user.id, &token_hash, Utc::now() + ttl).await?;

    let purged = AdminSession::purge_expired(&state.db).await?;
    if purged > 0 {
        debug!(purged, "Removed expired admin sessions");
    }

    info!(user_id = user.id, "Admin logged in");

    let cookie = session_cookie(
        &state.config.session.cookie_name,
        &token,
        ttl.num_seconds(),
        state.config.api.production,
    );

    Ok((
        [(header::SET_COOKIE, cookie)],
        MessageResponse::ok("Login successful"),
    )
        .into_response())
}

/// Ends the session if one is present; always clears the cookie
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let cookie_name = &state.config.session.cookie_name;

    if let Some(token) = cookie_value(&headers, cookie_name) {
        if AdminSession::delete_by_token_hash(&state.db, &hash_session_token(token)).await? {
            info!("Admin logged out");
        }
    }

    let cookie = session_cookie(cookie_name, "", 0, state.config.api.production);
    Ok((
        [(header::SET_COOKIE, cookie)],
        MessageResponse::ok("Logged out successfully"),
    )
        .into_response())
}

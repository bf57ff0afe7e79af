/// Authentication middleware for Axum
///
/// Two schemes guard two surfaces:
///
/// - **JWT** (`/api/v1/**`): `Authorization: Bearer <token>`, stateless
/// - **Session** (`/admin/**`): a `ths_` token in a cookie, looked up by hash
///   in `admin_sessions`; only ADMIN users pass
///
/// On success an [`AuthContext`] is inserted into the request extensions.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use teamhub_shared::auth::middleware::{create_jwt_middleware, AuthContext};
///
/// async fn whoami(Extension(auth): Extension<AuthContext>) -> String {
///     auth.email
/// }
///
/// let app: Router = Router::new()
///     .route("/me", get(whoami))
///     .layer(middleware::from_fn(create_jwt_middleware("secret")));
/// ```

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, error};

use super::jwt::{extract_bearer_token, validate_token, JwtError};
use super::session_token::{hash_session_token, is_well_formed};
use crate::models::admin_session::AdminSession;
use crate::models::user::{User, UserRole, UserStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    Jwt,
    Session,
}

/// Who is making the request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: i64,
    pub email: String,
    pub role: UserRole,
    pub method: AuthMethod,
}

impl AuthContext {
    pub fn from_claims(claims: &super::jwt::Claims) -> Self {
        Self {
            user_id: claims.uid,
            email: claims.sub.clone(),
            role: claims.role,
            method: AuthMethod::Jwt,
        }
    }

    pub fn from_session_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            method: AuthMethod::Session,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingCredentials,
    InvalidToken(String),
    SessionExpired,
    Forbidden(String),
    DatabaseError(String),
}

impl AuthError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Authentication required".to_string())
            }
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AuthError::SessionExpired => (
                StatusCode::UNAUTHORIZED,
                "Session expired, please log in again".to_string(),
            ),
            AuthError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AuthError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::DatabaseError(ref e) = self {
            error!(error = %e, "Database error during authentication");
        }

        let (status, message) = self.status_and_message();
        let body = serde_json::json!({ "message": message, "success": false });
        (status, Json(body)).into_response()
    }
}

/// Validates the bearer token and attaches the caller
pub async fn jwt_auth_middleware(
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = extract_bearer_token(header_value)
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))?;

    let claims = validate_token(token, &secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    req.extensions_mut().insert(AuthContext::from_claims(&claims));
    Ok(next.run(req).await)
}

/// Reads one cookie out of the `Cookie` headers
pub fn cookie_value<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}

/// Resolves the admin session cookie and requires an active ADMIN
pub async fn session_auth_middleware(
    pool: PgPool,
    cookie_name: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = cookie_value(req.headers(), &cookie_name)
        .filter(|token| is_well_formed(token))
        .ok_or(AuthError::MissingCredentials)?;

    let user = AdminSession::find_user_by_token_hash(&pool, &hash_session_token(token))
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?
        .ok_or(AuthError::SessionExpired)?;

    if user.role != UserRole::Admin || user.status != UserStatus::Active {
        debug!(user_id = user.id, "Session user lacks admin access");
        return Err(AuthError::Forbidden("Admin access required".to_string()));
    }

    req.extensions_mut().insert(AuthContext::from_session_user(&user));
    Ok(next.run(req).await)
}

type MiddlewareFuture = Pin<Box<dyn Future<Output = Result<Response, AuthError>> + Send>>;

/// Captures the JWT secret for `axum::middleware::from_fn`
pub fn create_jwt_middleware(
    secret: impl Into<String>,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    let secret = secret.into();
    move |req, next| {
        let secret = secret.clone();
        Box::pin(jwt_auth_middleware(secret, req, next))
    }
}

/// Captures the pool and cookie name for `axum::middleware::from_fn`
pub fn create_session_middleware(
    pool: PgPool,
    cookie_name: impl Into<String>,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    let cookie_name = cookie_name.into();
    move |req, next| {
        let pool = pool.clone();
        let cookie_name = cookie_name.clone();
        Box::pin(session_auth_middleware(pool, cookie_name, req, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::Claims;
    use axum::http::HeaderValue;
    use chrono::Duration;

    #[test]
    fn test_context_from_claims() {
        let claims = Claims::new(5, "jane@example.com", UserRole::Member, Duration::hours(1));
        let ctx = AuthContext::from_claims(&claims);

        assert_eq!(ctx.user_id, 5);
        assert_eq!(ctx.email, "jane@example.com");
        assert_eq!(ctx.method, AuthMethod::Jwt);
        assert!(!ctx.is_admin());
    }

    #[test]
    fn test_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; TEAMHUB_SESSION=ths_abc ; other=1"),
        );

        assert_eq!(cookie_value(&headers, "TEAMHUB_SESSION"), Some("ths_abc"));
        assert_eq!(cookie_value(&headers, "theme"), Some("dark"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_cookie_value_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("b=2"));

        assert_eq!(cookie_value(&headers, "b"), Some("2"));
    }

    #[test]
    fn test_auth_error_statuses() {
        assert_eq!(
            AuthError::MissingCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::SessionExpired.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Forbidden("no".to_string()).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::DatabaseError("boom".to_string()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

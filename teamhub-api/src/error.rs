/// Error handling for the API server
///
/// Every failure leaves the server as `{ "message": ..., "success": false }`,
/// with a per-field `errors` list added for validation failures. Handlers
/// return `ApiResult<T>` and let `?` convert service, auth and CSV errors.
///
/// # Example
///
/// ```no_run
/// use teamhub_api::error::ApiResult;
/// use teamhub_shared::services::teams;
/// use axum::Json;
///
/// async fn handler(pool: sqlx::PgPool) -> ApiResult<Json<teamhub_shared::models::team::Team>> {
///     let team = teams::get_team(&pool, 1).await?;
///     Ok(Json(team))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use teamhub_shared::auth::authorization::AuthzError;
use teamhub_shared::auth::jwt::JwtError;
use teamhub_shared::auth::password::PasswordError;
use teamhub_shared::csv::CsvError;
use teamhub_shared::services::{FieldError, ServiceError};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409): stale version
    Conflict(String),

    /// Bad request (400) with per-field details
    Validation(Vec<FieldError>),

    /// Internal server error (500); the detail is logged, never returned
    InternalError(String),
}

/// Error envelope
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,

    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

/// Success envelope for operations that return no entity
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
    pub success: bool,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
            success: true,
        })
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Validation(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            ApiError::Validation(errors) => {
                let message = errors
                    .first()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| "Validation failed".to_string());
                (StatusCode::BAD_REQUEST, message, Some(errors))
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            message,
            success: false,
            errors,
        });

        (status, body).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::Duplicate(msg) => ApiError::BadRequest(msg),
            ServiceError::Validation(errors) => ApiError::Validation(errors),
            ServiceError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            ServiceError::Forbidden(msg) => ApiError::Forbidden(msg),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::Database(e) => ApiError::InternalError(format!("Database error: {}", e)),
            ServiceError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::InternalError(format!("Database error: {}", err))
    }
}

impl From<CsvError> for ApiError {
    fn from(err: CsvError) -> Self {
        match err {
            CsvError::Service(e) => e.into(),
            CsvError::Io(e) => ApiError::InternalError(format!("I/O error: {}", e)),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            _ => ApiError::Unauthorized("Invalid token".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");
    }

    #[tokio::test]
    async fn test_not_found_envelope() {
        let err: ApiError = ServiceError::not_found("Team", 7).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Team not found with id: 7");
        assert_eq!(body["success"], false);
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_is_bad_request() {
        let err: ApiError = ServiceError::Duplicate("Team name already exists".to_string()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "Team name already exists");
    }

    #[tokio::test]
    async fn test_validation_lists_fields() {
        let err: ApiError = ServiceError::Validation(vec![
            FieldError::new("email", "Email is required"),
            FieldError::new("name", "Name is required"),
        ])
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Email is required");
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);
        assert_eq!(body["errors"][1]["field"], "name");
    }

    #[tokio::test]
    async fn test_internal_detail_hidden() {
        let err: ApiError = ServiceError::Internal("pool exhausted on host db-3".to_string()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["message"], "An unexpected error occurred");
        assert!(!body.to_string().contains("db-3"));
    }

    #[tokio::test]
    async fn test_conflict_and_forbidden() {
        let conflict: ApiError = ServiceError::Conflict("stale".to_string()).into();
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);

        let forbidden: ApiError = ServiceError::Forbidden("You cannot delete yourself".to_string()).into();
        assert_eq!(forbidden.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_csv_header_error_is_bad_request() {
        let err: ApiError = CsvError::Empty.into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], false);
    }
}

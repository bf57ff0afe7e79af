/// Admin panel endpoints
///
/// Everything except `login` and `logout` sits behind the session cookie
/// middleware, which only admits active ADMIN users. Responses are JSON.

pub mod activity;
pub mod positions;
pub mod projects;
pub mod session;
pub mod skills;
pub mod teams;
pub mod users;

use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// Attachment response for CSV downloads
pub(crate) fn csv_attachment(filename: &str, body: Vec<u8>) -> Result<Response, ApiError> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .map_err(|e| ApiError::InternalError(format!("Invalid filename header: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

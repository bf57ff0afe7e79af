/// `GET /api/v1/users/:id/profile`
///
/// Any authenticated user may view any profile.

use crate::{app::AppState, error::ApiResult, extract::ApiPath};
use axum::{
    extract::State,
    Extension, Json,
};
use teamhub_shared::{
    auth::{authorization::require_role, middleware::AuthContext},
    models::user::UserRole,
    services::users::{self, UserProfile},
};

pub async fn user_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<UserProfile>> {
    require_role(&auth, UserRole::Member)?;
    Ok(Json(users::profile(&state.db, id).await?))
}

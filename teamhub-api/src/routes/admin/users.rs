/// `/admin/users`
///
/// List (filtered by `status` and `role`), create, profile, update, delete.
/// An admin cannot delete their own account.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use teamhub_shared::{
    models::user::{User, UserRole, UserStatus},
    services::users::{self, UserInput, UserProfile},
};

use crate::{
    app::AppState,
    error::{ApiResult, MessageResponse},
    extract::{ApiJson, ApiPath, ApiQuery, RequestActor},
};

#[derive(Debug, Deserialize)]
pub struct UserFilter {
    pub status: Option<UserStatus>,
    pub role: Option<UserRole>,
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<UserFilter>,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(users::list_users(&state.db, filter.status, filter.role).await?))
}

pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(users::profile(&state.db, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    ApiJson(input): ApiJson<UserInput>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = users::create_user(&state.db, &actor, input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UserInput>,
) -> ApiResult<Json<User>> {
    Ok(Json(users::update_user(&state.db, &actor, id, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    users::delete_user(&state.db, &actor, id).await?;
    Ok(MessageResponse::ok("User deleted successfully"))
}

/// `/admin/positions`
///
/// Job positions: paged list, create, show (also serves the edit form), update, delete.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use teamhub_shared::{
    models::position::Position,
    services::{
        catalog::{self, PositionInput},
        pagination::{Page, PageRequest},
    },
};

use crate::{
    app::AppState,
    error::{ApiResult, MessageResponse},
    extract::{ApiPath, ApiQuery, JsonOrForm, RequestActor},
};

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<Json<Page<Position>>> {
    Ok(Json(catalog::list_positions(&state.db, &page).await?))
}

pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Position>> {
    Ok(Json(catalog::get_position(&state.db, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    JsonOrForm(input): JsonOrForm<PositionInput>,
) -> ApiResult<(StatusCode, Json<Position>)> {
    let position = catalog::create_position(&state.db, &actor, input).await?;
    Ok((StatusCode::CREATED, Json(position)))
}

pub async fn update(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    ApiPath(id): ApiPath<i64>,
    JsonOrForm(input): JsonOrForm<PositionInput>,
) -> ApiResult<Json<Position>> {
    Ok(Json(catalog::update_position(&state.db, &actor, id, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    catalog::delete_position(&state.db, &actor, id).await?;
    Ok(MessageResponse::ok("Position deleted successfully"))
}

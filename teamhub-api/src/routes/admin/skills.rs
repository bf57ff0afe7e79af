/// `/admin/skills`
///
/// CRUD plus CSV import (`Name,Description`), a dry-run preview and a
/// sample file.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Response,
    Json,
};
use teamhub_shared::{
    csv::{self as csv_import, skills::SkillRow, CsvImportResult, CsvPreview},
    models::skill::Skill,
    services::{
        catalog::{self, SkillInput},
        pagination::{Page, PageRequest},
    },
};
use tracing::info;

use super::csv_attachment;
use crate::{
    app::AppState,
    error::{ApiResult, MessageResponse},
    extract::{read_upload, ApiPath, ApiQuery, JsonOrForm, RequestActor},
};

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<Json<Page<Skill>>> {
    Ok(Json(catalog::list_skills(&state.db, &page).await?))
}

/// Every live skill, unpaged, for pickers
pub async fn all(State(state): State<AppState>) -> ApiResult<Json<Vec<Skill>>> {
    Ok(Json(catalog::all_skills(&state.db).await?))
}

pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Skill>> {
    Ok(Json(catalog::get_skill(&state.db, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    JsonOrForm(input): JsonOrForm<SkillInput>,
) -> ApiResult<(StatusCode, Json<Skill>)> {
    let skill = catalog::create_skill(&state.db, &actor, input).await?;
    Ok((StatusCode::CREATED, Json(skill)))
}

pub async fn update(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    ApiPath(id): ApiPath<i64>,
    JsonOrForm(input): JsonOrForm<SkillInput>,
) -> ApiResult<Json<Skill>> {
    Ok(Json(catalog::update_skill(&state.db, &actor, id, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    catalog::delete_skill(&state.db, &actor, id).await?;
    Ok(MessageResponse::ok("Skill deleted successfully"))
}

pub async fn import(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    multipart: Multipart,
) -> ApiResult<Json<CsvImportResult>> {
    let bytes = read_upload(multipart).await?;
    let result = csv_import::skills::import(&state.db, actor, &bytes).await?;
    info!(
        imported = result.success_count,
        failed = result.error_count,
        "Skill CSV import finished"
    );
    Ok(Json(result))
}

pub async fn preview(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<CsvPreview<SkillRow>>> {
    let bytes = read_upload(multipart).await?;
    Ok(Json(csv_import::skills::preview(&state.db, &bytes).await?))
}

pub async fn sample() -> ApiResult<Response> {
    csv_attachment("skills_sample.csv", csv_import::skills::sample_csv().into_bytes())
}

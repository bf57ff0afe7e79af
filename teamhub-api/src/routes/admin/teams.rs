/// `/admin/teams`
///
/// CRUD, membership management, statistics, CSV import
/// (`Name,Description,Leader Email`) and export.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Response,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use teamhub_shared::{
    csv::{self as csv_import, teams::TeamRow, CsvImportResult, CsvPreview},
    models::{
        team::Team,
        user::{User, UserStatus},
    },
    services::{
        pagination::{Page, PageRequest},
        teams::{self, TeamDetail, TeamInput, TeamStatistics},
        users,
    },
};
use tracing::info;

use super::csv_attachment;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult, MessageResponse},
    extract::{read_upload, ApiJson, ApiPath, ApiQuery, JsonOrForm, RequestActor},
};

/// Team detail plus the users that can be picked as leader or member
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamEditView {
    pub team: TeamDetail,
    pub available_users: Vec<User>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMembersRequest {
    #[serde(default)]
    pub user_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct AddMembersResponse {
    pub message: String,
    pub success: bool,
    pub added: usize,
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<Json<Page<Team>>> {
    Ok(Json(teams::list_teams(&state.db, &page).await?))
}

pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<TeamDetail>> {
    Ok(Json(teams::team_detail(&state.db, id).await?))
}

pub async fn edit(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<TeamEditView>> {
    let team = teams::team_detail(&state.db, id).await?;
    let available_users = users::list_users(&state.db, Some(UserStatus::Active), None).await?;
    Ok(Json(TeamEditView {
        team,
        available_users,
    }))
}

pub async fn create(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    JsonOrForm(input): JsonOrForm<TeamInput>,
) -> ApiResult<(StatusCode, Json<Team>)> {
    let team = teams::create_team(&state.db, &actor, input).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

pub async fn update(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    ApiPath(id): ApiPath<i64>,
    JsonOrForm(input): JsonOrForm<TeamInput>,
) -> ApiResult<Json<Team>> {
    Ok(Json(teams::update_team(&state.db, &actor, id, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    teams::delete_team(&state.db, &actor, id).await?;
    Ok(MessageResponse::ok("Team deleted successfully"))
}

pub async fn statistics(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<TeamStatistics>> {
    Ok(Json(teams::team_statistics(&state.db, id).await?))
}

pub async fn add_members(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<AddMembersRequest>,
) -> ApiResult<Json<AddMembersResponse>> {
    if req.user_ids.is_empty() {
        return Err(ApiError::BadRequest("Please select at least one user".to_string()));
    }

    let added = teams::add_members(&state.db, &actor, id, &req.user_ids).await?;
    Ok(Json(AddMembersResponse {
        message: format!("{} member(s) added successfully", added),
        success: true,
        added,
    }))
}

pub async fn remove_member(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    ApiPath((id, user_id)): ApiPath<(i64, i64)>,
) -> ApiResult<Json<MessageResponse>> {
    let removed = teams::remove_member(&state.db, &actor, id, user_id).await?;
    Ok(MessageResponse::ok(if removed {
        "Member removed successfully"
    } else {
        "User is not an active member of this team"
    }))
}

pub async fn import(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    multipart: Multipart,
) -> ApiResult<Json<CsvImportResult>> {
    let bytes = read_upload(multipart).await?;
    let result = csv_import::teams::import(&state.db, actor, &bytes).await?;
    info!(
        imported = result.success_count,
        failed = result.error_count,
        "Team CSV import finished"
    );
    Ok(Json(result))
}

pub async fn preview(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<CsvPreview<TeamRow>>> {
    let bytes = read_upload(multipart).await?;
    Ok(Json(csv_import::teams::preview(&state.db, &bytes).await?))
}

pub async fn sample() -> ApiResult<Response> {
    csv_attachment("teams_sample.csv", csv_import::teams::sample_csv().into_bytes())
}

pub async fn export(State(state): State<AppState>) -> ApiResult<Response> {
    let body = csv_import::export::export_teams(&state.db).await?;
    csv_attachment(&csv_import::export::export_filename(Utc::now()), body)
}

/// `/admin/projects`
///
/// Updates carry the `version` the client last read; a stale version is
/// answered with 409. `refresh-status` runs the nightly status pass now,
/// unless it is already running.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use teamhub_shared::{
    models::project::Project,
    services::{
        pagination::{Page, PageRequest},
        projects::{self, ProjectDetail, ProjectInput},
    },
};
use teamhub_worker::scheduler::RunOutcome;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, MessageResponse},
    extract::{ApiJson, ApiPath, ApiQuery, RequestActor},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFilter {
    pub team_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectUpdateRequest {
    #[serde(flatten)]
    pub input: ProjectInput,

    pub version: i64,
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageRequest>,
    ApiQuery(filter): ApiQuery<ProjectFilter>,
) -> ApiResult<Json<Page<Project>>> {
    Ok(Json(projects::list_projects(&state.db, &page, filter.team_id).await?))
}

pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<ProjectDetail>> {
    Ok(Json(projects::project_detail(&state.db, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    ApiJson(input): ApiJson<ProjectInput>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let today = state.scheduler.today();
    let project = projects::create_project(&state.db, &actor, input, today).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<ProjectUpdateRequest>,
) -> ApiResult<Json<Project>> {
    let today = state.scheduler.today();
    Ok(Json(
        projects::update_project(&state.db, &actor, id, req.version, req.input, today).await?,
    ))
}

pub async fn cancel(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Project>> {
    Ok(Json(projects::cancel_project(&state.db, &actor, id).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    RequestActor(actor): RequestActor,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    projects::delete_project(&state.db, &actor, id).await?;
    Ok(MessageResponse::ok("Project deleted successfully"))
}

/// Runs the status refresh immediately
///
/// Answers 409 when a run (nightly or manual) is already in progress.
pub async fn refresh_status(State(state): State<AppState>) -> ApiResult<Json<RunOutcome>> {
    match state.scheduler.trigger_now().await {
        RunOutcome::Skipped => Err(ApiError::Conflict(
            "Project status refresh is already running".to_string(),
        )),
        RunOutcome::Failed { message } => Err(ApiError::InternalError(message)),
        completed => Ok(Json(completed)),
    }
}

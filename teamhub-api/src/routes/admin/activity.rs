/// `GET /admin/activity-logs`, newest first

use axum::{
    extract::State,
    Json,
};
use teamhub_shared::{
    models::activity_log::ActivityLog,
    services::{
        activity,
        pagination::{Page, PageRequest},
    },
};

use crate::{app::AppState, error::ApiResult, extract::ApiQuery};

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<Json<Page<ActivityLog>>> {
    Ok(Json(activity::list_recent(&state.db, &page).await?))
}

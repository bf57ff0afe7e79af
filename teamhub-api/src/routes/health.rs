/// Health check endpoint
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "pool": { "inUse": 1, "idle": 4, "total": 5 },
///   "statusRefreshRunning": false
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::Serialize;
use teamhub_shared::db::pool::{health_check as ping, pool_stats};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolResponse {
    pub in_use: usize,
    pub idle: usize,
    pub total: usize,
}

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,

    pub pool: PoolResponse,

    pub status_refresh_running: bool,
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database_status = match ping(&state.db).await {
        Ok(()) => "connected",
        Err(_) => "disconnected",
    };

    let stats = pool_stats(&state.db);

    Ok(Json(HealthResponse {
        status: if database_status == "connected" {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database_status.to_string(),
        pool: PoolResponse {
            in_use: stats.in_use,
            idle: stats.idle,
            total: stats.total,
        },
        status_refresh_running: state.scheduler.is_running(),
    }))
}

//! Date-derived project status
//!
//! A project's status follows its dates: before the start date it is
//! upcoming, after the end date it is completed, otherwise active. Start and
//! end days both count as active. CANCELLED is set by hand and is never
//! recomputed.
//!
//! [`refresh_all_project_statuses`] is the nightly bulk pass. Each project is
//! written independently with a version check, so a failure or a concurrent
//! edit affects only that project and the scan continues.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, error, info, warn};

use crate::models::project::{Project, ProjectStatus, StatusSnapshot};

/// Calendar date at `now` in the zone statuses are computed in
///
/// Project writes and the nightly refresh both go through this, so they agree
/// on the day even between local and UTC midnight.
pub fn local_today(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// Status implied by the dates alone
pub fn derive_status(start: NaiveDate, end: Option<NaiveDate>, today: NaiveDate) -> ProjectStatus {
    if today < start {
        return ProjectStatus::Upcoming;
    }

    match end {
        Some(end) if today > end => ProjectStatus::Completed,
        _ => ProjectStatus::Active,
    }
}

/// Status a project should have today, keeping a manual cancellation
pub fn next_status(
    current: ProjectStatus,
    start: NaiveDate,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> ProjectStatus {
    if current == ProjectStatus::Cancelled {
        return ProjectStatus::Cancelled;
    }
    derive_status(start, end, today)
}

/// Counters from one refresh pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub scanned: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Projects whose version moved between read and write
    pub conflicts: usize,
    pub failed: usize,
}

/// Outcome for one project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProjectRefresh {
    Unchanged,
    Updated,
    Conflict,
}

async fn refresh_one(
    pool: &PgPool,
    project: &StatusSnapshot,
    today: NaiveDate,
) -> Result<ProjectRefresh, sqlx::Error> {
    let target = next_status(project.status, project.start_date, project.end_date, today);
    if target == project.status {
        return Ok(ProjectRefresh::Unchanged);
    }

    let written = Project::set_status_versioned(pool, project.id, project.version, target).await?;
    if !written {
        return Ok(ProjectRefresh::Conflict);
    }

    debug!(
        project_id = project.id,
        from = project.status.as_str(),
        to = target.as_str(),
        "Project status updated"
    );
    Ok(ProjectRefresh::Updated)
}

/// Recomputes the status of every live project as of `today`
///
/// Only the initial scan can fail the call; per-project errors are logged
/// and counted in [`RefreshSummary::failed`].
pub async fn refresh_all_project_statuses(
    pool: &PgPool,
    today: NaiveDate,
) -> Result<RefreshSummary, sqlx::Error> {
    let projects = Project::status_snapshots(pool).await?;
    let mut summary = RefreshSummary {
        scanned: projects.len(),
        ..Default::default()
    };

    for project in &projects {
        match refresh_one(pool, project, today).await {
            Ok(ProjectRefresh::Unchanged) => summary.unchanged += 1,
            Ok(ProjectRefresh::Updated) => summary.updated += 1,
            Ok(ProjectRefresh::Conflict) => {
                warn!(project_id = project.id, "Project changed during status refresh, skipped");
                summary.conflicts += 1;
            }
            Err(e) => {
                error!(project_id = project.id, error = %e, "Failed to refresh project status");
                summary.failed += 1;
            }
        }
    }

    info!(
        scanned = summary.scanned,
        updated = summary.updated,
        conflicts = summary.conflicts,
        failed = summary.failed,
        %today,
        "Project status refresh finished"
    );

    Ok(summary)
}

/// Activity logging
///
/// Every mutating service call records one entry through [`record`] on the
/// same connection as the change, so the audit row commits or rolls back
/// with it.

use sqlx::{PgConnection, PgPool};

use super::pagination::{Page, PageRequest};
use crate::models::activity_log::{ActivityLog, NewActivityLog};

/// Who triggered a change and from where
#[derive(Debug, Clone, Default)]
pub struct Actor {
    pub user_id: Option<i64>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl Actor {
    /// Background jobs and imports without a request
    pub fn system() -> Self {
        Self::default()
    }

    pub fn user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }
}

/// Action names written to `activity_logs.action`
pub mod actions {
    pub const REGISTER_USER: &str = "REGISTER_USER";
    pub const CREATE_USER: &str = "CREATE_USER";
    pub const UPDATE_USER: &str = "UPDATE_USER";
    pub const DELETE_USER: &str = "DELETE_USER";
    pub const CREATE_TEAM: &str = "CREATE_TEAM";
    pub const UPDATE_TEAM: &str = "UPDATE_TEAM";
    pub const DELETE_TEAM: &str = "DELETE_TEAM";
    pub const ADD_TEAM_MEMBER: &str = "ADD_TEAM_MEMBER";
    pub const REMOVE_TEAM_MEMBER: &str = "REMOVE_TEAM_MEMBER";
    pub const CREATE_PROJECT: &str = "CREATE_PROJECT";
    pub const UPDATE_PROJECT: &str = "UPDATE_PROJECT";
    pub const DELETE_PROJECT: &str = "DELETE_PROJECT";
    pub const CANCEL_PROJECT: &str = "CANCEL_PROJECT";
    pub const CREATE_SKILL: &str = "CREATE_SKILL";
    pub const UPDATE_SKILL: &str = "UPDATE_SKILL";
    pub const DELETE_SKILL: &str = "DELETE_SKILL";
    pub const CREATE_POSITION: &str = "CREATE_POSITION";
    pub const UPDATE_POSITION: &str = "UPDATE_POSITION";
    pub const DELETE_POSITION: &str = "DELETE_POSITION";
}

/// Inserts one audit row inside the caller's transaction
pub async fn record(
    conn: &mut PgConnection,
    actor: &Actor,
    action: &str,
    entity_type: &str,
    entity_id: i64,
    description: impl Into<String>,
) -> Result<ActivityLog, sqlx::Error> {
    ActivityLog::insert(
        conn,
        NewActivityLog {
            action: action.to_string(),
            entity_type: Some(entity_type.to_string()),
            entity_id: Some(entity_id),
            description: Some(description.into()),
            user_id: actor.user_id,
            ip_address: actor.ip_address.clone(),
            user_agent: actor.user_agent.clone(),
        },
    )
    .await
}

/// Newest entries first
pub async fn list_recent(pool: &PgPool, page: &PageRequest) -> Result<Page<ActivityLog>, sqlx::Error> {
    let content = ActivityLog::list_recent(pool, page.limit(), page.offset()).await?;
    let total = ActivityLog::count(pool).await?;
    Ok(Page::new(content, page, total))
}

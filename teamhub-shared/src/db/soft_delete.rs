/// Soft-delete support
///
/// Users, teams, projects, skills and positions are never physically removed;
/// deleting one stamps `deleted_at`. Reads must only ever see live rows, so
/// the schema exposes a `live_<table>` view per entity and every model reads
/// from `T::LIVE_VIEW` instead of the base table. Writes that need the raw
/// row (the delete itself, version-checked updates) go to `T::TABLE`.
///
/// # Example
///
/// ```no_run
/// use teamhub_shared::db::soft_delete::mark_deleted;
/// use teamhub_shared::models::skill::Skill;
///
/// # async fn example(pool: sqlx::PgPool) -> Result<(), sqlx::Error> {
/// let hit = mark_deleted::<Skill, _>(&pool, 42).await?;
/// assert!(hit, "skill 42 was live");
/// # Ok(())
/// # }
/// ```

use sqlx::PgExecutor;

/// An entity whose rows carry a nullable `deleted_at` column
pub trait SoftDelete {
    /// Base table, used for writes
    const TABLE: &'static str;

    /// View over `TABLE` restricted to `deleted_at IS NULL`, used for reads
    const LIVE_VIEW: &'static str;
}

/// Stamps `deleted_at = NOW()` on a live row
///
/// Returns `false` when the id does not exist or was already deleted, so
/// callers can map that to a not-found error.
pub async fn mark_deleted<'e, T, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
where
    T: SoftDelete,
    E: PgExecutor<'e>,
{
    let sql = format!(
        "UPDATE {} SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        T::TABLE
    );

    let result = sqlx::query(&sql).bind(id).execute(executor).await?;
    Ok(result.rows_affected() > 0)
}

/// Counts live rows of an entity
pub async fn count_live<'e, T, E>(executor: E) -> Result<i64, sqlx::Error>
where
    T: SoftDelete,
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT COUNT(*) FROM {}", T::LIVE_VIEW);
    sqlx::query_scalar(&sql).fetch_one(executor).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{position::Position, project::Project, skill::Skill, team::Team, user::User};

    fn assert_view_matches<T: SoftDelete>() {
        assert_eq!(T::LIVE_VIEW, format!("live_{}", T::TABLE));
    }

    #[test]
    fn test_live_views_follow_naming() {
        assert_view_matches::<User>();
        assert_view_matches::<Team>();
        assert_view_matches::<Project>();
        assert_view_matches::<Skill>();
        assert_view_matches::<Position>();
    }
}

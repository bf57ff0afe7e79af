/// Database models
///
/// Each module pairs a row type with the queries that read or write it.
/// Queries are generic over `PgExecutor` so they run equally against the
/// pool or inside a transaction (`&mut *tx`).
///
/// Soft-deletable entities (`user`, `team`, `project`, `skill`, `position`)
/// read from their `live_*` views; see [`crate::db::soft_delete`].
///
/// # Example
///
/// ```no_run
/// use teamhub_shared::models::team::Team;
///
/// # async fn example(pool: sqlx::PgPool) -> Result<(), sqlx::Error> {
/// let mut tx = pool.begin().await?;
/// let team = Team::create(&mut *tx, "Platform", Some("Shared infrastructure")).await?;
/// tx.commit().await?;
///
/// let counts = Team::counts(&pool, team.id).await?;
/// assert_eq!(counts.total_members, 0);
/// # Ok(())
/// # }
/// ```

pub mod activity_log;
pub mod admin_session;
pub mod position;
pub mod project;
pub mod project_leadership;
pub mod project_member;
pub mod skill;
pub mod team;
pub mod team_leadership;
pub mod team_membership;
pub mod user;
pub mod user_position;
pub mod user_skill;

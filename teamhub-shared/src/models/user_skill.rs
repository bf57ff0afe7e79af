/// Skills held by users
///
/// A current skill row has `ended_at` null. Replacing a user's skill set
/// ends the old rows rather than deleting them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSkill {
    pub id: i64,
    pub user_id: i64,
    pub skill_id: i64,
    /// Self-assessed level, 1 to 5
    pub level: Option<i32>,
    pub years_of_experience: Option<f64>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// A user's skill joined with the catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSkillDetail {
    pub skill_id: i64,
    pub skill_name: String,
    pub skill_description: Option<String>,
    pub skill_level: Option<i32>,
    pub years_of_experience: Option<f64>,
    pub started_at: DateTime<Utc>,
}

impl UserSkill {
    pub async fn insert<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: i64,
        skill_id: i64,
        level: Option<i32>,
        years_of_experience: Option<f64>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, UserSkill>(
            r#"
            INSERT INTO user_skills (user_id, skill_id, level, years_of_experience)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(skill_id)
        .bind(level)
        .bind(years_of_experience)
        .fetch_one(executor)
        .await
    }

    /// Ends every current skill row of a user; returns how many were ended
    pub async fn end_all_for_user<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: i64,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_skills SET ended_at = NOW() WHERE user_id = $1 AND ended_at IS NULL",
        )
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn current_for_user<'e, E: PgExecutor<'e>>(
        executor: E,
        user_id: i64,
    ) -> Result<Vec<UserSkillDetail>, sqlx::Error> {
        sqlx::query_as::<_, UserSkillDetail>(
            r#"
            SELECT us.skill_id, s.name AS skill_name, s.description AS skill_description,
                   us.level AS skill_level, us.years_of_experience, us.started_at
            FROM user_skills us
            JOIN live_skills s ON s.id = us.skill_id
            WHERE us.user_id = $1 AND us.ended_at IS NULL
            ORDER BY s.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }
}

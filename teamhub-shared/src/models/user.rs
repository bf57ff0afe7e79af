/// User accounts
///
/// A user holds credentials, a role and an account status. Users are
/// soft-deleted; all lookups read from `live_users`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     birthday DATE,
///     role user_role NOT NULL DEFAULT 'MEMBER',
///     status user_status NOT NULL DEFAULT 'ACTIVE',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use teamhub_shared::models::user::{CreateUser, User, UserRole, UserStatus};
///
/// # async fn example(pool: sqlx::PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     name: "Jane Doe".to_string(),
///     email: "jane@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     birthday: None,
///     role: UserRole::Member,
///     status: UserStatus::Active,
/// })
/// .await?;
///
/// let found = User::find_by_email(&pool, "JANE@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, Postgres, QueryBuilder};
use std::fmt;
use std::str::FromStr;

use crate::db::soft_delete::SoftDelete;

/// Account role, checked by the authorization layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Full access to the admin panel
    Admin,

    /// Regular member; API access only
    Member,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Member => "MEMBER",
        }
    }

    /// Whether this role carries every capability of `required`
    ///
    /// ADMIN includes MEMBER.
    pub fn satisfies(&self, required: UserRole) -> bool {
        match required {
            UserRole::Member => true,
            UserRole::Admin => *self == UserRole::Admin,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(UserRole::Admin),
            "MEMBER" => Ok(UserRole::Member),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Inactive => "INACTIVE",
        }
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(UserStatus::Active),
            "INACTIVE" => Ok(UserStatus::Inactive),
            other => Err(format!("Unknown status: {}", other)),
        }
    }
}

/// A user row
///
/// The password hash never leaves the process: it is skipped on
/// serialization.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,

    pub name: String,

    /// Unique among live users, compared case-insensitively
    pub email: String,

    /// Argon2id PHC string
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub birthday: Option<NaiveDate>,

    pub role: UserRole,

    pub status: UserStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SoftDelete for User {
    const TABLE: &'static str = "users";
    const LIVE_VIEW: &'static str = "live_users";
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    /// Already hashed; plaintext never reaches this layer
    pub password_hash: String,
    pub birthday: Option<NaiveDate>,
    pub role: UserRole,
    pub status: UserStatus,
}

/// Partial update; only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    /// `Some(None)` clears the birthday
    pub birthday: Option<Option<NaiveDate>>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

impl UpdateUser {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.birthday.is_none()
            && self.role.is_none()
            && self.status.is_none()
    }
}

impl User {
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        data: CreateUser,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, birthday, role, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.birthday)
        .bind(data.role)
        .bind(data.status)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM live_users WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Case-insensitive lookup among live users
    pub async fn find_by_email<'e, E: PgExecutor<'e>>(
        executor: E,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM live_users WHERE LOWER(email) = LOWER($1)")
            .bind(email.trim())
            .fetch_optional(executor)
            .await
    }

    /// Whether a live user other than `exclude_id` already uses this email
    pub async fn email_taken<'e, E: PgExecutor<'e>>(
        executor: E,
        email: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM live_users
                WHERE LOWER(email) = LOWER($1) AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email.trim())
        .bind(exclude_id)
        .fetch_one(executor)
        .await
    }

    /// Lists live users, optionally filtered by status and role, ordered by name
    pub async fn list<'e, E: PgExecutor<'e>>(
        executor: E,
        status: Option<UserStatus>,
        role: Option<UserRole>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM live_users
            WHERE ($1::user_status IS NULL OR status = $1)
              AND ($2::user_role IS NULL OR role = $2)
            ORDER BY name ASC, id ASC
            "#,
        )
        .bind(status)
        .bind(role)
        .fetch_all(executor)
        .await
    }

    /// Applies a partial update to a live user
    ///
    /// Returns `None` when the user does not exist or is deleted.
    pub async fn update<'e, E: PgExecutor<'e>>(
        executor: E,
        id: i64,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(executor, id).await;
        }

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET updated_at = NOW()");

        if let Some(name) = data.name {
            query.push(", name = ").push_bind(name);
        }
        if let Some(email) = data.email {
            query.push(", email = ").push_bind(email);
        }
        if let Some(password_hash) = data.password_hash {
            query.push(", password_hash = ").push_bind(password_hash);
        }
        if let Some(birthday) = data.birthday {
            query.push(", birthday = ").push_bind(birthday);
        }
        if let Some(role) = data.role {
            query.push(", role = ").push_bind(role);
        }
        if let Some(status) = data.status {
            query.push(", status = ").push_bind(status);
        }

        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND deleted_at IS NULL RETURNING *");

        query.build_query_as::<User>().fetch_optional(executor).await
    }

    /// Loads several live users at once; missing ids are simply absent
    pub async fn find_many<'e, E: PgExecutor<'e>>(
        executor: E,
        ids: &[i64],
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM live_users WHERE id = ANY($1) ORDER BY name ASC")
            .bind(ids)
            .fetch_all(executor)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_satisfies() {
        assert!(UserRole::Admin.satisfies(UserRole::Admin));
        assert!(UserRole::Admin.satisfies(UserRole::Member));
        assert!(UserRole::Member.satisfies(UserRole::Member));
        assert!(!UserRole::Member.satisfies(UserRole::Admin));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<UserRole>(), Ok(UserRole::Admin));
        assert_eq!(" MEMBER ".parse::<UserRole>(), Ok(UserRole::Member));
        assert!("owner".parse::<UserRole>().is_err());
        assert_eq!(UserRole::Admin.to_string(), "ADMIN");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("inactive".parse::<UserStatus>(), Ok(UserStatus::Inactive));
        assert_eq!(UserStatus::Active.as_str(), "ACTIVE");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: 1,
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: "secret-hash".to_string(),
            birthday: None,
            role: UserRole::Member,
            status: UserStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("\"role\":\"MEMBER\""));
    }

    #[test]
    fn test_empty_update_detected() {
        assert!(UpdateUser::default().is_empty());
        assert!(!UpdateUser {
            birthday: Some(None),
            ..Default::default()
        }
        .is_empty());
    }
}

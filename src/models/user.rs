use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use validator::Validate;

use crate::error::AppError;

/// Account role, controlling access to administrative operations.
/// Corresponds to the `user_role` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular account.
    User,
    /// May delete boards and manage boards that have no recorded creator.
    Admin,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// A user row as stored in the database. Never serialized to clients
/// directly; handlers convert to [`UserOut`] to keep the password hash out
/// of responses.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    /// Blob-store file name of the avatar, if one was uploaded.
    pub avatar_url: Option<String>,
    pub role: UserRole,
    /// Running count of tasks closed with this user responsible.
    pub closed_tasks_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Client-facing representation of a user.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserOut {
    pub id: i32,
    pub username: String,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub closed_tasks_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserOut {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            avatar_url: user.avatar_url,
            role: user.role,
            closed_tasks_count: user.closed_tasks_count,
            created_at: user.created_at,
        }
    }
}

/// Partial profile update. Only the fields listed here are patchable;
/// any other key in the request body is rejected at deserialization.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UserUpdate {
    #[validate(
        length(min = 3, max = 32),
        regex(
            path = "crate::auth::USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: Option<String>,
    #[validate(length(min = 6))]
    pub password: Option<String>,
}

impl User {
    pub async fn create(
        pool: &PgPool,
        username: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash)
             VALUES ($1, $2)
             RETURNING id, username, password_hash, avatar_url, role, closed_tasks_count, created_at",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, avatar_url, role, closed_tasks_count, created_at
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, avatar_url, role, closed_tasks_count, created_at
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, avatar_url, role, closed_tasks_count, created_at
             FROM users ORDER BY id",
        )
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Applies a partial profile update. Absent fields keep their current
    /// value. The password arrives here already hashed.
    pub async fn update(
        pool: &PgPool,
        id: i32,
        username: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users
             SET username = COALESCE($1, username),
                 password_hash = COALESCE($2, password_hash)
             WHERE id = $3
             RETURNING id, username, password_hash, avatar_url, role, closed_tasks_count, created_at",
        )
        .bind(username)
        .bind(password_hash)
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Points the avatar reference at a new blob, or clears it with `None`.
    pub async fn set_avatar(
        pool: &PgPool,
        id: i32,
        avatar_url: Option<&str>,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET avatar_url = $1 WHERE id = $2
             RETURNING id, username, password_hash, avatar_url, role, closed_tasks_count, created_at",
        )
        .bind(avatar_url)
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Removes the user. Membership rows go with it via FK cascade; tasks the
    /// user created survive with a null creator.
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_user_out_omits_password_hash() {
        let user = User {
            id: 1,
            username: "testuser".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            avatar_url: None,
            role: UserRole::User,
            closed_tasks_count: 0,
            created_at: Utc::now(),
        };

        let out = UserOut::from(user);
        let json = serde_json::to_value(&out).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "testuser");
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_user_update_validation() {
        let valid = UserUpdate {
            username: Some("new_name".to_string()),
            password: None,
        };
        assert!(valid.validate().is_ok());

        let bad_username = UserUpdate {
            username: Some("bad name!".to_string()),
            password: None,
        };
        assert!(bad_username.validate().is_err());

        let short_password = UserUpdate {
            username: None,
            password: Some("123".to_string()),
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_user_update_rejects_unknown_fields() {
        // role is deliberately not patchable through the profile endpoint
        let result: Result<UserUpdate, _> = serde_json::from_value(serde_json::json!({
            "username": "new_name",
            "role": "admin"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_role_is_admin() {
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::User.is_admin());
    }
}

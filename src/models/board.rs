use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use validator::Validate;

use crate::error::AppError;

/// A board groups tasks and members. Board titles are unique.
///
/// `creator_id` records who created the board and gates membership edits.
/// It is nullable so that deleting the creator leaves the board behind;
/// such boards can then only be managed by admins.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Board {
    pub id: i32,
    pub title: String,
    pub creator_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct BoardInput {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
}

/// Partial board update. Only the title is patchable.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct BoardUpdate {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,
}

/// Board plus its member list, returned by the single-board read.
#[derive(Debug, Serialize, Deserialize)]
pub struct BoardDetail {
    #[serde(flatten)]
    pub board: Board,
    pub member_ids: Vec<i32>,
}

/// Payload for the membership add/remove endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct BoardUserModify {
    pub user_id: i32,
}

/// Payload for the task add/remove endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskToBoard {
    pub task_id: i32,
}

impl Board {
    pub async fn create(pool: &PgPool, title: &str, creator_id: i32) -> Result<Board, AppError> {
        let board = sqlx::query_as::<_, Board>(
            "INSERT INTO boards (title, creator_id) VALUES ($1, $2)
             RETURNING id, title, creator_id, created_at",
        )
        .bind(title)
        .bind(creator_id)
        .fetch_one(pool)
        .await?;

        Ok(board)
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Board>, AppError> {
        let board = sqlx::query_as::<_, Board>(
            "SELECT id, title, creator_id, created_at FROM boards WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(board)
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Board>, AppError> {
        let boards = sqlx::query_as::<_, Board>(
            "SELECT id, title, creator_id, created_at FROM boards ORDER BY id",
        )
        .fetch_all(pool)
        .await?;

        Ok(boards)
    }

    pub async fn update(pool: &PgPool, id: i32, update: &BoardUpdate) -> Result<Board, AppError> {
        let board = sqlx::query_as::<_, Board>(
            "UPDATE boards SET title = COALESCE($1, title) WHERE id = $2
             RETURNING id, title, creator_id, created_at",
        )
        .bind(&update.title)
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(board)
    }

    /// Removes the board. Tasks still on the board and all membership rows
    /// are deleted by the FK cascade; member users are untouched.
    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Adds a user to the board. Adding an existing member is a no-op, so a
    /// double add leaves exactly one membership row.
    pub async fn add_user(pool: &PgPool, board_id: i32, user_id: i32) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO board_users (board_id, user_id) VALUES ($1, $2)
             ON CONFLICT (board_id, user_id) DO NOTHING",
        )
        .bind(board_id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Removes a user from the board; a non-member is a no-op.
    pub async fn remove_user(pool: &PgPool, board_id: i32, user_id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM board_users WHERE board_id = $1 AND user_id = $2")
            .bind(board_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists the ids of the board's members.
    pub async fn member_ids(pool: &PgPool, board_id: i32) -> Result<Vec<i32>, AppError> {
        let ids: Vec<i32> = sqlx::query_scalar(
            "SELECT user_id FROM board_users WHERE board_id = $1 ORDER BY user_id",
        )
        .bind(board_id)
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }

    /// Puts a task on this board by flipping its board reference.
    pub async fn add_task(pool: &PgPool, board_id: i32, task_id: i32) -> Result<(), AppError> {
        sqlx::query("UPDATE tasks SET board_id = $1 WHERE id = $2")
            .bind(board_id)
            .bind(task_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Takes a task off this board. Returns false when the task was not on
    /// this board (including when it sits on a different one).
    pub async fn remove_task(pool: &PgPool, board_id: i32, task_id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE tasks SET board_id = NULL WHERE id = $1 AND board_id = $2")
            .bind(task_id)
            .bind(board_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

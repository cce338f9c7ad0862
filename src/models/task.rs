use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use validator::Validate;

use crate::error::AppError;

/// Terminal status written by the close operation.
pub const STATUS_DONE: &str = "Done";

const TASK_COLUMNS: &str = "id, title, description, priority, status, created_at, updated_at, \
                            pdf_path, creator_id, responsible_id, board_id";

/// A task entity as stored in the database and returned by the API.
///
/// `creator_id` is set once at creation and never patched. It is nullable
/// because deleting a user leaves their tasks behind with a dangling creator.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    /// Free-form priority label, e.g. "High".
    pub priority: Option<String>,
    /// Free-form status label, e.g. "Open", "In Progress", "Done".
    pub status: String,
    pub created_at: DateTime<Utc>,
    /// Stamped on every mutation; null until the task is first updated.
    pub updated_at: Option<DateTime<Utc>>,
    /// Blob-store file name of the attached PDF, if any.
    pub pdf_path: Option<String>,
    pub creator_id: Option<i32>,
    pub responsible_id: Option<i32>,
    pub board_id: Option<i32>,
}

/// Input structure for creating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    #[validate(length(max = 50))]
    pub priority: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub status: String,

    pub responsible_id: Option<i32>,
}

/// Partial task update. Only the fields listed here are patchable; any other
/// key in the request body is rejected at deserialization. Absent fields keep
/// their current value.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    #[validate(length(max = 50))]
    pub priority: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub status: Option<String>,

    pub responsible_id: Option<i32>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.responsible_id.is_none()
    }
}

/// Payload for the responsibility reassignment endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct AssignRequest {
    pub user_id: i32,
}

impl Task {
    pub async fn create(
        pool: &PgPool,
        input: &TaskInput,
        creator_id: i32,
    ) -> Result<Task, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (title, description, priority, status, creator_id, responsible_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.priority)
        .bind(&input.status)
        .bind(creator_id)
        .bind(input.responsible_id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Task>, AppError> {
        let task =
            sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(task)
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    pub async fn list_by_creator(pool: &PgPool, creator_id: i32) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE creator_id = $1 ORDER BY created_at DESC"
        ))
        .bind(creator_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    pub async fn list_by_board(pool: &PgPool, board_id: i32) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE board_id = $1 ORDER BY created_at DESC"
        ))
        .bind(board_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Applies a partial update in a single statement and stamps `updated_at`.
    pub async fn update(pool: &PgPool, id: i32, update: &TaskUpdate) -> Result<Task, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks
             SET title = COALESCE($1, title),
                 description = COALESCE($2, description),
                 priority = COALESCE($3, priority),
                 status = COALESCE($4, status),
                 responsible_id = COALESCE($5, responsible_id),
                 updated_at = NOW()
             WHERE id = $6
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.priority)
        .bind(&update.status)
        .bind(update.responsible_id)
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    pub async fn assign(pool: &PgPool, id: i32, responsible_id: i32) -> Result<Task, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET responsible_id = $1, updated_at = NOW() WHERE id = $2
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(responsible_id)
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Marks the task done and bumps the closed-task counter of the
    /// responsible user (falling back to the creator when nobody is assigned).
    ///
    /// Both writes happen in one transaction. Closing an already-done task is
    /// a no-op: the status update matches zero rows, nothing is incremented,
    /// and the task is returned unchanged.
    pub async fn close(pool: &PgPool, id: i32) -> Result<Task, AppError> {
        let mut tx = pool.begin().await?;

        let closed = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET status = $1, updated_at = NOW()
             WHERE id = $2 AND status <> $1
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(STATUS_DONE)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        match closed {
            Some(task) => {
                if let Some(user_id) = task.responsible_id.or(task.creator_id) {
                    sqlx::query(
                        "UPDATE users SET closed_tasks_count = closed_tasks_count + 1
                         WHERE id = $1",
                    )
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
                }
                tx.commit().await?;
                Ok(task)
            }
            None => {
                tx.rollback().await?;
                // Either the task is already done or it does not exist.
                Task::find_by_id(pool, id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Task not found".into()))
            }
        }
    }

    pub async fn set_pdf(pool: &PgPool, id: i32, pdf_path: Option<&str>) -> Result<Task, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET pdf_path = $1, updated_at = NOW() WHERE id = $2
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(pdf_path)
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

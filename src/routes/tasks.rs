use crate::{
    auth::AuthenticatedUser,
    authz,
    error::AppError,
    models::{AssignRequest, Task, TaskInput, TaskUpdate, User},
    storage::{validate_upload, BlobStore, PDF_CONTENT_TYPE},
};
use actix_web::{delete, get, patch, post, put, web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Retrieves all tasks, most recent first.
#[get("/tasks")]
pub async fn get_tasks(pool: web::Data<PgPool>) -> Result<impl Responder, AppError> {
    let tasks = Task::list_all(&pool).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Retrieves the tasks created by the authenticated user.
#[get("/tasks_by_user_id")]
pub async fn get_my_tasks(
    pool: web::Data<PgPool>,
    acting: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let tasks = Task::list_by_creator(&pool, acting.0.id).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task with the authenticated user as creator.
///
/// ## Request Body:
/// A JSON object with:
/// - `title`: The title of the task (required, 1-200 chars).
/// - `description` (optional): A description of the task.
/// - `priority` (optional): Free-form priority label (e.g. "High").
/// - `status`: Free-form status label (e.g. "Open").
/// - `responsible_id` (optional): User to hold responsibility from the start.
///
/// ## Responses:
/// - `201 Created`: Returns the newly created task.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `404 Not Found`: If `responsible_id` does not refer to an existing user.
/// - `422 Unprocessable Entity`: If input validation fails.
#[post("/tasks")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    task_data: web::Json<TaskInput>,
    acting: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    if let Some(responsible_id) = task_data.responsible_id {
        User::find_by_id(&pool, responsible_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Responsible user not found".into()))?;
    }

    let task = Task::create(&pool, &task_data, acting.0.id).await?;

    Ok(HttpResponse::Created().json(task))
}

/// Retrieves a specific task by its ID.
#[get("/tasks/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let task = Task::find_by_id(&pool, task_id.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(task))
}

/// Partially updates a task.
///
/// Only the task's creator may patch it. The patchable fields are `title`,
/// `description`, `priority`, `status`, and `responsible_id`; any other key
/// in the body is rejected. Absent fields keep their current value. The
/// creator reference itself is fixed at creation and cannot be changed.
///
/// ## Responses:
/// - `200 OK`: Returns the updated task.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `403 Forbidden`: If the caller is not the task's creator.
/// - `404 Not Found`: If the task (or a referenced user) does not exist.
/// - `422 Unprocessable Entity`: If input validation fails.
#[patch("/tasks/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<i32>,
    update: web::Json<TaskUpdate>,
    acting: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    update.validate()?;
    let id = task_id.into_inner();

    let task = Task::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
    authz::ensure_task_creator(&task, &acting.0)?;

    if let Some(responsible_id) = update.responsible_id {
        User::find_by_id(&pool, responsible_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Responsible user not found".into()))?;
    }

    if update.is_empty() {
        return Ok(HttpResponse::Ok().json(task));
    }

    let task = Task::update(&pool, id, &update).await?;

    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task. Creator-only. Removing the task also detaches it from any
/// board; an attached PDF blob is removed best-effort afterwards.
#[delete("/tasks/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    blobs: web::Data<BlobStore>,
    task_id: web::Path<i32>,
    acting: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let id = task_id.into_inner();

    let task = Task::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
    authz::ensure_task_creator(&task, &acting.0)?;

    Task::delete(&pool, id).await?;

    if let Some(pdf) = &task.pdf_path {
        if let Err(e) = blobs.delete(pdf).await {
            log::warn!("Failed to remove PDF blob {} for deleted task: {}", pdf, e);
        }
    }

    Ok(HttpResponse::NoContent().finish())
}

/// Reassigns the responsible user of a task. Creator-only.
#[put("/tasks/{id}/assign")]
pub async fn assign_responsible(
    pool: web::Data<PgPool>,
    task_id: web::Path<i32>,
    assign: web::Json<AssignRequest>,
    acting: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let id = task_id.into_inner();

    let task = Task::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
    authz::ensure_task_creator(&task, &acting.0)?;

    User::find_by_id(&pool, assign.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Responsible user not found".into()))?;

    let task = Task::assign(&pool, id, assign.user_id).await?;

    Ok(HttpResponse::Ok().json(task))
}

/// Closes a task: sets the terminal "Done" status, stamps the update time,
/// and increments the responsible user's closed-task counter, all in one
/// transaction. Closing an already-done task changes nothing and does not
/// bump any counter a second time.
#[put("/tasks/{id}/close")]
pub async fn close_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let task = Task::close(&pool, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Attaches a PDF document to a task.
///
/// The document arrives as the raw request body and must be
/// `application/pdf`, non-empty, and at most 5 MiB. The blob is written
/// first and the reference committed second; a failed commit removes the
/// orphaned blob, and a replaced document's old blob is deleted after the
/// new reference is in place.
#[post("/tasks/{id}/upload_pdf")]
pub async fn upload_pdf(
    pool: web::Data<PgPool>,
    blobs: web::Data<BlobStore>,
    task_id: web::Path<i32>,
    body: web::Bytes,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let id = task_id.into_inner();

    let task = Task::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    let content_type = req
        .headers()
        .get("Content-Type")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned());
    validate_upload(content_type.as_deref(), body.len(), &[PDF_CONTENT_TYPE])?;

    let name = blobs.save(&body, PDF_CONTENT_TYPE).await?;

    let previous = task.pdf_path.clone();
    let task = match Task::set_pdf(&pool, id, Some(&name)).await {
        Ok(task) => task,
        Err(e) => {
            if let Err(cleanup) = blobs.delete(&name).await {
                log::warn!("Failed to remove orphaned PDF blob {}: {}", name, cleanup);
            }
            return Err(e);
        }
    };

    if let Some(old) = previous {
        if let Err(e) = blobs.delete(&old).await {
            log::warn!("Failed to remove replaced PDF blob {}: {}", old, e);
        }
    }

    Ok(HttpResponse::Ok().json(task))
}

/// Removes a task's PDF document. Clears the reference first, then removes
/// the blob best-effort. Returns a 404 when the task has no document.
#[delete("/tasks/{id}/delete_pdf")]
pub async fn delete_pdf(
    pool: web::Data<PgPool>,
    blobs: web::Data<BlobStore>,
    task_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let id = task_id.into_inner();

    let task = Task::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    let pdf = task
        .pdf_path
        .clone()
        .ok_or_else(|| AppError::NotFound("Task has no PDF attached".into()))?;

    let task = Task::set_pdf(&pool, id, None).await?;

    if let Err(e) = blobs.delete(&pdf).await {
        log::warn!("Failed to remove PDF blob {}: {}", pdf, e);
    }

    Ok(HttpResponse::Ok().json(task))
}

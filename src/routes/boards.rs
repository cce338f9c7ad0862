use crate::{
    auth::AuthenticatedUser,
    authz,
    error::AppError,
    models::{Board, BoardDetail, BoardInput, BoardUpdate, BoardUserModify, Task, TaskToBoard, User},
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// Retrieves all boards.
#[get("/boards")]
pub async fn list_boards(pool: web::Data<PgPool>) -> Result<impl Responder, AppError> {
    let boards = Board::list(&pool).await?;
    Ok(HttpResponse::Ok().json(boards))
}

/// Retrieves a single board by ID, including its member list.
#[get("/boards/{id}")]
pub async fn get_board(
    pool: web::Data<PgPool>,
    board_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let id = board_id.into_inner();

    let board = Board::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Board not found".into()))?;
    let member_ids = Board::member_ids(&pool, id).await?;

    Ok(HttpResponse::Ok().json(BoardDetail { board, member_ids }))
}

/// Creates a new board with the authenticated user recorded as its creator.
/// Board titles are unique; a duplicate yields a 409.
#[post("/boards")]
pub async fn create_board(
    pool: web::Data<PgPool>,
    board_data: web::Json<BoardInput>,
    acting: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    board_data.validate()?;

    let board = Board::create(&pool, &board_data.title, acting.0.id).await?;

    Ok(HttpResponse::Created().json(board))
}

/// Renames a board. Reserved for the board's creator (admins may manage
/// boards whose creator is gone).
#[patch("/boards/{id}")]
pub async fn update_board(
    pool: web::Data<PgPool>,
    board_id: web::Path<i32>,
    update: web::Json<BoardUpdate>,
    acting: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    update.validate()?;
    let id = board_id.into_inner();

    let board = Board::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Board not found".into()))?;
    authz::ensure_board_creator(&board, &acting.0)?;

    let board = Board::update(&pool, id, &update).await?;

    Ok(HttpResponse::Ok().json(board))
}

/// Deletes a board. Admin-only.
///
/// Tasks that still belong to the board are deleted with it, and all
/// membership rows are removed; the member users themselves are untouched.
#[delete("/boards/{id}")]
pub async fn delete_board(
    pool: web::Data<PgPool>,
    board_id: web::Path<i32>,
    acting: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let id = board_id.into_inner();

    Board::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Board not found".into()))?;
    authz::ensure_admin(&acting.0)?;

    Board::delete(&pool, id).await?;

    Ok(HttpResponse::Ok().json(json!({ "detail": "Board deleted" })))
}

/// Adds a user to a board. Board-creator only.
///
/// Adding a user who is already a member is a no-op; there is never more
/// than one membership row per (board, user) pair.
#[post("/boards/{id}/users/add")]
pub async fn add_user(
    pool: web::Data<PgPool>,
    board_id: web::Path<i32>,
    data: web::Json<BoardUserModify>,
    acting: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let id = board_id.into_inner();

    let board = Board::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Board not found".into()))?;
    authz::ensure_board_creator(&board, &acting.0)?;

    User::find_by_id(&pool, data.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Board::add_user(&pool, id, data.user_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "detail": "User added" })))
}

/// Removes a user from a board. Board-creator only. Removing a non-member
/// is a no-op.
#[post("/boards/{id}/users/remove")]
pub async fn remove_user(
    pool: web::Data<PgPool>,
    board_id: web::Path<i32>,
    data: web::Json<BoardUserModify>,
    acting: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let id = board_id.into_inner();

    let board = Board::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Board not found".into()))?;
    authz::ensure_board_creator(&board, &acting.0)?;

    User::find_by_id(&pool, data.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Board::remove_user(&pool, id, data.user_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "detail": "User removed" })))
}

/// Puts a task on a board. Board-creator only.
#[post("/boards/{id}/tasks/add")]
pub async fn add_task(
    pool: web::Data<PgPool>,
    board_id: web::Path<i32>,
    data: web::Json<TaskToBoard>,
    acting: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let id = board_id.into_inner();

    let board = Board::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Board not found".into()))?;
    authz::ensure_board_creator(&board, &acting.0)?;

    Task::find_by_id(&pool, data.task_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Board::add_task(&pool, id, data.task_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "detail": "Task added to board" })))
}

/// Takes a task off a board. Board-creator only. A task that is not on this
/// board is a no-op.
#[post("/boards/{id}/tasks/remove")]
pub async fn remove_task(
    pool: web::Data<PgPool>,
    board_id: web::Path<i32>,
    data: web::Json<TaskToBoard>,
    acting: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let id = board_id.into_inner();

    let board = Board::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Board not found".into()))?;
    authz::ensure_board_creator(&board, &acting.0)?;

    Task::find_by_id(&pool, data.task_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Board::remove_task(&pool, id, data.task_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "detail": "Task removed from board" })))
}

/// Lists the tasks currently on a board.
#[get("/boards/{id}/tasks")]
pub async fn board_tasks(
    pool: web::Data<PgPool>,
    board_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let id = board_id.into_inner();

    Board::find_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Board not found".into()))?;

    let tasks = Task::list_by_board(&pool, id).await?;

    Ok(HttpResponse::Ok().json(tasks))
}

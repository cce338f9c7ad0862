use crate::{
    auth::{hash_password, AuthenticatedUser},
    authz,
    error::AppError,
    models::{User, UserOut, UserUpdate},
    storage::{validate_upload, BlobStore, AVATAR_CONTENT_TYPES},
};
use actix_web::{delete, get, patch, post, web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Retrieves all users. Password hashes are never included.
#[get("/users")]
pub async fn list_users(pool: web::Data<PgPool>) -> Result<impl Responder, AppError> {
    let users = User::list(&pool).await?;
    let out: Vec<UserOut> = users.into_iter().map(UserOut::from).collect();
    Ok(HttpResponse::Ok().json(out))
}

/// Retrieves a single user by ID.
#[get("/users/{id}")]
pub async fn get_user(
    pool: web::Data<PgPool>,
    user_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let user = User::find_by_id(&pool, user_id.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(HttpResponse::Ok().json(UserOut::from(user)))
}

/// Updates the caller's own profile.
///
/// Only `username` and `password` are patchable; the update payload rejects
/// any other field. Patching someone else's profile yields a 403.
///
/// ## Responses:
/// - `200 OK`: Returns the updated user.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `403 Forbidden`: If the target is not the acting user.
/// - `404 Not Found`: If the target user does not exist.
/// - `409 Conflict`: If the new username is already taken.
/// - `422 Unprocessable Entity`: If input validation fails.
#[patch("/users/{id}")]
pub async fn update_user(
    pool: web::Data<PgPool>,
    user_id: web::Path<i32>,
    update: web::Json<UserUpdate>,
    acting: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    update.validate()?;
    let target_id = user_id.into_inner();

    User::find_by_id(&pool, target_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    authz::ensure_self(&acting.0, target_id)?;

    let password_hash = match &update.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let user = User::update(
        &pool,
        target_id,
        update.username.as_deref(),
        password_hash.as_deref(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(UserOut::from(user)))
}

/// Deletes the caller's own account.
///
/// Board memberships disappear with the account; created tasks survive with
/// a dangling creator. The avatar blob is removed best-effort afterwards.
#[delete("/users/{id}")]
pub async fn delete_user(
    pool: web::Data<PgPool>,
    blobs: web::Data<BlobStore>,
    user_id: web::Path<i32>,
    acting: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let target_id = user_id.into_inner();

    let target = User::find_by_id(&pool, target_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    authz::ensure_self(&acting.0, target_id)?;

    User::delete(&pool, target_id).await?;

    if let Some(avatar) = &target.avatar_url {
        if let Err(e) = blobs.delete(avatar).await {
            log::warn!("Failed to remove avatar blob {} for deleted user: {}", avatar, e);
        }
    }

    Ok(HttpResponse::NoContent().finish())
}

/// Uploads an avatar for the caller's own account.
///
/// The image arrives as the raw request body; its `Content-Type` must be one
/// of the accepted image types and the body must be non-empty and at most
/// 5 MiB. The blob is written first and the reference committed second; if
/// the commit fails the orphaned blob is removed. A previous avatar blob is
/// deleted once the new reference is in place.
///
/// ## Responses:
/// - `200 OK`: Returns the updated user with the new `avatar_url`.
/// - `400 Bad Request`: Empty body.
/// - `401 Unauthorized` / `403 Forbidden`: Token missing or not the account owner.
/// - `413 Payload Too Large`: Body exceeds 5 MiB.
/// - `415 Unsupported Media Type`: Not an accepted image type.
#[post("/users/{id}/avatar")]
pub async fn upload_avatar(
    pool: web::Data<PgPool>,
    blobs: web::Data<BlobStore>,
    user_id: web::Path<i32>,
    body: web::Bytes,
    req: HttpRequest,
    acting: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let target_id = user_id.into_inner();
    authz::ensure_self(&acting.0, target_id)?;

    let content_type = req
        .headers()
        .get("Content-Type")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned());
    validate_upload(content_type.as_deref(), body.len(), &AVATAR_CONTENT_TYPES)?;

    let name = blobs
        .save(&body, content_type.as_deref().unwrap_or_default())
        .await?;

    let previous = acting.0.avatar_url.clone();
    let user = match User::set_avatar(&pool, target_id, Some(&name)).await {
        Ok(user) => user,
        Err(e) => {
            // Reference commit failed: do not leave the blob behind.
            if let Err(cleanup) = blobs.delete(&name).await {
                log::warn!("Failed to remove orphaned avatar blob {}: {}", name, cleanup);
            }
            return Err(e);
        }
    };

    if let Some(old) = previous {
        if let Err(e) = blobs.delete(&old).await {
            log::warn!("Failed to remove replaced avatar blob {}: {}", old, e);
        }
    }

    Ok(HttpResponse::Ok().json(UserOut::from(user)))
}

/// Deletes the caller's avatar.
///
/// Clears the reference first, then removes the blob best-effort. Returns a
/// 404 when the account has no avatar.
#[delete("/users/{id}/avatar")]
pub async fn delete_avatar(
    pool: web::Data<PgPool>,
    blobs: web::Data<BlobStore>,
    user_id: web::Path<i32>,
    acting: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let target_id = user_id.into_inner();
    authz::ensure_self(&acting.0, target_id)?;

    let avatar = acting
        .0
        .avatar_url
        .clone()
        .ok_or_else(|| AppError::NotFound("User has no avatar".into()))?;

    let user = User::set_avatar(&pool, target_id, None).await?;

    if let Err(e) = blobs.delete(&avatar).await {
        log::warn!("Failed to remove avatar blob {}: {}", avatar, e);
    }

    Ok(HttpResponse::Ok().json(UserOut::from(user)))
}

use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use sqlx::PgPool;

use crate::auth::token::verify_token;
use crate::error::AppError;
use crate::models::User;

/// Extracts the acting user for protected routes.
///
/// Parses the `Authorization: Bearer <token>` header, verifies the token
/// signature and expiry, then resolves the `sub` claim back to a user row.
/// A token whose username no longer resolves (the account was deleted after
/// the token was issued) is rejected the same way as a bad token.
///
/// Handlers that take this extractor as an argument are the protected ones;
/// handlers without it are public. Failures are returned as
/// `AppError::Unauthorized`, which renders as a 401 response.
#[derive(Debug)]
pub struct AuthenticatedUser(pub User);

/// Pulls the bearer token out of the `Authorization` header, if present.
pub(crate) fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned)
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError; // AppError is converted into ActixError via ResponseError
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let pool = req.app_data::<web::Data<PgPool>>().cloned();

        Box::pin(async move {
            let token =
                token.ok_or_else(|| AppError::Unauthorized("Missing token".to_string()))?;
            let claims = verify_token(&token)?;

            let pool = pool.ok_or_else(|| {
                // Only reachable when the app factory forgot to register the pool.
                AppError::InternalServerError("Database pool not configured".to_string())
            })?;

            let user = User::find_by_username(pool.get_ref(), &claims.sub)
                .await?
                .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

            Ok(AuthenticatedUser(user))
        })
    }
}

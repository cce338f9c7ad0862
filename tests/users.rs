use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{http::header, test, web, App};
use dotenv::dotenv;
use serde_json::json;
use sqlx::PgPool;
use taskdeck::routes;
use taskdeck::routes::health;
use taskdeck::storage::{BlobStore, MAX_UPLOAD_BYTES};

struct TestUser {
    id: i32,
    token: String,
}

async fn setup_pool() -> PgPool {
    dotenv().ok();
    if std::env::var("JWT_SECRET").is_err() {
        std::env::set_var("JWT_SECRET", "integration-test-secret");
    }
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB")
}

async fn test_blobs() -> BlobStore {
    let store = BlobStore::new(std::env::temp_dir().join("taskdeck-test-blobs"));
    store.init().await.expect("Failed to init test blob store");
    store
}

async fn register_user(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    username: &str,
    password: &str,
) -> Result<TestUser, String> {
    let req = test::TestRequest::post()
        .uri("/users/register")
        .set_json(&json!({"username": username, "password": password}))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    if !status.is_success() {
        return Err(format!(
            "Failed to register user. Status: {}. Body: {}",
            status,
            String::from_utf8_lossy(&body)
        ));
    }
    let auth: taskdeck::auth::AuthResponse =
        serde_json::from_slice(&body).map_err(|e| format!("Bad auth response: {}", e))?;
    Ok(TestUser {
        id: auth.user_id,
        token: auth.token,
    })
}

async fn cleanup_user(pool: &PgPool, username: &str) {
    let _ = sqlx::query("DELETE FROM users WHERE username = $1")
        .bind(username)
        .execute(pool)
        .await;
}

macro_rules! build_app {
    ($pool:expr, $blobs:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new($blobs.clone()))
                .app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES + 1))
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header()
                        .max_age(3600),
                )
                .wrap(Logger::default())
                .service(health::health)
                .configure(routes::config),
        )
        .await
    };
}

#[actix_rt::test]
async fn test_profile_update_is_self_only() {
    let pool = setup_pool().await;
    let blobs = test_blobs().await;
    let app = build_app!(pool, blobs);

    cleanup_user(&pool, "profile_alice").await;
    cleanup_user(&pool, "profile_alice_renamed").await;
    cleanup_user(&pool, "profile_bob").await;

    let alice = register_user(&app, "profile_alice", "Password123!")
        .await
        .expect("Failed to register alice");
    let bob = register_user(&app, "profile_bob", "Password123!")
        .await
        .expect("Failed to register bob");

    // Bob cannot patch alice's profile
    let req_patch_by_bob = test::TestRequest::patch()
        .uri(&format!("/users/{}", alice.id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", bob.token)))
        .set_json(&json!({"username": "profile_alice_hacked"}))
        .to_request();
    let resp_patch_by_bob = test::call_service(&app, req_patch_by_bob).await;
    assert_eq!(
        resp_patch_by_bob.status(),
        actix_web::http::StatusCode::FORBIDDEN
    );

    // The role is not reachable through the profile patch
    let req_escalate = test::TestRequest::patch()
        .uri(&format!("/users/{}", alice.id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", alice.token)))
        .set_json(&json!({"role": "admin"}))
        .to_request();
    let resp_escalate = test::call_service(&app, req_escalate).await;
    assert_eq!(
        resp_escalate.status(),
        actix_web::http::StatusCode::BAD_REQUEST,
        "Unknown fields in a profile patch must be rejected"
    );

    // Alice renames herself; the response carries no password material
    let req_rename = test::TestRequest::patch()
        .uri(&format!("/users/{}", alice.id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", alice.token)))
        .set_json(&json!({"username": "profile_alice_renamed"}))
        .to_request();
    let resp_rename = test::call_service(&app, req_rename).await;
    assert_eq!(resp_rename.status(), actix_web::http::StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp_rename).await;
    assert_eq!(body["username"], "profile_alice_renamed");
    assert!(body.get("password_hash").is_none());

    // Note: the old token carries the old username, so it no longer resolves.
    // This is the documented consequence of renaming; alice logs in again.
    let req_login = test::TestRequest::post()
        .uri("/login")
        .set_json(&json!({
            "username": "profile_alice_renamed",
            "password": "Password123!"
        }))
        .to_request();
    let resp_login = test::call_service(&app, req_login).await;
    assert_eq!(resp_login.status(), actix_web::http::StatusCode::OK);

    cleanup_user(&pool, "profile_alice_renamed").await;
    cleanup_user(&pool, "profile_bob").await;
}

#[actix_rt::test]
async fn test_password_change_takes_effect() {
    let pool = setup_pool().await;
    let blobs = test_blobs().await;
    let app = build_app!(pool, blobs);

    cleanup_user(&pool, "pw_change_user").await;

    let user = register_user(&app, "pw_change_user", "OldPassword123!")
        .await
        .expect("Failed to register user");

    let req_patch = test::TestRequest::patch()
        .uri(&format!("/users/{}", user.id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user.token)))
        .set_json(&json!({"password": "NewPassword456!"}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req_patch).await.status(),
        actix_web::http::StatusCode::OK
    );

    // Old password no longer works, new one does
    let req_old = test::TestRequest::post()
        .uri("/login")
        .set_json(&json!({"username": "pw_change_user", "password": "OldPassword123!"}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req_old).await.status(),
        actix_web::http::StatusCode::UNAUTHORIZED
    );

    let req_new = test::TestRequest::post()
        .uri("/login")
        .set_json(&json!({"username": "pw_change_user", "password": "NewPassword456!"}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req_new).await.status(),
        actix_web::http::StatusCode::OK
    );

    cleanup_user(&pool, "pw_change_user").await;
}

#[actix_rt::test]
async fn test_avatar_lifecycle() {
    let pool = setup_pool().await;
    let blobs = test_blobs().await;
    let app = build_app!(pool, blobs);

    cleanup_user(&pool, "avatar_alice").await;
    cleanup_user(&pool, "avatar_bob").await;

    let alice = register_user(&app, "avatar_alice", "Password123!")
        .await
        .expect("Failed to register alice");
    let bob = register_user(&app, "avatar_bob", "Password123!")
        .await
        .expect("Failed to register bob");

    // A tiny fake PNG payload; content is not inspected, only type and size.
    let png_bytes: &[u8] = b"\x89PNG\r\n\x1a\n fake image data";

    // Bob cannot upload an avatar for alice
    let req_by_bob = test::TestRequest::post()
        .uri(&format!("/users/{}/avatar", alice.id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", bob.token)))
        .insert_header(("Content-Type", "image/png"))
        .set_payload(png_bytes)
        .to_request();
    assert_eq!(
        test::call_service(&app, req_by_bob).await.status(),
        actix_web::http::StatusCode::FORBIDDEN
    );

    // Non-image uploads are rejected
    let req_wrong_type = test::TestRequest::post()
        .uri(&format!("/users/{}/avatar", alice.id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", alice.token)))
        .insert_header(("Content-Type", "application/pdf"))
        .set_payload(png_bytes)
        .to_request();
    assert_eq!(
        test::call_service(&app, req_wrong_type).await.status(),
        actix_web::http::StatusCode::UNSUPPORTED_MEDIA_TYPE
    );

    // Deleting before any upload reports the missing reference
    let req_delete_none = test::TestRequest::delete()
        .uri(&format!("/users/{}/avatar", alice.id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", alice.token)))
        .to_request();
    assert_eq!(
        test::call_service(&app, req_delete_none).await.status(),
        actix_web::http::StatusCode::NOT_FOUND
    );

    // Valid upload records the reference
    let req_upload = test::TestRequest::post()
        .uri(&format!("/users/{}/avatar", alice.id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", alice.token)))
        .insert_header(("Content-Type", "image/png"))
        .set_payload(png_bytes)
        .to_request();
    let resp_upload = test::call_service(&app, req_upload).await;
    assert_eq!(resp_upload.status(), actix_web::http::StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp_upload).await;
    let avatar_url = body["avatar_url"]
        .as_str()
        .expect("avatar_url should be set after upload")
        .to_owned();
    assert!(avatar_url.ends_with(".png"));

    // The avatar shows up on the public profile
    let req_profile = test::TestRequest::get()
        .uri(&format!("/users/{}", alice.id))
        .to_request();
    let profile: serde_json::Value =
        test::read_body_json(test::call_service(&app, req_profile).await).await;
    assert_eq!(profile["avatar_url"], avatar_url.as_str());

    // Deleting clears the reference
    let req_delete = test::TestRequest::delete()
        .uri(&format!("/users/{}/avatar", alice.id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", alice.token)))
        .to_request();
    let resp_delete = test::call_service(&app, req_delete).await;
    assert_eq!(resp_delete.status(), actix_web::http::StatusCode::OK);
    let cleared: serde_json::Value = test::read_body_json(resp_delete).await;
    assert!(cleared["avatar_url"].is_null());

    cleanup_user(&pool, "avatar_alice").await;
    cleanup_user(&pool, "avatar_bob").await;
}

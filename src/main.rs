use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;

use taskdeck::config::Config;
use taskdeck::routes;
use taskdeck::routes::health;
use taskdeck::storage::{BlobStore, MAX_UPLOAD_BYTES};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    let blobs = BlobStore::new(&config.upload_dir);
    blobs
        .init()
        .await
        .expect("Failed to create upload directory");

    log::info!("Starting TaskDeck server at {}", config.server_url());

    let bind_addr = (config.server_host.clone(), config.server_port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(blobs.clone()))
            // Raw-body uploads go up to 5 MiB; anything above that is
            // rejected by the handlers with a 413.
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
            .configure(routes::config)
    })
    .bind(bind_addr)?
    .run()
    .await
}

pub mod auth;
pub mod boards;
pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;

/// Registers every route on the application.
///
/// Protected handlers declare an `AuthenticatedUser` argument; everything
/// else is public. Paths carry no common prefix, so registration is flat.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::register)
        .service(auth::login)
        .service(tasks::get_my_tasks)
        .service(tasks::get_tasks)
        .service(tasks::create_task)
        .service(tasks::close_task)
        .service(tasks::assign_responsible)
        .service(tasks::upload_pdf)
        .service(tasks::delete_pdf)
        .service(tasks::get_task)
        .service(tasks::update_task)
        .service(tasks::delete_task)
        .service(boards::board_tasks)
        .service(boards::add_user)
        .service(boards::remove_user)
        .service(boards::add_task)
        .service(boards::remove_task)
        .service(boards::list_boards)
        .service(boards::create_board)
        .service(boards::get_board)
        .service(boards::update_board)
        .service(boards::delete_board)
        .service(users::upload_avatar)
        .service(users::delete_avatar)
        .service(users::list_users)
        .service(users::get_user)
        .service(users::update_user)
        .service(users::delete_user);
}

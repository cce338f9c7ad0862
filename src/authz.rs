//! Authorization rules applied before mutations.
//!
//! Each rule is a stateless predicate over already-loaded entities. Handlers
//! resolve the acting user and the target entity first (401/404), then call
//! the relevant rule, which either allows the mutation or denies it with an
//! `AppError::Forbidden` carrying the reason.

use crate::error::AppError;
use crate::models::{Board, Task, User};

/// Task update, deletion, and responsibility reassignment are reserved for
/// the task's creator. A task whose creator was deleted can no longer be
/// mutated through these paths.
pub fn ensure_task_creator(task: &Task, user: &User) -> Result<(), AppError> {
    if task.creator_id == Some(user.id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the task creator may modify this task".into(),
        ))
    }
}

/// Board deletion is an admin-only operation.
pub fn ensure_admin(user: &User) -> Result<(), AppError> {
    if user.role.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin role required".into()))
    }
}

/// Board edits (rename, membership, task placement) are reserved for the
/// board's creator. Admins may manage boards whose creator is gone.
pub fn ensure_board_creator(board: &Board, user: &User) -> Result<(), AppError> {
    if board.creator_id == Some(user.id) || user.role.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the board creator may modify this board".into(),
        ))
    }
}

/// Self-service operations (profile update/delete, avatar management) are
/// only allowed on the acting user's own account.
pub fn ensure_self(user: &User, target_user_id: i32) -> Result<(), AppError> {
    if user.id == target_user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Operation only permitted on your own account".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use chrono::Utc;

    fn user(id: i32, role: UserRole) -> User {
        User {
            id,
            username: format!("user{}", id),
            password_hash: "hash".into(),
            avatar_url: None,
            role,
            closed_tasks_count: 0,
            created_at: Utc::now(),
        }
    }

    fn task(creator_id: Option<i32>) -> Task {
        Task {
            id: 1,
            title: "t".into(),
            description: None,
            priority: None,
            status: "Open".into(),
            created_at: Utc::now(),
            updated_at: None,
            pdf_path: None,
            creator_id,
            responsible_id: None,
            board_id: None,
        }
    }

    fn board(creator_id: Option<i32>) -> Board {
        Board {
            id: 1,
            title: "b".into(),
            creator_id,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_task_creator_rule() {
        let creator = user(1, UserRole::User);
        let other = user(2, UserRole::User);
        let t = task(Some(1));

        assert!(ensure_task_creator(&t, &creator).is_ok());
        assert!(matches!(
            ensure_task_creator(&t, &other),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_task_with_deleted_creator_denies_everyone() {
        let admin = user(1, UserRole::Admin);
        let t = task(None);
        assert!(ensure_task_creator(&t, &admin).is_err());
    }

    #[test]
    fn test_admin_rule() {
        assert!(ensure_admin(&user(1, UserRole::Admin)).is_ok());
        assert!(matches!(
            ensure_admin(&user(1, UserRole::User)),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_board_creator_rule() {
        let creator = user(1, UserRole::User);
        let other = user(2, UserRole::User);
        let admin = user(3, UserRole::Admin);
        let b = board(Some(1));

        assert!(ensure_board_creator(&b, &creator).is_ok());
        assert!(ensure_board_creator(&b, &other).is_err());
        assert!(ensure_board_creator(&b, &admin).is_ok());

        // A board whose creator is gone can only be managed by admins.
        let orphaned = board(None);
        assert!(ensure_board_creator(&orphaned, &creator).is_err());
        assert!(ensure_board_creator(&orphaned, &admin).is_ok());
    }

    #[test]
    fn test_self_rule() {
        let u = user(5, UserRole::User);
        assert!(ensure_self(&u, 5).is_ok());
        assert!(matches!(ensure_self(&u, 6), Err(AppError::Forbidden(_))));
    }
}

pub mod board;
pub mod task;
pub mod user;

pub use board::{Board, BoardDetail, BoardInput, BoardUpdate, BoardUserModify, TaskToBoard};
pub use task::{AssignRequest, Task, TaskInput, TaskUpdate, STATUS_DONE};
pub use user::{User, UserOut, UserRole, UserUpdate};

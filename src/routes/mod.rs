mod auth;
mod health_check;
mod tasks;
mod users;

pub use auth::{refresh, signin, signup};
pub use health_check::health_check;
pub use tasks::{create_task, delete_task, list_tasks, update_task};
pub use users::get_current_user;

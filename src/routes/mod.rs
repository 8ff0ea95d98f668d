mod auth;
mod health_check;
mod users;

pub use auth::{get_current_user, login, logout, refresh, register};
pub use health_check::health_check;
pub use users::{confirm_user, update_role};

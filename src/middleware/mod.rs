/// Middleware module

mod role_guard;

pub use role_guard::BearerToken;
pub use role_guard::RoleGuard;

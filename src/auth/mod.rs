/// Authentication module
///
/// Token issuance/validation with revocation, password hashing,
/// refresh token management, and the role-based access guard.

mod claims;
mod guard;
mod password;
mod refresh_token;
mod revocation;
mod token;

pub use claims::Claims;
pub use guard::authorize;
pub use password::hash_password;
pub use password::validate_password_strength;
pub use password::verify_password;
pub use refresh_token::generate_refresh_token;
pub use refresh_token::revoke_all_user_tokens;
pub use refresh_token::revoke_refresh_token;
pub use refresh_token::save_refresh_token;
pub use refresh_token::validate_refresh_token;
pub use token::TokenService;

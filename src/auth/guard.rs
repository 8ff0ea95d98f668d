/// Access Control Guard
///
/// Resolves a bearer token into a live user record and checks it against an
/// explicit role allow-list. Claims are only trusted to name the subject:
/// the live lookup is what authorizes, so role changes and account removal
/// take effect without waiting for token expiry.

use sqlx::PgPool;

use crate::auth::token::TokenService;
use crate::error::{AppError, AuthError};
use crate::store::{self, Role, User};

/// Authorize a bearer token against a role allow-list.
///
/// - Token invalid (signature/expiry/revoked) -> `Unauthorized`
/// - Subject no longer in the store -> `Unauthorized`
/// - Live role not in `allowed_roles` -> `Forbidden`
pub async fn authorize(
    token: &str,
    allowed_roles: &[Role],
    pool: &PgPool,
    tokens: &TokenService,
) -> Result<User, AppError> {
    let claims = tokens
        .validate(token)
        .map_err(|_| AppError::Auth(AuthError::Unauthorized))?;

    let user = store::find_by_username(pool, &claims.sub)
        .await?
        .ok_or(AppError::Auth(AuthError::Unauthorized))?;

    if !allowed_roles.contains(&user.role) {
        tracing::warn!(
            username = %user.username,
            role = %user.role,
            "Role not in allow-list"
        );
        return Err(AppError::Auth(AuthError::Forbidden));
    }

    Ok(user)
}

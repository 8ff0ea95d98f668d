/// User Management Routes
///
/// Privileged operations on user accounts. Route wiring in `startup.rs`
/// composes the role guard in front of these: role changes are admin-only,
/// confirmation is open to admins and moderators.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

use crate::error::AppError;
use crate::store::{self, Role};

#[derive(Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Deserialize)]
pub struct ConfirmRequest {
    pub confirmed: bool,
}

/// PUT /users/{username}/role
///
/// Admin only. Changes take effect on the target's next authorized request:
/// the guard checks the live record, not token claims.
///
/// # Errors
/// - 404: no such user
pub async fn update_role(
    path: web::Path<String>,
    form: web::Json<UpdateRoleRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let username = path.into_inner();
    store::update_role(pool.get_ref(), &username, form.role).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "username": username,
        "role": form.role,
    })))
}

/// PATCH /users/{username}/confirm
///
/// Admin or moderator.
///
/// # Errors
/// - 404: no such user
pub async fn confirm_user(
    path: web::Path<String>,
    form: web::Json<ConfirmRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let username = path.into_inner();
    store::set_confirmed(pool.get_ref(), &username, form.confirmed).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "username": username,
        "confirmed": form.confirmed,
    })))
}

use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::error::{AppError, DatabaseError};

/// GET /health_check
///
/// Probes database connectivity with a trivial query; a failed round trip
/// surfaces as `StorageUnavailable`.
pub async fn health_check(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| AppError::Database(DatabaseError::Unavailable(e.to_string())))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

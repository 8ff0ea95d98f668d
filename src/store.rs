/// Credential Store
///
/// Owns persisted user records: lookups by unique columns, creation with
/// duplicate detection, role/confirmation updates, and the one-time default
/// administrator bootstrap. All reads are case-sensitive exact matches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

use crate::auth::hash_password;
use crate::error::{AppError, DatabaseError};

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin_password";

/// Privilege levels. No implicit ordering; authorization works only through
/// explicit allow-lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Moderator => write!(f, "moderator"),
            Role::User => write!(f, "user"),
        }
    }
}

/// Persisted user record
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    /// External identifier, safe to expose to clients
    pub uid: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub role: Role,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub confirmed: bool,
}

const USER_COLUMNS: &str =
    "id, uid, username, email, password_hash, avatar, role, confirmed, created_at, updated_at";

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE username = $1",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = $1",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE email = $1",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Insert a new user record.
///
/// A unique-constraint violation on username or email surfaces as
/// `DatabaseError::DuplicateUser`; the insert is atomic so no partial row is
/// left behind.
pub async fn create_user(pool: &PgPool, new_user: NewUser) -> Result<User, AppError> {
    let now = Utc::now();
    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (uid, username, email, password_hash, role, confirmed, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(&new_user.username)
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .bind(new_user.role)
    .bind(new_user.confirmed)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

/// Change a user's role. Only reachable through admin-gated routes.
pub async fn update_role(pool: &PgPool, username: &str, role: Role) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE users SET role = $1, updated_at = $2 WHERE username = $3")
        .bind(role)
        .bind(Utc::now())
        .bind(username)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Database(DatabaseError::NotFound(format!(
            "user {}",
            username
        ))));
    }

    tracing::info!(username = username, role = %role, "User role updated");
    Ok(())
}

/// Set a user's confirmation flag.
pub async fn set_confirmed(pool: &PgPool, username: &str, confirmed: bool) -> Result<(), AppError> {
    let result =
        sqlx::query("UPDATE users SET confirmed = $1, updated_at = $2 WHERE username = $3")
            .bind(confirmed)
            .bind(Utc::now())
            .bind(username)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Database(DatabaseError::NotFound(format!(
            "user {}",
            username
        ))));
    }

    Ok(())
}

pub async fn count_users(pool: &PgPool) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// First-run bootstrap: create the default administrator if the store is
/// empty. Idempotent — the count guard means it only ever runs once. The
/// default password is hashed before persisting; plaintext never reaches the
/// database.
pub async fn ensure_default_admin(pool: &PgPool) -> Result<(), AppError> {
    if count_users(pool).await? > 0 {
        return Ok(());
    }

    let password_hash = hash_password(DEFAULT_ADMIN_PASSWORD)?;
    create_user(
        pool,
        NewUser {
            username: DEFAULT_ADMIN_USERNAME.to_string(),
            email: DEFAULT_ADMIN_EMAIL.to_string(),
            password_hash,
            role: Role::Admin,
            confirmed: true,
        },
    )
    .await?;

    tracing::info!(
        username = DEFAULT_ADMIN_USERNAME,
        "Default administrator created on empty store"
    );
    Ok(())
}

/// Authentication Routes
///
/// Registration, login, logout, token refresh, and current user info.
/// Handlers stay thin: credential checks, token issuance, and authorization
/// live in the auth module and the credential store.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::{
    generate_refresh_token, hash_password, revoke_all_user_tokens, revoke_refresh_token,
    save_refresh_token, validate_password_strength, validate_refresh_token, verify_password,
    TokenService,
};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, DatabaseError};
use crate::middleware::BearerToken;
use crate::store::{self, NewUser, Role, User};
use crate::validators::{is_valid_email, is_valid_username};

/// User registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token refresh request
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Authentication response with access and refresh tokens
#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// User information response
#[derive(Serialize)]
pub struct UserResponse {
    pub uid: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub avatar: Option<String>,
    pub confirmed: bool,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            uid: user.uid.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            avatar: user.avatar.clone(),
            confirmed: user.confirmed,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// POST /auth/register
///
/// Register a new user with username, email, and password.
/// New accounts get the `user` role; privilege changes go through the
/// admin-gated user management routes.
///
/// # Errors
/// - 400: invalid username/email/password
/// - 409: username or email already registered
pub async fn register(
    form: web::Json<RegisterRequest>,
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let username = is_valid_username(&form.username)?;
    let email = is_valid_email(&form.email)?;
    validate_password_strength(&form.password)?;

    // Early duplicate check for a clean 409; the unique constraints still
    // catch concurrent registrations.
    if store::find_by_email(pool.get_ref(), &email).await?.is_some() {
        return Err(AppError::Database(DatabaseError::DuplicateUser(
            "email already registered".to_string(),
        )));
    }

    let password_hash = hash_password(&form.password)?;

    let user = store::create_user(
        pool.get_ref(),
        NewUser {
            username,
            email,
            password_hash,
            role: Role::User,
            confirmed: false,
        },
    )
    .await?;

    let access_token = tokens.issue(&user.username, user.role)?;
    let refresh_token = generate_refresh_token();
    save_refresh_token(
        pool.get_ref(),
        user.id,
        &refresh_token,
        jwt_config.refresh_token_expiry,
    )
    .await?;

    tracing::info!(username = %user.username, "User registered successfully");

    Ok(HttpResponse::Created().json(AuthResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: jwt_config.access_token_expiry,
    }))
}

/// POST /auth/login
///
/// Authenticate with username and password; returns a bearer access token
/// whose claims carry the user's current role, plus a refresh token.
///
/// # Security Notes
/// - Unknown username and wrong password produce the same 401 to prevent
///   user enumeration
pub async fn login(
    form: web::Json<LoginRequest>,
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let user = store::find_by_username(pool.get_ref(), &form.username)
        .await?
        .ok_or(AppError::Auth(AuthError::InvalidCredentials))?;

    if !verify_password(&form.password, &user.password_hash) {
        return Err(AppError::Auth(AuthError::InvalidCredentials));
    }

    let access_token = tokens.issue(&user.username, user.role)?;
    let refresh_token = generate_refresh_token();
    save_refresh_token(
        pool.get_ref(),
        user.id,
        &refresh_token,
        jwt_config.refresh_token_expiry,
    )
    .await?;

    tracing::info!(username = %user.username, "User logged in successfully");

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: jwt_config.access_token_expiry,
    }))
}

/// POST /auth/logout
///
/// Guard-protected. Moves the presented access token into the revocation set
/// (it fails validation from now on, even before natural expiry) and revokes
/// all of the caller's refresh tokens.
pub async fn logout(
    user: web::ReqData<User>,
    token: web::ReqData<BearerToken>,
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    tokens.revoke(&token.0);
    revoke_all_user_tokens(pool.get_ref(), user.id).await?;

    tracing::info!(username = %user.username, "User logged out");

    Ok(HttpResponse::NoContent().finish())
}

/// POST /auth/refresh
///
/// Rotate a refresh token: the old one is revoked, a new pair is issued. The
/// access token carries the user's current role, so privilege changes land
/// here at the latest.
///
/// # Errors
/// - 401: invalid, expired, or revoked refresh token, or the account is gone
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let user_id = validate_refresh_token(pool.get_ref(), &form.refresh_token).await?;

    // Token rotation: a stolen token becomes useless after the first
    // legitimate refresh.
    revoke_refresh_token(pool.get_ref(), &form.refresh_token).await?;

    let user = store::find_by_id(pool.get_ref(), user_id)
        .await?
        .ok_or(AppError::Auth(AuthError::InvalidToken))?;

    let access_token = tokens.issue(&user.username, user.role)?;
    let refresh_token = generate_refresh_token();
    save_refresh_token(
        pool.get_ref(),
        user.id,
        &refresh_token,
        jwt_config.refresh_token_expiry,
    )
    .await?;

    tracing::info!(username = %user.username, "Token refreshed successfully");

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: jwt_config.access_token_expiry,
    }))
}

/// GET /auth/me
///
/// Guard-protected. Returns the live user record the guard resolved.
pub async fn get_current_user(user: web::ReqData<User>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(UserResponse::from(&*user)))
}

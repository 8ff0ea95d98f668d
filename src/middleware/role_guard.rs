/// Role Guard Middleware
///
/// Protects a route or scope with an explicit role allow-list. Extracts the
/// bearer token from the Authorization header, runs the access control guard
/// (token validation + live user lookup + role check), and injects the
/// resolved user and raw token into request extensions for handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ResponseError,
    web, Error, HttpMessage, HttpResponse,
};
use futures::future::LocalBoxFuture;
use sqlx::PgPool;
use std::rc::Rc;

use crate::auth::{authorize, TokenService};
use crate::error::{AppError, AuthError};
use crate::store::Role;

/// The raw bearer token a request presented, available to handlers that need
/// it back (logout revokes it).
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Guard middleware with an explicit role allow-list.
pub struct RoleGuard {
    allowed: Rc<Vec<Role>>,
}

impl RoleGuard {
    /// Permit only the given roles.
    pub fn allow(roles: &[Role]) -> Self {
        Self {
            allowed: Rc::new(roles.to_vec()),
        }
    }

    /// Permit any authenticated user.
    pub fn any_user() -> Self {
        Self::allow(&[Role::Admin, Role::Moderator, Role::User])
    }
}

impl<S, B> Transform<S, ServiceRequest> for RoleGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RoleGuardService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RoleGuardService {
            service: Rc::new(service),
            allowed: self.allowed.clone(),
        }))
    }
}

pub struct RoleGuardService<S> {
    service: Rc<S>,
    allowed: Rc<Vec<Role>>,
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
}

fn unauthorized_response(message: &str, code: &str) -> HttpResponse {
    HttpResponse::Unauthorized().json(serde_json::json!({
        "error": message,
        "code": code
    }))
}

impl<S, B> Service<ServiceRequest> for RoleGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = match bearer_token(&req) {
            Some(token) => token,
            None => {
                tracing::warn!("Missing or invalid Authorization header");
                let response =
                    unauthorized_response("Missing or invalid authorization header", "UNAUTHORIZED");
                return Box::pin(async move {
                    Err(actix_web::error::InternalError::from_response("Unauthorized", response)
                        .into())
                });
            }
        };

        let pool = req.app_data::<web::Data<PgPool>>().cloned();
        let tokens = req.app_data::<web::Data<TokenService>>().cloned();
        let allowed = self.allowed.clone();
        let service = self.service.clone();

        Box::pin(async move {
            let (pool, tokens) = match (pool, tokens) {
                (Some(pool), Some(tokens)) => (pool, tokens),
                _ => {
                    tracing::error!("Guard missing pool or token service app data");
                    let response = HttpResponse::InternalServerError().json(serde_json::json!({
                        "error": "Server misconfiguration",
                        "code": "INTERNAL_ERROR"
                    }));
                    return Err(actix_web::error::InternalError::from_response(
                        "Misconfigured",
                        response,
                    )
                    .into());
                }
            };

            match authorize(&token, &allowed, pool.get_ref(), tokens.get_ref()).await {
                Ok(user) => {
                    tracing::debug!(
                        username = %user.username,
                        role = %user.role,
                        "Request authorized"
                    );
                    req.extensions_mut().insert(user);
                    req.extensions_mut().insert(BearerToken(token));
                    service.call(req).await
                }
                Err(AppError::Auth(AuthError::Forbidden)) => {
                    let response = HttpResponse::Forbidden().json(serde_json::json!({
                        "error": "Insufficient privileges",
                        "code": "FORBIDDEN"
                    }));
                    Err(actix_web::error::InternalError::from_response("Forbidden", response)
                        .into())
                }
                Err(e @ AppError::Auth(_)) => {
                    tracing::warn!("Authorization failed: {}", e);
                    let response =
                        unauthorized_response("Invalid or expired token", "TOKEN_INVALID");
                    Err(actix_web::error::InternalError::from_response("Unauthorized", response)
                        .into())
                }
                // Storage or internal failures during the live lookup are not
                // auth failures; render them with their own status (500 etc.).
                Err(e) => {
                    let response = e.error_response();
                    Err(actix_web::error::InternalError::from_response(
                        "Authorization lookup failed",
                        response,
                    )
                    .into())
                }
            }
        })
    }
}

use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::auth::TokenService;
use crate::configuration::JwtSettings;
use crate::logger::LoggerMiddleware;
use crate::middleware::RoleGuard;
use crate::routes::{
    confirm_user, get_current_user, health_check, login, logout, refresh, register, update_role,
};
use crate::store::Role;

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    jwt_config: JwtSettings,
    tokens: TokenService,
) -> Result<Server, std::io::Error> {
    let connection = web::Data::new(connection);
    let jwt_config = web::Data::new(jwt_config);
    let tokens = web::Data::new(tokens);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(connection.clone())
            .app_data(jwt_config.clone())
            .app_data(tokens.clone())

            // Public routes
            .route("/health_check", web::get().to(health_check))

            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    // Session-holder routes: any authenticated role
                    .service(
                        web::resource("/logout")
                            .wrap(RoleGuard::any_user())
                            .route(web::post().to(logout)),
                    )
                    .service(
                        web::resource("/me")
                            .wrap(RoleGuard::any_user())
                            .route(web::get().to(get_current_user)),
                    ),
            )

            // Privileged user management, gated per-route
            .service(
                web::scope("/users")
                    .service(
                        web::resource("/{username}/role")
                            .wrap(RoleGuard::allow(&[Role::Admin]))
                            .route(web::put().to(update_role)),
                    )
                    .service(
                        web::resource("/{username}/confirm")
                            .wrap(RoleGuard::allow(&[Role::Admin, Role::Moderator]))
                            .route(web::patch().to(confirm_user)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}

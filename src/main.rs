use photoshare::auth::TokenService;
use photoshare::configuration::get_configuration;
use photoshare::startup::run;
use photoshare::store::ensure_default_admin;
use photoshare::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::time::Duration;

/// How often the revocation set drops entries whose expiry has passed.
const REVOCATION_PRUNE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let connection_string = configuration.database.connection_string();
    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&connection_string)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    tracing::info!("Database connection pool created successfully");

    // First-run bootstrap, before accepting any traffic
    ensure_default_admin(&pool).await.map_err(|e| {
        tracing::error!("Failed to bootstrap default administrator: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, "Bootstrap error")
    })?;

    let jwt_config = configuration.jwt.clone();
    let tokens = TokenService::new(jwt_config.clone());

    // Periodic pruning of the revocation set
    let pruner = tokens.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(REVOCATION_PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            let removed = pruner.prune_expired();
            if removed > 0 {
                tracing::info!(removed = removed, "Pruned expired revocation entries");
            }
        }
    });

    let address = format!("127.0.0.1:{}", configuration.application.port);
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, pool, jwt_config, tokens)?;
    tracing::info!("Server started successfully");

    let _ = server.await;

    Ok(())
}

use std::net::SocketAddr;
use std::sync::Arc;
use anyhow::Context;
use carcare_api::{app, token::TokenService, AppState, AuthConfig};
use carcare_core::repository::SessionRegistry;
use carcare_store::{
    app_config::Config, DbClient, MemorySessionRegistry, PgBookingRepository, PgServiceRepository,
    RedisClient,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carcare_api=debug,carcare_store=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting CarCare API on port {}", config.server.port);

    // Postgres Connection
    let db = DbClient::connect(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;
    db.ping().await.context("Database ping failed")?;

    // Revoked sessions
    let sessions: Arc<dyn SessionRegistry> = match &config.redis.url {
        Some(url) => Arc::new(
            RedisClient::new(url)
                .await
                .context("Failed to connect to Redis")?,
        ),
        None => {
            tracing::warn!("No Redis URL configured; revoked sessions are kept in memory");
            Arc::new(MemorySessionRegistry::new())
        }
    };

    tracing::info!("Booking gate policy: {:?}", config.auth.booking_gate);

    let tokens = TokenService::new(&config.auth.jwt_secret, config.auth.jwt_expiration_seconds)
        .context("Invalid session token settings")?;

    let app_state = AppState::new(
        Arc::new(PgServiceRepository::new(db.pool.clone())),
        Arc::new(PgBookingRepository::new(db.pool.clone())),
        sessions,
        AuthConfig {
            tokens,
            booking_gate: config.auth.booking_gate,
        },
        &config.cors.allowed_origins,
    );

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

// ============================================================================
// Rendezvous Relay - Entry Point
// ============================================================================
//
// Handles:
// - Depositing signaling envelopes (POST /<anything>)
// - Retrieving them by key (GET /.../<key>)
// - CORS preflights (OPTIONS /<anything>)
// - Liveness probe (GET /.../test)
//
// Architecture:
// - Stateless process; Redis holds all rendezvous entries with a 120s TTL
// - Health and Prometheus metrics on a separate operator port
//
// ============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use beacon_config::Config;
use beacon_redis::RedisClient;
use rendezvous_service::RelayContext;
use rendezvous_service::core::{RelayEngine, RelayPolicy};
use rendezvous_service::routes;
use rendezvous_service::store::RedisStore;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Arc::new(Config::from_env()?);

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.rust_log.clone()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("=== Rendezvous Relay Starting ===");
    info!("Port: {}", config.port);
    info!("Entry TTL: {}s", config.entry_ttl_secs);

    // Initialize Redis
    info!("Connecting to Redis...");
    let redis = RedisClient::connect(&config.redis_url)
        .await
        .context("Failed to connect to Redis")?;
    info!("Connected to Redis");

    let store = Arc::new(RedisStore::new(redis, config.redis_key_prefixes.clone()));
    let engine = Arc::new(RelayEngine::new(
        store,
        RelayPolicy {
            entry_ttl: config.entry_ttl(),
            store_timeout: config.store_timeout(),
        },
    ));

    let context = Arc::new(RelayContext {
        engine,
        config: config.clone(),
    });

    // Operator surface on its own port
    let operator_addr = format!("{}:{}", config.bind_address, config.health_port);
    let operator_listener = tokio::net::TcpListener::bind(&operator_addr)
        .await
        .context("Failed to bind operator listener")?;
    let operator_app = routes::create_operator_router(context.clone());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(operator_listener, operator_app).await {
            tracing::error!(error = %e, "Operator listener failed");
        }
    });
    info!("Health and metrics listening on {}", operator_addr);

    // Relay surface
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind relay listener")?;
    let app = routes::create_router(context);
    info!("Relay listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

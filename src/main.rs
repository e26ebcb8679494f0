//! Beacon Server — real-time notification fan-out.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use beacon_core::config::AppConfig;
use beacon_core::error::AppError;
use beacon_gateway::{AllowAll, GatewayState};
use beacon_realtime::bridge::broker::MultiInstanceBroker;
use beacon_realtime::bridge::bus::NotificationBus;
use beacon_realtime::bridge::memory_bus::MemoryBus;
use beacon_realtime::bridge::redis_bus::RedisBus;
use beacon_realtime::channel::broker::ChannelBroker;
use beacon_realtime::connection::pool::ConnectionPool;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("BEACON_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Beacon v{}", env!("CARGO_PKG_VERSION"));

    // Local fan-out: connection pool + channel broker with its sweeper.
    let pool = Arc::new(ConnectionPool::new());
    let broker = ChannelBroker::new(&config.realtime, Arc::clone(&pool));

    // Notification bus. Startup continues on a process-local bus when
    // Redis is unreachable; cross-instance relay is degraded, not fatal.
    let bus: Arc<dyn NotificationBus> = match RedisBus::connect(&config.bus).await {
        Ok(redis) => {
            tracing::info!(topic = %config.bus.topic, "Connected to Redis notification bus");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Redis bus unavailable, falling back to in-process bus (single-instance mode)"
            );
            Arc::new(MemoryBus::new(config.realtime.channel_buffer_size))
        }
    };

    let bridge = Arc::new(MultiInstanceBroker::new(Arc::clone(&broker), bus).await?);

    let state = GatewayState::new(
        Arc::clone(&pool),
        Arc::clone(&broker),
        Arc::new(AllowAll),
        config.realtime.channel_buffer_size,
    );
    let app = beacon_gateway::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Beacon server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // Stop the bus relay before tearing down local connections.
    bridge.close().await;
    broker.shutdown();

    tracing::info!("Beacon server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

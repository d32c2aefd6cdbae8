//! # Mini Shop API
//!
//! Server entry point.
//!
//! ## Startup
//! ```text
//! tracing ──► ApiConfig::load ──► Database::new (+ migrations) ──► axum::serve
//! ```

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use shop_api::{app, ApiConfig, AppState};
use shop_db::Database;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shop=debug,sqlx=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting Mini Shop API server...");

    // Load configuration
    let config = ApiConfig::load()?;
    info!(
        bind = %config.bind_address,
        database = %config.database_path,
        max_attempts = config.checkout.max_attempts,
        "Configuration loaded"
    );
    if config.uses_dev_secret() {
        warn!("Using the development JWT secret; set SHOP_JWT_SECRET in production");
    }

    // Connect to database (migrations run on connect)
    let db = Database::new(config.db_config()).await?;
    info!("Connected to SQLite");

    let bind_address = config.bind_address.clone();
    let state = AppState::new(db.clone(), config);

    let listener = TcpListener::bind(&bind_address).await?;
    info!(addr = %bind_address, "Starting HTTP server");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}

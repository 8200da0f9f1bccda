//! # Stockroom Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  load config ─► open database (migrations) ─► bootstrap admin password  │
//! │       ─► serve HTTP until Ctrl+C / SIGTERM                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stockroom_db::{Database, DbConfig};
use stockroom_server::auth::hash_password;
use stockroom_server::{create_app, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    info!("Starting Stockroom server...");

    let config = ServerConfig::load().context("loading configuration")?;
    let addr = config.bind_address()?;
    info!(
        %addr,
        database = %config.database.path.display(),
        "Configuration loaded"
    );

    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }

    let db = Database::new(DbConfig::new(&config.database.path))
        .await
        .context("opening database")?;

    bootstrap_admin(&db, &config).await?;

    let state = AppState::new(db.clone(), &config);

    let limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            limiter.cleanup().await;
        }
    });

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Stores the configured admin password when none is set yet.
async fn bootstrap_admin(db: &Database, config: &ServerConfig) -> anyhow::Result<()> {
    let admin = db.users().admin().await?;
    if admin.password_hash.is_some() {
        return Ok(());
    }

    let hash = hash_password(&config.auth.admin_password)
        .map_err(|e| anyhow::anyhow!("hashing admin password: {}", e))?;
    db.users().set_password_hash(&hash).await?;
    info!(username = %admin.username, "Admin password initialised");
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

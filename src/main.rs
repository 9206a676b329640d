//! Server binary: loads settings, opens the pool for the configured provider, serves the API.

use std::sync::Arc;
use tabla_crud::{app, load_env_files, AppState, BcryptHasher, Connection, Settings};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_files();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tabla_crud=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    tracing::info!(
        provider = %settings.provider,
        environment = %settings.environment,
        max_limit = settings.max_limit,
        "settings loaded"
    );
    let connection = Connection::connect(&settings).await?;
    tracing::info!(engine = ?connection.engine(), "database pool ready");
    let state = AppState::new(
        settings.provider,
        Arc::new(connection),
        Arc::new(BcryptHasher::default()),
        settings.max_limit,
        settings.environment.clone(),
    );

    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

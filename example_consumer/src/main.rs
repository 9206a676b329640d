//! Example consumer: a separate Rust project that mounts tabla-crud under its own prefix.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Requires `DB_PROVIDER` and the matching connection string, e.g.
//! `DB_PROVIDER=postgres DB_POSTGRES=postgres://localhost/tienda`.

use axum::{routing::get, Router};
use std::sync::Arc;
use tabla_crud::{
    common_routes_with_ready, entity_routes, load_env_files, AppState, BcryptHasher, Connection, Settings,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_files();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tabla_crud=info,example_consumer=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let connection = Connection::connect(&settings).await?;
    let state = AppState::new(
        settings.provider,
        Arc::new(connection),
        Arc::new(BcryptHasher::default()),
        settings.max_limit,
        settings.environment.clone(),
    );

    let app = Router::new()
        .route("/hola", get(|| async { "hola" }))
        .merge(common_routes_with_ready(state.clone()))
        .nest("/datos", entity_routes(state));

    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    let port = listener.local_addr()?.port();
    tracing::info!("Example consumer listening on http://127.0.0.1:{}", port);
    axum::serve(listener, app).await?;
    Ok(())
}

//! Server binary: reads configuration, prepares PostgreSQL and serves the API.
//!
//! Run: `DATABASE_URL=postgres://localhost/stuff cargo run`

use std::sync::Arc;
use stuff_tracker::{build_router, ensure_database_exists, AppConfig, AppState, PgStore};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("stuff_tracker=info,tower_http=info")),
        )
        .init();

    ensure_database_exists(&config.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.database_url)
        .await?;

    let store = PgStore::new(pool, &config.database_schema);
    store.ensure_tables().await?;

    let bind_addr = config.bind_addr.clone();
    let app = build_router(AppState::new(Arc::new(store), config));

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

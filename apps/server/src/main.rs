//! Readlog server binary.

use std::net::SocketAddr;

use book_store::{BookStore, MemoryBookStore, SqliteBookStore};
use readlog_server::{config::Config, create_app, create_state, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.log_level);

    if config.uses_memory_store() {
        tracing::warn!("Using the in-memory store; data is lost on shutdown");
        serve(config, MemoryBookStore::new()).await
    } else {
        let store = SqliteBookStore::connect(&config.database_url).await?;
        tracing::info!(database_url = %config.database_url, "Connected to database");
        serve(config, store).await
    }
}

async fn serve<S: BookStore + 'static>(config: Config, store: S) -> anyhow::Result<()> {
    let addr: SocketAddr = config.server_addr().parse()?;
    let app = create_app(create_state(config, store));

    tracing::info!(addr = %addr, "Starting Readlog server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

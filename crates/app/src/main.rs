mod openapi;
mod problem;
mod router;
mod telemetry;
mod terms;

use std::net::SocketAddr;

use glossary_storage::Database;
use glossary_util::{load_env_file, AppConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = telemetry::init_metrics()?;

    let database = Database::connect(&config.database_url).await?;
    database.run_migrations().await?;
    let stored = database.terms().count().await?;
    info!(stage = "storage", database_url = %config.database_url, terms = stored, "term store ready");

    let state = router::AppState::new(metrics, database.clone());

    let addr: SocketAddr = config.bind_addr;
    info!(stage = "app", %addr, env = %config.environment.as_str(), "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router::app_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    database.close().await;
    info!(stage = "app", "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!(stage = "app", "received Ctrl+C, shutting down"),
        Err(err) => {
            warn!(stage = "app", error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

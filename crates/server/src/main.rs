use std::sync::Arc;

use anyhow::Context;
use db::{DBService, collection::sqlite::SqliteCollectionClient};
use server::{AppState, config::Config, routes};
use services::services::{assistant::AssistantGateway, database_validator::DatabaseValidator};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    utils::logging::init();

    let config = Config::from_env()?;

    let db = DBService::new(&config.database_url)
        .await
        .with_context(|| format!("failed to open database at {}", config.database_url))?;

    let validation = DatabaseValidator::new(db.pool.clone()).validate().await?;
    if !validation.is_ok() {
        anyhow::bail!(validation.summary());
    }

    let assistant = AssistantGateway::from_api_key(
        config.anthropic_api_key.clone(),
        config.assistant_model.clone(),
    );
    let state = AppState::new(
        Arc::new(SqliteCollectionClient::new(db.pool.clone())),
        assistant,
        config.page_limits(),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_address()?).await?;
    info!(address = %listener.local_addr()?, "Server listening");

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.pool.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

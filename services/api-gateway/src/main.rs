//! API Gateway - Main Entry Point

use std::net::SocketAddr;

use anyhow::Context;
use api_gateway::shutdown::{ShutdownCoordinator, run_with_graceful_shutdown};
use api_gateway::{AppState, Config, build_router};
use rust_common::init_tracing;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;
    init_tracing(&config.tracing_config()).context("failed to initialise tracing")?;

    info!(
        principals = config.principals.len(),
        token_ttl_seconds = config.token_ttl_seconds,
        "Starting API Gateway"
    );

    let state = AppState::from_config(&config)?;
    let app = build_router(state, &config);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("API Gateway listening on {}", addr);

    let coordinator = ShutdownCoordinator::new();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(coordinator.subscribe().recv())
    .into_future();

    run_with_graceful_shutdown(server, &coordinator, config.shutdown_timeout()).await?;

    info!("API Gateway stopped");
    Ok(())
}

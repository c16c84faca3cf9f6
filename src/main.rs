use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

mod auth;
mod config;
mod error;
mod handlers;
mod metrics;
mod middleware;
mod models;
mod rate_limit;
mod routes;
mod state;
mod token;


use crate::config::{Args, Settings, credentials_from_args};
use crate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    if let Err(e) = run(Args::parse()).await {
        error!(error = %e, "notify-gate failed to start");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_args(&args)?;
    let credentials = credentials_from_args(&args)?;
    info!(users = credentials.len(), "credential directory loaded");
    if credentials.is_empty() {
        info!("no seed users configured, token endpoint will reject every login");
    }

    let state = Arc::new(AppState::new(&settings, Arc::new(credentials)));
    let app = routes::app(state);

    let addr = format!("0.0.0.0:{}", settings.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(%addr, "notify-gate listening");
    info!(
        max_requests = settings.limiter.max_requests,
        window_secs = settings.limiter.window.as_secs(),
        token_ttl_secs = settings.token_ttl.as_secs(),
        "admission control configured"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("server gracefully stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down server");
}

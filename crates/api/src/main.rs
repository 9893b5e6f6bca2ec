use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use assetflow_remote::PipelineApi;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use assetflow_api::config::ServerConfig;
use assetflow_api::router::build_app_router;
use assetflow_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "assetflow_api=debug,assetflow_remote=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        upstream = %config.base_url,
        api_key_set = config.api_key.is_some(),
        "Loaded server configuration",
    );

    // --- Upstream client ---
    let pipeline = PipelineApi::new(config.remote()).context("Failed to build upstream HTTP client")?;

    let state = AppState {
        pipeline: Arc::new(pipeline),
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let host: IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST address {:?}", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

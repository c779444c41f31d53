//! WordPress OAuth1 flow debugger
//!
//! Local single-user tool that walks through the OAuth1 three-legged
//! flow against a WordPress site: request token, user authorization,
//! access token, one authenticated REST request. Serves a single page
//! plus a JSON API; all flow state lives in one session file.

mod config;
mod flow;
mod routes;
mod session;
#[cfg(test)]
mod testutil;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::flow::AuthFlowController;
use crate::routes::AppState;
use crate::session::SessionStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Tracing with LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting wp-oauth-debugger");

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config = Config::resolve(cli_config_path).context("failed to load configuration")?;
    info!(
        listen_addr = %config.listen_addr,
        session_path = %config.session_path.display(),
        timeout_secs = config.request_timeout_secs,
        "configuration loaded"
    );

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    let store = SessionStore::new(config.session_path.clone());
    let session = store.load().await.with_context(|| {
        format!(
            "failed to load session from {}",
            config.session_path.display()
        )
    })?;

    let controller = AuthFlowController::new(http, store, session);
    let state = AppState {
        controller: Arc::new(Mutex::new(controller)),
        started_at: Instant::now(),
    };

    let app = routes::build_router(state.clone());

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.listen_addr))?;
    info!(
        "debugger ready — open http://{}/ in a browser",
        config.listen_addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // Whole-session snapshot on the way out; every step already persisted,
    // this catches nothing-happened-yet sessions too.
    let controller = state.controller.lock().await;
    controller
        .persist()
        .await
        .context("failed to save session on shutdown")?;

    info!("shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

//! virome-api - music and video metadata aggregator service
//!
//! Loads configuration, builds the shared upstream clients and serves the
//! HTTP API until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use virome_api::{build_router, AppState};
use virome_common::config::{self, ENV_LOG_LEVEL};

/// Command-line arguments for virome-api
#[derive(Parser, Debug)]
#[command(name = "virome-api")]
#[command(about = "Music and video metadata aggregator")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides [server] port)
    #[arg(short, long, env = "VIROME_PORT")]
    port: Option<u16>,

    /// Address to bind (overrides [server] bind)
    #[arg(short, long, env = "VIROME_BIND")]
    bind: Option<String>,

    /// TOML config file (default: <config_dir>/virome/virome.toml)
    #[arg(short, long, env = "VIROME_CONFIG")]
    config: Option<PathBuf>,
}

/// `RUST_LOG` wins; otherwise the configured level for this service's crates
fn env_filter(level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "virome_api={level},virome_common={level},tower_http={level}",
            level = level
        )
        .into()
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Env/default level until the config file is loaded
    let initial_level = std::env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| "info".to_string());
    let (filter, reload_handle) =
        tracing_subscriber::reload::Layer::new(env_filter(&initial_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Virome API (virome-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let mut config =
        config::load_config(args.config.as_deref()).context("Failed to load configuration")?;
    reload_handle
        .reload(env_filter(&config.logging.level))
        .context("Failed to apply configured log level")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    if config.upstream.lastfm_api_key.is_none() {
        info!("No Last.fm API key configured; chart, similar and info endpoints will fail");
    }

    let state = AppState::new(&config).context("Failed to build upstream clients")?;
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address {}:{}",
                config.server.bind, config.server.port
            )
        })?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("virome-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

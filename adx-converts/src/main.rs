//! adx-converts - ADX convert catalog and file redirect service
//!
//! Startup order: tracing, build identification, configuration, catalog
//! (downloaded on first run), folder resolver, HTTP server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use adx_common::config::{ConfigOverrides, ServiceConfig};
use adx_common::SystemClock;
use adx_converts::catalog::Catalog;
use adx_converts::gdrive::{EmbeddedViewFetcher, FolderCache};
use adx_converts::resolver::AssetResolver;
use adx_converts::{build_router, AppState};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for adx-converts
#[derive(Parser, Debug)]
#[command(name = "adx-converts")]
#[command(about = "ADX convert catalog and Google Drive file redirect service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(env = "ADX_PORT")]
    port: Option<u16>,

    /// Catalog JSON file (downloaded from --catalog-url if missing)
    #[arg(long, env = "ADX_CATALOG_PATH")]
    catalog_path: Option<PathBuf>,

    /// Remote catalog used to bootstrap the catalog file
    #[arg(long, env = "ADX_CATALOG_URL")]
    catalog_url: Option<String>,

    /// Host serving embedded folder views
    #[arg(long, env = "ADX_DRIVE_HOST")]
    drive_host: Option<String>,

    /// Host serving direct downloads
    #[arg(long, env = "ADX_DOWNLOAD_HOST")]
    download_host: Option<String>,

    /// TOML config file (default: <config dir>/adx/config.toml if present)
    #[arg(short, long, env = "ADX_CONFIG")]
    config: Option<PathBuf>,
}

impl From<Args> for ConfigOverrides {
    fn from(args: Args) -> Self {
        Self {
            port: args.port,
            catalog_path: args.catalog_path,
            catalog_url: args.catalog_url,
            drive_host: args.drive_host,
            download_host: args.download_host,
            config_file: args.config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adx_converts=info,adx_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting adx-converts v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = ServiceConfig::resolve(Args::parse().into())
        .context("Failed to resolve configuration")?;
    info!("Catalog file: {}", config.catalog_path.display());
    info!("Drive host: {}, download host: {}", config.drive_host, config.download_host);

    let catalog = Catalog::load(&config.catalog_path, &config.catalog_url)
        .await
        .context("Failed to load convert catalog")?;

    let fetcher = EmbeddedViewFetcher::new(config.drive_host.clone())
        .context("Failed to create folder view fetcher")?;
    let cache = FolderCache::new(Arc::new(fetcher), Arc::new(SystemClock));
    info!("Folder cache TTL: {}s", cache.ttl().as_secs());
    let resolver = AssetResolver::new(cache, config.download_host.clone());

    let app = build_router(AppState::new(catalog, resolver));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Server is running on http://localhost:{}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
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
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}

//! Image Relay - caching image proxy
//!
//! Relays GET requests to a configured upstream image host, caches
//! successful responses on disk, and answers every failure with a generated
//! placeholder image.

mod config;
mod error;
mod fetch;
mod placeholder;
mod server;

use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::fetch::ImageFetcher;
use crate::server::{start_server, ServerState, SharedState};
use file_image_cache::ImageCache;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env().add_directive("image_relay=info".parse()?);

    // Use JSON format for log collectors when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting Image Relay...");

    let config = RelayConfig::load();
    info!("Port: {}", config.port);
    info!("Upstream base URL: {}", config.upstream_base_url);
    info!("Cache dir: {:?}", config.cache_dir);
    info!(
        "Max cache size: {} MB",
        config.max_cache_bytes / (1024 * 1024)
    );
    info!(
        "Max download size: {} MB",
        config.max_download_bytes / (1024 * 1024)
    );

    let cache = ImageCache::new(
        config.cache_dir.clone(),
        config.max_cache_bytes,
        config.max_download_bytes,
    );
    cache.init().await?;

    let fetcher = ImageFetcher::new(&config.upstream_base_url, config.upstream_timeout_secs)?;

    let port = config.port;
    let state: SharedState = Arc::new(ServerState::new(config, cache, fetcher));

    start_server(state, port)
        .await
        .map_err(|e| RelayError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

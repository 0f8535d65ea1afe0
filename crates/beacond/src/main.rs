//! beacond — node directory and webhook inspector daemon.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use beacon_api::NodesState;
use beacon_core::{BeaconConfig, DirectoryBackend};
use beacon_services::{open_store, DirectoryStore, RedisStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = BeaconConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    // Config errors are fatal; never run on partial overrides.
    let config = match BeaconConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load config");
            return Err(e).context("failed to load config");
        }
    };
    tracing::info!(
        bind = %config.http.bind,
        config = %BeaconConfig::file_path().display(),
        "beacond starting"
    );

    // ── Directory ────────────────────────────────────────────────────────────

    let nodes = match config.nodes.directory() {
        Some(backend) => {
            let store = open_directory(&backend).await;
            tracing::info!(backend = store.backend(), "nodes endpoint enabled");
            Some(NodesState::new(store, &config.nodes.token))
        }
        None => {
            tracing::info!("nodes endpoint disabled (no token, or redis backend without addr)");
            None
        }
    };

    // ── HTTP ─────────────────────────────────────────────────────────────────

    let listener = match TcpListener::bind(&config.http.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(bind = %config.http.bind, error = %e, "failed to bind http listener");
            return Err(e)
                .with_context(|| format!("failed to bind http listener on {}", config.http.bind));
        }
    };

    let app = beacon_api::router(nodes);
    beacon_api::serve(listener, app, shutdown_signal())
        .await
        .context("http server failed")?;

    tracing::info!("shutting down");
    Ok(())
}

/// Open the configured store. A Redis store is probed once so a bad address
/// shows up in the startup log; requests still retry through the pool.
async fn open_directory(backend: &DirectoryBackend) -> Arc<dyn DirectoryStore> {
    match backend {
        DirectoryBackend::Redis { redis, ttl } => {
            let store = RedisStore::new(redis, *ttl);
            match store.ping().await {
                Ok(()) => tracing::info!(addr = %redis.addr, ttl_secs = ttl.as_secs(), "redis reachable"),
                Err(e) => tracing::warn!(addr = %redis.addr, error = %e, "redis not reachable yet"),
            }
            Arc::new(store)
        }
        DirectoryBackend::Memory => open_store(backend),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::serve;
use solux_core::config::AppConfig;
use solux_core::Gateway;
use server::router;
use tokio::{signal, sync::broadcast};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the logging system based on the configuration.
fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,solux_core={level},server={level}",
            level = config.logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format.as_str() == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().pretty().with_target(false))
            .init();
    }
}

/// Interval between eager sweeps of expired cache entries. Lookup already
/// evicts lazily; the sweep bounds memory for keys that are never re-read.
const CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(60);

fn start_cache_purge_task(gateway: Arc<Gateway>, mut shutdown_rx: broadcast::Receiver<()>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(CACHE_PURGE_INTERVAL);
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    debug!("cache purge task shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let purged = gateway.cache.purge_expired();
                    if purged > 0 {
                        debug!(purged = purged, "purged expired cache entries");
                    }
                }
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install signal handler");
                () = std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config =
        AppConfig::load().map_err(|e| anyhow::anyhow!("configuration loading failed: {e}"))?;
    config.validate().map_err(|e| anyhow::anyhow!("configuration invalid: {e}"))?;

    init_logging(&config);
    info!("starting Solux API gateway");
    debug!(
        mainnet_url = %config.networks.mainnet_url,
        devnet_url = %config.networks.devnet_url,
        bind_port = config.server.bind_port,
        cache_enabled = config.cache.enabled,
        "configuration loaded"
    );

    let addr = config.socket_addr().map_err(|e| anyhow::anyhow!(e))?;
    let gateway = Arc::new(
        Gateway::new(config).map_err(|e| anyhow::anyhow!("gateway initialization failed: {e}"))?,
    );

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    start_cache_purge_task(gateway.clone(), shutdown_tx.subscribe());

    let app = router::create_router(gateway);

    info!(address = %addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    if let Err(e) = serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
        error!(error = %e, "server error occurred");
    }

    let _ = shutdown_tx.send(());
    info!("server shutdown complete");

    Ok(())
}

use std::sync::Arc;

use pricefeed::{HeartbeatCoordinator, PriceFeed, PriceFeedError};
use pricefeed_binance::BinanceConnector;
use pricefeed_server::{AppState, ServerConfig, app};
use pricefeed_sqlite::SqliteStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Missing .env is fine.
    let _ = dotenv::dotenv();

    let cfg = match ServerConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level)),
        )
        .init();

    if let Err(e) = run(cfg).await {
        tracing::error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}

async fn run(cfg: ServerConfig) -> Result<(), PriceFeedError> {
    let store = Arc::new(SqliteStore::open(&cfg.db_path).await?);
    let exchange = BinanceConnector::builder()
        .base_url(cfg.binance_base_url.clone())
        .build()?;
    let feed = Arc::new(
        PriceFeed::builder()
            .with_exchange(Arc::new(exchange))
            .with_store(store)
            .config(cfg.feed)
            .build()?,
    );

    if cfg.feed.backfill.gap_fill_enabled {
        match feed.backfill_all_symbols().await {
            Ok(reports) => {
                let records: usize = reports.iter().map(|r| r.records_stored).sum();
                tracing::info!(symbols = reports.len(), records, "startup gap fill complete");
            }
            Err(e) => tracing::error!(error = %e, "startup gap fill failed"),
        }
    } else {
        tracing::info!("startup gap fill disabled");
    }

    let coordinator = HeartbeatCoordinator::new(Arc::clone(&feed));
    coordinator.start();

    let listener = tokio::net::TcpListener::bind(cfg.addr())
        .await
        .map_err(|e| PriceFeedError::InvalidConfig(format!("bind {}: {e}", cfg.addr())))?;
    tracing::info!(addr = %cfg.addr(), "pricefeed server listening");

    let served = axum::serve(listener, app(AppState::new(feed)))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    let outcome = coordinator.stop().await;
    tracing::info!(?outcome, "heartbeat stopped");
    served.map_err(|e| PriceFeedError::Other(format!("server: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received, stopping");
}

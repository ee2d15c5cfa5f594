// rates-core/src/bin/rates_server.rs
// HTTP API plus the periodic actualizer

use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{error, info};

use rates_common::SqliteRateRepository;
use rates_core::api;
use rates_core::config::Settings;
use rates_core::logging::init_tracing;
use rates_core::provider::CryptoCompareClient;
use rates_core::scheduler::Actualizer;
use rates_core::service::RatesService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let settings = Settings::new().context("failed to load settings")?;

    let repo = SqliteRateRepository::connect(&settings.database)
        .await
        .context("failed to open database")?;
    repo.ensure_schema()
        .await
        .context("failed to prepare database schema")?;

    let provider = CryptoCompareClient::new(&settings.provider)
        .context("failed to build price provider")?;

    let service = Arc::new(
        RatesService::builder()
            .store(Arc::new(repo))
            .provider(Arc::new(provider))
            .aggregate_window(settings.aggregate_window())
            .build()?,
    );

    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let scheduler = if settings.scheduler.enabled {
        let actualizer = Actualizer::from_settings(service.clone(), &settings.scheduler)
            .context("invalid scheduler settings")?;
        Some(tokio::spawn(async move { actualizer.run(shutdown_rx).await }))
    } else {
        info!("Scheduler disabled");
        None
    };

    let addr = settings.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Rates API listening on http://{}", addr);

    axum::serve(listener, api::router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // Receiver may already be gone when the scheduler is disabled
    let _ = shutdown_tx.send(());
    if let Some(handle) = scheduler {
        if let Err(e) = handle.await {
            error!(error = %e, "Scheduler task ended abnormally");
        }
    }

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}

// rates-core/src/bin/actualize.rs
// One-shot refresh: `actualize [SYMBOL ...]`, all known symbols when none given

use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::info;

use rates_common::SqliteRateRepository;
use rates_core::config::Settings;
use rates_core::logging::init_tracing;
use rates_core::provider::CryptoCompareClient;
use rates_core::service::{ActualizeOptions, RatesService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let symbols: Vec<String> = std::env::args()
        .skip(1)
        .flat_map(|arg| {
            arg.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        })
        .collect();

    let settings = Settings::new().context("failed to load settings")?;

    let repo = SqliteRateRepository::connect(&settings.database)
        .await
        .context("failed to open database")?;
    repo.ensure_schema().await?;

    let service = RatesService::builder()
        .store(Arc::new(repo))
        .provider(Arc::new(CryptoCompareClient::new(&settings.provider)?))
        .aggregate_window(settings.aggregate_window())
        .build()?;

    let options = if symbols.is_empty() {
        ActualizeOptions::all()
    } else {
        ActualizeOptions::with_symbols(symbols)
    };

    let updated = service.actualize(&options).await?;
    info!(updated, "Actualization finished");
    Ok(())
}

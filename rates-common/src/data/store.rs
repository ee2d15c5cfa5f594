// rates-common/src/data/store.rs

use async_trait::async_trait;

use super::errors::DataResult;
use super::types::{AggregateResult, AggregateWindow, Coin, Reducer};

/// Durable price storage consumed by the rates service.
///
/// Implementations must be safe for concurrent use by many callers.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// Write every coin. Idempotent per `(symbol, observed_at)`, last write wins.
    async fn upsert(&self, coins: &[Coin]) -> DataResult<()>;

    /// All distinct symbols ever stored.
    async fn list_symbols(&self) -> DataResult<Vec<String>>;

    /// Most recent observation for each requested symbol that has data.
    /// Empty input yields empty output.
    async fn get_latest(&self, symbols: &[String]) -> DataResult<Vec<Coin>>;

    /// One row per requested symbol with at least one observation inside `window`.
    /// Empty input yields empty output.
    async fn aggregate(
        &self,
        symbols: &[String],
        reducer: Reducer,
        window: AggregateWindow,
    ) -> DataResult<Vec<AggregateResult>>;
}

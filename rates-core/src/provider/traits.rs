// rates-core/src/provider/traits.rs

use async_trait::async_trait;
use rates_common::data::types::Coin;

use crate::provider::errors::ProviderError;

/// Remote source of truth for current prices.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Current price for every symbol the upstream recognizes.
    ///
    /// Unrecognized symbols may be dropped silently, so callers must not assume
    /// one coin per requested symbol. Empty input is rejected.
    async fn fetch_rates(&self, symbols: &[String]) -> Result<Vec<Coin>, ProviderError>;

    fn name(&self) -> &str;
}

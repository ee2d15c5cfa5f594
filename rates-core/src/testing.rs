// rates-core/src/testing.rs
// mockall doubles for the store and provider seams

use async_trait::async_trait;
use mockall::mock;
use rates_common::data::store::RateStore;
use rates_common::data::types::{AggregateResult, AggregateWindow, Coin, Reducer};
use rates_common::DataResult;

use crate::provider::{ProviderError, RateProvider};

mock! {
    pub Store {}

    #[async_trait]
    impl RateStore for Store {
        async fn upsert(&self, coins: &[Coin]) -> DataResult<()>;
        async fn list_symbols(&self) -> DataResult<Vec<String>>;
        async fn get_latest(&self, symbols: &[String]) -> DataResult<Vec<Coin>>;
        async fn aggregate(
            &self,
            symbols: &[String],
            reducer: Reducer,
            window: AggregateWindow,
        ) -> DataResult<Vec<AggregateResult>>;
    }
}

mock! {
    pub Provider {}

    #[async_trait]
    impl RateProvider for Provider {
        async fn fetch_rates(&self, symbols: &[String]) -> Result<Vec<Coin>, ProviderError>;
        fn name(&self) -> &str;
    }
}

// rates-core/src/service/rates.rs
// Reconciliation between the price store and the upstream provider

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use rates_common::data::store::RateStore;
use rates_common::data::types::{AggregateResult, AggregateWindow, Coin, Reducer};
use rates_common::DataError;

use super::errors::ServiceError;
use crate::provider::RateProvider;

/// Which symbols an actualize run refreshes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActualizeOptions {
    /// `None` refreshes every symbol the store knows.
    pub symbols: Option<Vec<String>>,
}

impl ActualizeOptions {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_symbols(symbols: Vec<String>) -> Self {
        Self {
            symbols: Some(symbols),
        }
    }
}

/// Answers latest/aggregate price queries and keeps the store fresh.
///
/// Holds no mutable state: concurrent callers share one instance behind an
/// `Arc`. Each operation awaits the store and the provider sequentially, so
/// dropping the future cancels it at the next await point. Two concurrent reads
/// that miss the same symbol may both backfill it; the store's upsert absorbs
/// the duplicate.
pub struct RatesService {
    store: Arc<dyn RateStore>,
    provider: Arc<dyn RateProvider>,
    aggregate_window: AggregateWindow,
}

#[derive(Default)]
pub struct RatesServiceBuilder {
    store: Option<Arc<dyn RateStore>>,
    provider: Option<Arc<dyn RateProvider>>,
    aggregate_window: AggregateWindow,
}

impl RatesServiceBuilder {
    pub fn store(mut self, store: Arc<dyn RateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn provider(mut self, provider: Arc<dyn RateProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn aggregate_window(mut self, window: AggregateWindow) -> Self {
        self.aggregate_window = window;
        self
    }

    pub fn build(self) -> Result<RatesService, ServiceError> {
        let Some(store) = self.store else {
            let err = ServiceError::InvalidParameter("store not set".to_string());
            error!("Service initialization failed: {}", err);
            return Err(err);
        };

        let Some(provider) = self.provider else {
            let err = ServiceError::InvalidParameter("provider not set".to_string());
            error!("Service initialization failed: {}", err);
            return Err(err);
        };

        info!(
            provider = provider.name(),
            window = ?self.aggregate_window,
            "Service initialized successfully"
        );
        Ok(RatesService {
            store,
            provider,
            aggregate_window: self.aggregate_window,
        })
    }
}

impl RatesService {
    pub fn builder() -> RatesServiceBuilder {
        RatesServiceBuilder::default()
    }

    pub fn aggregate_window(&self) -> AggregateWindow {
        self.aggregate_window
    }

    // =================================================================
    // Read Operations
    // =================================================================

    /// Latest observation for each requested symbol.
    ///
    /// Symbols missing from the store are fetched and stored first. Symbols the
    /// provider does not know stay absent from the result.
    pub async fn get_latest_rates(&self, symbols: &[String]) -> Result<Vec<Coin>, ServiceError> {
        const OP: &str = "rates.get_latest_rates";
        let started = Instant::now();
        info!(op = OP, titles_count = symbols.len(), ?symbols, "Processing request");

        Self::require_symbols(OP, symbols)?;
        self.backfill_missing(symbols)
            .await
            .map_err(|e| ServiceError::Backfill(Box::new(e)))?;

        debug!(op = OP, "Retrieving actual coins from storage");
        let coins = self.store.get_latest(symbols).await.map_err(|e| {
            error!(
                op = OP,
                error = %e,
                elapsed = ?started.elapsed(),
                "Failed to get actual coins"
            );
            ServiceError::data("failed to get actual coins from storage")(e)
        })?;

        Self::warn_absent(OP, symbols, coins.iter().map(|c| c.symbol.as_str()));
        info!(
            op = OP,
            coins_count = coins.len(),
            elapsed = ?started.elapsed(),
            "Request processed successfully"
        );
        Ok(coins)
    }

    /// `reducer` (AVG, MAX or MIN) over each requested symbol's stored series,
    /// restricted to the service's aggregate window.
    pub async fn get_aggregate_rates(
        &self,
        symbols: &[String],
        reducer: &str,
    ) -> Result<Vec<AggregateResult>, ServiceError> {
        const OP: &str = "rates.get_aggregate_rates";
        let started = Instant::now();
        info!(op = OP, titles_count = symbols.len(), reducer, "Processing aggregation request");

        Self::require_symbols(OP, symbols)?;
        let reducer: Reducer = reducer.parse().map_err(|e: DataError| {
            warn!(op = OP, error = %e, "Validation failed");
            ServiceError::InvalidParameter(e.to_string())
        })?;

        self.backfill_missing(symbols)
            .await
            .map_err(|e| ServiceError::Backfill(Box::new(e)))?;

        debug!(op = OP, %reducer, "Getting aggregated coins from storage");
        let results = self
            .store
            .aggregate(symbols, reducer, self.aggregate_window)
            .await
            .map_err(|e| {
                error!(
                    op = OP,
                    error = %e,
                    elapsed = ?started.elapsed(),
                    "Failed to get aggregated coins"
                );
                ServiceError::data("failed to get aggregate coins from storage")(e)
            })?;

        info!(
            op = OP,
            coins_count = results.len(),
            elapsed = ?started.elapsed(),
            "Aggregation complete"
        );
        Ok(results)
    }

    // =================================================================
    // Refresh Operations
    // =================================================================

    /// Fetch fresh prices and write them back. Returns the number of coins stored.
    ///
    /// Any failure aborts the whole run; the next scheduled run is the retry.
    pub async fn actualize(&self, options: &ActualizeOptions) -> Result<usize, ServiceError> {
        const OP: &str = "rates.actualize";
        let started = Instant::now();
        info!(op = OP, "Starting rates actualization");

        let symbols = match &options.symbols {
            Some(symbols) => symbols.clone(),
            None => self.store.list_symbols().await.map_err(|e| {
                error!(op = OP, error = %e, "Failed to get coins list");
                ServiceError::data("actualizeRates get coins list")(e)
            })?,
        };

        if symbols.is_empty() {
            info!(op = OP, "Nothing to actualize");
            return Ok(0);
        }
        debug!(op = OP, count = symbols.len(), "Retrieved coins list");

        let coins = self.provider.fetch_rates(&symbols).await.map_err(|e| {
            error!(op = OP, error = %e, "Failed to get actual rates");
            ServiceError::provider("actualizeRates get actual rates")(e)
        })?;

        self.store.upsert(&coins).await.map_err(|e| {
            error!(op = OP, error = %e, coins_count = coins.len(), "Failed to store actual rates");
            ServiceError::data("actualizeRates store")(e)
        })?;

        info!(
            op = OP,
            coins_updated = coins.len(),
            elapsed = ?started.elapsed(),
            "Rates actualization completed successfully"
        );
        Ok(coins.len())
    }

    /// Refresh every symbol the store knows.
    pub async fn actualize_all(&self) -> Result<usize, ServiceError> {
        self.actualize(&ActualizeOptions::all()).await
    }

    // =================================================================
    // Helper Methods
    // =================================================================

    fn require_symbols(op: &'static str, symbols: &[String]) -> Result<(), ServiceError> {
        if symbols.is_empty() {
            let err = ServiceError::InvalidParameter("titles list is empty".to_string());
            warn!(op, error = %err, "Validation failed");
            return Err(err);
        }
        Ok(())
    }

    /// Fetch and store whatever part of `requested` the store has never seen.
    async fn backfill_missing(&self, requested: &[String]) -> Result<(), ServiceError> {
        const OP: &str = "rates.backfill_missing";
        debug!(op = OP, requested_count = requested.len(), "Checking existing titles");

        let known = self.store.list_symbols().await.map_err(|e| {
            error!(op = OP, error = %e, "Failed to get coins list");
            ServiceError::data("failed to get coins list from storage")(e)
        })?;

        let missing = find_missing(requested, &known);
        if missing.is_empty() {
            debug!(op = OP, "All titles exist in storage");
            return Ok(());
        }

        info!(op = OP, missing_count = missing.len(), ?missing, "Found missing titles");
        let coins = self.provider.fetch_rates(&missing).await.map_err(|e| {
            error!(op = OP, error = %e, ?missing, "Failed to get rates for missing titles");
            ServiceError::provider("failed to get actual rates for missing titles")(e)
        })?;

        self.store.upsert(&coins).await.map_err(|e| {
            error!(op = OP, error = %e, coins_count = coins.len(), "Failed to store new coins");
            ServiceError::data("failed to store new coins in storage")(e)
        })?;

        info!(op = OP, added_count = coins.len(), "Missing titles processed successfully");
        Ok(())
    }

    fn warn_absent<'a>(
        op: &'static str,
        requested: &[String],
        returned: impl Iterator<Item = &'a str>,
    ) {
        let returned: Vec<String> = returned.map(str::to_string).collect();
        let absent = find_missing(requested, &returned);
        if !absent.is_empty() {
            warn!(op, ?absent, "Requested titles have no stored price");
        }
    }
}

/// Symbols of `requested` that are not in `known`, in requested order, each once.
pub fn find_missing(requested: &[String], known: &[String]) -> Vec<String> {
    let known: HashSet<&str> = known.iter().map(String::as_str).collect();
    let mut seen = HashSet::with_capacity(requested.len());

    requested
        .iter()
        .filter(|symbol| !known.contains(symbol.as_str()) && seen.insert(symbol.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderError;
    use crate::testing::{MockProvider, MockStore};
    use chrono::{TimeZone, Utc};
    use mockall::Sequence;
    use rates_common::{DataError, ErrorKind, SqliteRateRepository};
    use rust_decimal_macros::dec;

    fn titles(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn service(store: MockStore, provider: MockProvider) -> RatesService {
        RatesService::builder()
            .store(Arc::new(store))
            .provider(Arc::new(provider))
            .aggregate_window(AggregateWindow::AllTime)
            .build()
            .unwrap()
    }

    fn quiet_provider() -> MockProvider {
        let mut provider = MockProvider::new();
        provider.expect_name().return_const("mock".to_string());
        provider
    }

    fn btc_coin() -> Coin {
        let at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        Coin::with_observed_at("BTC", dec!(28000), at).unwrap()
    }

    // -----------------------------------------------------------------
    // find_missing
    // -----------------------------------------------------------------

    #[test]
    fn test_find_missing() {
        assert_eq!(
            find_missing(&titles(&["BTC", "ETH", "LTC"]), &titles(&["BTC", "ETH"])),
            titles(&["LTC"])
        );
        assert!(find_missing(&titles(&["BTC"]), &titles(&["BTC"])).is_empty());
        assert!(find_missing(&[], &titles(&["BTC", "ETH"])).is_empty());
    }

    #[test]
    fn test_find_missing_preserves_order_and_dedups() {
        assert_eq!(
            find_missing(&titles(&["XRP", "BTC", "ADA", "XRP"]), &titles(&["BTC"])),
            titles(&["XRP", "ADA"])
        );
        assert_eq!(
            find_missing(&titles(&["btc"]), &titles(&["BTC"])),
            titles(&["btc"])
        );
    }

    // -----------------------------------------------------------------
    // construction
    // -----------------------------------------------------------------

    #[test]
    fn test_builder_requires_collaborators() {
        let err = RatesService::builder()
            .provider(Arc::new(quiet_provider()))
            .build()
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert!(err.to_string().contains("store not set"));

        let err = RatesService::builder()
            .store(Arc::new(MockStore::new()))
            .build()
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert!(err.to_string().contains("provider not set"));
    }

    #[test]
    fn test_builder_defaults_to_daily_window() {
        let service = RatesService::builder()
            .store(Arc::new(MockStore::new()))
            .provider(Arc::new(quiet_provider()))
            .build()
            .unwrap();
        assert_eq!(service.aggregate_window(), AggregateWindow::from_hours(24));
    }

    // -----------------------------------------------------------------
    // get_latest_rates
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_latest_rejects_empty_titles_without_io() {
        let service = service(MockStore::new(), quiet_provider());

        let err = service.get_latest_rates(&[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[tokio::test]
    async fn test_latest_skips_provider_when_all_known() {
        let mut store = MockStore::new();
        store
            .expect_list_symbols()
            .times(1)
            .returning(|| Ok(vec!["BTC".to_string(), "ETH".to_string()]));
        store
            .expect_get_latest()
            .withf(|symbols: &[String]| symbols == ["BTC".to_string()])
            .times(1)
            .returning(|_| Ok(vec![btc_coin()]));

        let service = service(store, quiet_provider());
        let coins = service.get_latest_rates(&titles(&["BTC"])).await.unwrap();
        assert_eq!(coins, vec![btc_coin()]);
    }

    #[tokio::test]
    async fn test_latest_backfills_missing_symbol() {
        let mut seq = Sequence::new();
        let mut store = MockStore::new();
        let mut provider = quiet_provider();

        store
            .expect_list_symbols()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec!["BTC".to_string()]));
        provider
            .expect_fetch_rates()
            .withf(|symbols: &[String]| symbols == ["ETH".to_string()])
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![Coin::new("ETH", dec!(1500)).unwrap()]));
        store
            .expect_upsert()
            .withf(|coins: &[Coin]| {
                coins.len() == 1 && coins[0].symbol == "ETH" && coins[0].price == dec!(1500)
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        store
            .expect_get_latest()
            .withf(|symbols: &[String]| symbols == ["BTC".to_string(), "ETH".to_string()])
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(vec![btc_coin(), Coin::new("ETH", dec!(1500)).unwrap()])
            });

        let service = service(store, provider);
        let coins = service
            .get_latest_rates(&titles(&["BTC", "ETH"]))
            .await
            .unwrap();

        assert_eq!(coins.len(), 2);
        assert_eq!(coins[0], btc_coin());
        assert_eq!(coins[1].symbol, "ETH");
        assert_eq!(coins[1].price, dec!(1500));
    }

    #[tokio::test]
    async fn test_latest_provider_failure_aborts_before_storage() {
        let mut store = MockStore::new();
        let mut provider = quiet_provider();

        store
            .expect_list_symbols()
            .returning(|| Ok(vec!["BTC".to_string()]));
        provider
            .expect_fetch_rates()
            .times(1)
            .returning(|_| Err(ProviderError::NetworkError("connection refused".into())));
        store.expect_upsert().times(0);
        store.expect_get_latest().times(0);

        let service = service(store, provider);
        let err = service
            .get_latest_rates(&titles(&["BTC", "ETH"]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(matches!(err, ServiceError::Backfill(_)));
        let message = err.to_string();
        assert!(message.starts_with("failed to check existing titles"));
        assert!(message.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_latest_keeps_not_found_kind() {
        let mut store = MockStore::new();
        let mut provider = quiet_provider();

        store.expect_list_symbols().returning(|| Ok(vec![]));
        provider
            .expect_fetch_rates()
            .returning(|_| Err(ProviderError::NotFound("empty response from API".into())));

        let service = service(store, provider);
        let err = service
            .get_latest_rates(&titles(&["NOPE"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_latest_upsert_failure_aborts() {
        let mut store = MockStore::new();
        let mut provider = quiet_provider();

        store.expect_list_symbols().returning(|| Ok(vec![]));
        provider
            .expect_fetch_rates()
            .returning(|_| Ok(vec![Coin::new("ETH", dec!(1500)).unwrap()]));
        store
            .expect_upsert()
            .returning(|_| Err(DataError::Decode("disk full".into())));
        store.expect_get_latest().times(0);

        let service = service(store, provider);
        let err = service.get_latest_rates(&titles(&["ETH"])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().contains("failed to store new coins in storage"));
    }

    #[tokio::test]
    async fn test_latest_omits_symbols_provider_does_not_know() {
        let mut store = MockStore::new();
        let mut provider = quiet_provider();

        store.expect_list_symbols().returning(|| Ok(vec![]));
        provider
            .expect_fetch_rates()
            .returning(|_| Ok(vec![Coin::new("BTC", dec!(28000)).unwrap()]));
        store.expect_upsert().returning(|_| Ok(()));
        store
            .expect_get_latest()
            .returning(|_| Ok(vec![Coin::new("BTC", dec!(28000)).unwrap()]));

        let service = service(store, provider);
        let coins = service
            .get_latest_rates(&titles(&["BTC", "NOPE"]))
            .await
            .unwrap();
        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].symbol, "BTC");
    }

    // -----------------------------------------------------------------
    // get_aggregate_rates
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_aggregate_rejects_empty_titles_without_io() {
        let service = service(MockStore::new(), quiet_provider());

        for reducer in ["AVG", "MAX", "MIN", "XYZ"] {
            let err = service.get_aggregate_rates(&[], reducer).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        }
    }

    #[tokio::test]
    async fn test_aggregate_rejects_unknown_reducer_without_io() {
        let mut store = MockStore::new();
        store.expect_aggregate().times(0);
        store.expect_list_symbols().times(0);

        let service = service(store, quiet_provider());
        let err = service
            .get_aggregate_rates(&titles(&["BTC"]), "XYZ")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert!(err.to_string().contains("unsupported aggregate function"));
    }

    #[tokio::test]
    async fn test_aggregate_backfills_then_delegates() {
        let mut seq = Sequence::new();
        let mut store = MockStore::new();
        let mut provider = quiet_provider();

        store
            .expect_list_symbols()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec!["BTC".to_string()]));
        provider
            .expect_fetch_rates()
            .withf(|symbols: &[String]| symbols == ["ETH".to_string()])
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![Coin::new("ETH", dec!(1500)).unwrap()]));
        store
            .expect_upsert()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        store
            .expect_aggregate()
            .withf(|symbols: &[String], reducer: &Reducer, window: &AggregateWindow| {
                symbols.len() == 2
                    && *reducer == Reducer::Max
                    && *window == AggregateWindow::AllTime
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| {
                Ok(vec![
                    AggregateResult {
                        symbol: "BTC".into(),
                        value: dec!(29000),
                    },
                    AggregateResult {
                        symbol: "ETH".into(),
                        value: dec!(1500),
                    },
                ])
            });

        let service = service(store, provider);
        let results = service
            .get_aggregate_rates(&titles(&["BTC", "ETH"]), "max")
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].value, dec!(29000));
    }

    #[tokio::test]
    async fn test_aggregate_backfill_failure_skips_aggregate() {
        let mut store = MockStore::new();
        let mut provider = quiet_provider();

        store
            .expect_list_symbols()
            .times(1)
            .returning(|| Ok(vec!["BTC".to_string()]));
        provider
            .expect_fetch_rates()
            .withf(|symbols: &[String]| symbols == ["ETH".to_string()])
            .times(1)
            .returning(|_| Err(ProviderError::NotFound("empty response from API".into())));
        store.expect_upsert().times(0);
        store.expect_aggregate().times(0);

        let service = service(store, provider);
        let err = service
            .get_aggregate_rates(&titles(&["BTC", "ETH"]), "AVG")
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Backfill(_)));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err
            .to_string()
            .contains("failed to get actual rates for missing titles"));
    }

    #[tokio::test]
    async fn test_aggregate_storage_failure_is_wrapped() {
        let mut store = MockStore::new();
        store
            .expect_list_symbols()
            .returning(|| Ok(vec!["BTC".to_string()]));
        store
            .expect_aggregate()
            .returning(|_, _, _| Err(DataError::Decode("pool timed out".into())));

        let service = service(store, quiet_provider());
        let err = service
            .get_aggregate_rates(&titles(&["BTC"]), "AVG")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err
            .to_string()
            .starts_with("failed to get aggregate coins from storage"));
    }

    // -----------------------------------------------------------------
    // actualize
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_actualize_empty_store_skips_provider() {
        let mut store = MockStore::new();
        store.expect_list_symbols().times(1).returning(|| Ok(vec![]));
        store.expect_upsert().times(0);

        let service = service(store, quiet_provider());
        assert_eq!(service.actualize_all().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_actualize_refreshes_all_known() {
        let mut store = MockStore::new();
        let mut provider = quiet_provider();

        store
            .expect_list_symbols()
            .times(1)
            .returning(|| Ok(vec!["BTC".to_string(), "ETH".to_string()]));
        provider
            .expect_fetch_rates()
            .withf(|symbols: &[String]| symbols == ["BTC".to_string(), "ETH".to_string()])
            .times(1)
            .returning(|_| {
                Ok(vec![
                    Coin::new("BTC", dec!(28100)).unwrap(),
                    Coin::new("ETH", dec!(1510)).unwrap(),
                ])
            });
        store
            .expect_upsert()
            .withf(|coins: &[Coin]| coins.len() == 2)
            .times(1)
            .returning(|_| Ok(()));

        let service = service(store, provider);
        assert_eq!(service.actualize_all().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_actualize_with_explicit_symbols() {
        let mut store = MockStore::new();
        let mut provider = quiet_provider();

        store.expect_list_symbols().times(0);
        provider
            .expect_fetch_rates()
            .withf(|symbols: &[String]| symbols == ["LTC".to_string()])
            .times(1)
            .returning(|_| Ok(vec![Coin::new("LTC", dec!(70)).unwrap()]));
        store.expect_upsert().times(1).returning(|_| Ok(()));

        let service = service(store, provider);
        let updated = service
            .actualize(&ActualizeOptions::with_symbols(titles(&["LTC"])))
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let nothing = service
            .actualize(&ActualizeOptions::with_symbols(vec![]))
            .await
            .unwrap();
        assert_eq!(nothing, 0);
    }

    #[tokio::test]
    async fn test_actualize_provider_failure_skips_store() {
        let mut store = MockStore::new();
        let mut provider = quiet_provider();

        store
            .expect_list_symbols()
            .returning(|| Ok(vec!["BTC".to_string()]));
        provider
            .expect_fetch_rates()
            .returning(|_| {
                Err(ProviderError::UpstreamStatus {
                    status: 502,
                    body: "bad gateway".into(),
                })
            });
        store.expect_upsert().times(0);

        let service = service(store, provider);
        let err = service.actualize_all().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().starts_with("actualizeRates get actual rates"));
    }

    // -----------------------------------------------------------------
    // against the SQLite store
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_backfill_end_to_end_with_sqlite() {
        let repo = Arc::new(SqliteRateRepository::in_memory().await.unwrap());
        repo.upsert(&[btc_coin()]).await.unwrap();

        let mut provider = quiet_provider();
        provider
            .expect_fetch_rates()
            .withf(|symbols: &[String]| symbols == ["ETH".to_string()])
            .times(1)
            .returning(|_| Ok(vec![Coin::new("ETH", dec!(1500)).unwrap()]));

        let service = RatesService::builder()
            .store(repo.clone())
            .provider(Arc::new(provider))
            .aggregate_window(AggregateWindow::AllTime)
            .build()
            .unwrap();

        let coins = service
            .get_latest_rates(&titles(&["BTC", "ETH"]))
            .await
            .unwrap();
        assert_eq!(coins.len(), 2);
        assert_eq!(coins[0], btc_coin());
        assert_eq!(coins[1].symbol, "ETH");
        assert_eq!(coins[1].price, dec!(1500));

        // ETH is now known: a second read must not hit the provider again
        let avg = service
            .get_aggregate_rates(&titles(&["ETH"]), "AVG")
            .await
            .unwrap();
        assert_eq!(
            avg,
            vec![AggregateResult {
                symbol: "ETH".into(),
                value: dec!(1500),
            }]
        );
    }
}

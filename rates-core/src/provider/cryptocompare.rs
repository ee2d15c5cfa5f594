// ====
// CryptoCompare REST Connector
// ====
// Multi-symbol spot prices via /data/pricemulti
// ====

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use rates_common::data::types::Coin;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

use super::errors::ProviderError;
use super::traits::RateProvider;
use super::utils::{join_symbols, parse_price};
use crate::config::ProviderSettings;

const PRICE_MULTI_PATH: &str = "/data/pricemulti";
const QUERY_FSYMS: &str = "fsyms";
const QUERY_TSYMS: &str = "tsyms";

/// CryptoCompare Connector
pub struct CryptoCompareClient {
    /// HTTP client
    client: Client,
    /// Full pricemulti endpoint
    endpoint: Url,
    api_key: String,
    /// Quote currency, e.g. "USD"
    price_in: String,
}

impl CryptoCompareClient {
    pub fn new(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        if settings.api_key.trim().is_empty() {
            let err = ProviderError::InvalidParameter("api key is required".to_string());
            error!("Provider validation failed: {}", err);
            return Err(err);
        }

        let endpoint = Url::parse(&settings.base_url)
            .and_then(|base| base.join(PRICE_MULTI_PATH))
            .map_err(|e| {
                ProviderError::InvalidParameter(format!(
                    "invalid base url '{}': {}",
                    settings.base_url, e
                ))
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        info!(
            endpoint = %endpoint,
            price_in = %settings.price_in,
            "CryptoCompare client initialized"
        );

        Ok(Self {
            client,
            endpoint,
            api_key: settings.api_key.clone(),
            price_in: settings.price_in.clone(),
        })
    }

    pub fn price_in(&self) -> &str {
        &self.price_in
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl RateProvider for CryptoCompareClient {
    async fn fetch_rates(&self, symbols: &[String]) -> Result<Vec<Coin>, ProviderError> {
        if symbols.is_empty() {
            return Err(ProviderError::InvalidParameter(
                "titles list is empty".to_string(),
            ));
        }

        let started = Instant::now();
        let fsyms = join_symbols(symbols)?;
        debug!(symbols = %fsyms, target_currency = %self.price_in, "Sending request");

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[(QUERY_FSYMS, fsyms.as_str()), (QUERY_TSYMS, self.price_in.as_str())])
            .header(AUTHORIZATION, format!("Apikey {}", self.api_key))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(status = status.as_u16(), response = %body, "API returned error");
            return Err(ProviderError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let coins = parse_price_multi(&body, &self.price_in)?;

        info!(
            coins_received = coins.len(),
            requested = symbols.len(),
            elapsed = ?started.elapsed(),
            "Request completed successfully"
        );
        Ok(coins)
    }

    fn name(&self) -> &str {
        "cryptocompare"
    }
}

/// Decode a `pricemulti` body of the form `{"BTC": {"USD": 28000.0}, ...}`.
///
/// All coins share one observation time. Entries without a quote in `price_in`
/// or with a non-positive price are skipped. Coins come out in symbol order.
pub fn parse_price_multi(body: &str, price_in: &str) -> Result<Vec<Coin>, ProviderError> {
    let value: Value = serde_json::from_str(body)?;
    let Value::Object(entries) = value else {
        return Err(ProviderError::ParseError(
            "expected a JSON object".to_string(),
        ));
    };

    // Unknown symbols only: {"Response":"Error","Message":"..."}
    if entries.get("Response").and_then(Value::as_str) == Some("Error") {
        let message = entries
            .get("Message")
            .and_then(Value::as_str)
            .unwrap_or("no message");
        return Err(ProviderError::NotFound(format!(
            "upstream returned no prices: {}",
            message
        )));
    }

    let observed_at = Utc::now().trunc_subsecs(3);
    let mut coins = Vec::with_capacity(entries.len());

    for (symbol, quotes) in &entries {
        let Some(raw) = quotes.get(price_in).and_then(Value::as_f64) else {
            warn!(symbol = %symbol, price_in, "No quote in target currency, skipping");
            continue;
        };

        let price = parse_price(raw)?;
        if price <= Decimal::ZERO {
            warn!(symbol = %symbol, price = raw, "Non-positive price, skipping");
            continue;
        }

        let coin = Coin::with_observed_at(symbol.clone(), price, observed_at)
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        coins.push(coin);
    }

    if coins.is_empty() {
        return Err(ProviderError::NotFound(
            "empty response from API".to_string(),
        ));
    }

    coins.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    Ok(coins)
}

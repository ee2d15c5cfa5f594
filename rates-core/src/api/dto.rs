// rates-core/src/api/dto.rs
// Wire shapes of the HTTP API

use chrono::{DateTime, Utc};
use rates_common::data::types::{AggregateResult, Coin};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct TitlesQuery {
    /// Comma-separated symbols, e.g. `BTC,ETH`
    pub titles: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinResponse {
    pub coin_name: String,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<Coin> for CoinResponse {
    fn from(coin: Coin) -> Self {
        Self {
            coin_name: coin.symbol,
            price: coin.price,
            created_at: coin.observed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateCoinResponse {
    pub coin_name: String,
    pub price: Decimal,
}

impl From<AggregateResult> for AggregateCoinResponse {
    fn from(result: AggregateResult) -> Self {
        Self {
            coin_name: result.symbol,
            price: result.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// HTTP status code
    pub code: u16,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

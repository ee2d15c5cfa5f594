// rates-common/src/data/types.rs

use chrono::{DateTime, Duration, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::{DataError, DataResult};

// =================================================================
// Price Observations
// =================================================================

/// One priced snapshot of a symbol.
///
/// Observations are append-only: once created they are never mutated, and the
/// store keeps every one of them as the symbol's price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub symbol: String,
    pub price: Decimal,
    pub observed_at: DateTime<Utc>,
}

impl Coin {
    /// Create an observation stamped with the current time (millisecond precision).
    pub fn new(symbol: impl Into<String>, price: Decimal) -> DataResult<Self> {
        Self::with_observed_at(symbol, price, Utc::now().trunc_subsecs(3))
    }

    pub fn with_observed_at(
        symbol: impl Into<String>,
        price: Decimal,
        observed_at: DateTime<Utc>,
    ) -> DataResult<Self> {
        let coin = Self {
            symbol: symbol.into(),
            price,
            observed_at,
        };
        coin.validate()?;
        Ok(coin)
    }

    /// Reject observations that must never reach storage.
    pub fn validate(&self) -> DataResult<()> {
        if self.symbol.is_empty() {
            return Err(DataError::Validation("coin name not set".into()));
        }

        if self.price <= Decimal::ZERO {
            return Err(DataError::Validation(format!(
                "price must be greater than 0 (got {} for {})",
                self.price, self.symbol
            )));
        }

        Ok(())
    }
}

/// Reduced value of one symbol's price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub symbol: String,
    pub value: Decimal,
}

// =================================================================
// Aggregation
// =================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Reducer {
    Avg,
    Max,
    Min,
}

impl Reducer {
    pub const ALL: [Reducer; 3] = [Reducer::Avg, Reducer::Max, Reducer::Min];

    pub fn as_str(&self) -> &'static str {
        match self {
            Reducer::Avg => "AVG",
            Reducer::Max => "MAX",
            Reducer::Min => "MIN",
        }
    }

    /// SQL aggregate function name. Only ever one of three fixed literals,
    /// so it is safe to splice into a query string.
    pub fn sql_function(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reducer {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AVG" => Ok(Reducer::Avg),
            "MAX" => Ok(Reducer::Max),
            "MIN" => Ok(Reducer::Min),
            _ => Err(DataError::Validation(format!(
                "unsupported aggregate function: {} (allowed: AVG, MAX, MIN)",
                s
            ))),
        }
    }
}

/// Time range of stored history an aggregate runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateWindow {
    AllTime,
    Trailing(Duration),
}

impl AggregateWindow {
    /// `0` hours selects all stored history.
    pub fn from_hours(hours: u64) -> Self {
        if hours == 0 {
            AggregateWindow::AllTime
        } else {
            AggregateWindow::Trailing(Duration::hours(hours as i64))
        }
    }

    /// Earliest observation time included in the window, if bounded.
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            AggregateWindow::AllTime => None,
            AggregateWindow::Trailing(span) => Some(now - *span),
        }
    }
}

impl Default for AggregateWindow {
    fn default() -> Self {
        AggregateWindow::Trailing(Duration::hours(24))
    }
}

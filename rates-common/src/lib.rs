// rates-common/src/lib.rs
// Shared domain types and price storage for the rates workspace

pub mod data;

pub use data::errors::{DataError, DataResult, ErrorKind};
pub use data::types::{AggregateResult, AggregateWindow, Coin, Reducer};
pub use data::{DatabaseSettings, RateStore, SqliteRateRepository};

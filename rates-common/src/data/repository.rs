use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{QueryBuilder, Sqlite};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::errors::{DataError, DataResult};
use super::store::RateStore;
use super::types::{AggregateResult, AggregateWindow, Coin, Reducer};

// =================================================================
// Constants and Configuration
// =================================================================

const IDLE_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Seconds
    pub max_lifetime: u64,
    /// Seconds
    pub acquire_timeout: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite:data/rates.db?mode=rwc".to_string(),
            max_connections: 5,
            min_connections: 1,
            max_lifetime: 1800,
            acquire_timeout: 30,
        }
    }
}

// =================================================================
// Repository Implementation
// =================================================================

/// SQLite-backed price history.
///
/// Every observation is a row in `coins`; the pair `(coin_name, created_at)` is
/// unique so that repeated writes of the same observation collapse into one.
pub struct SqliteRateRepository {
    pool: SqlitePool,
}

impl SqliteRateRepository {
    /// Open a connection pool described by `settings`.
    pub async fn connect(settings: &DatabaseSettings) -> DataResult<Self> {
        let opts = SqliteConnectOptions::from_str(&settings.url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .max_lifetime(Duration::from_secs(settings.max_lifetime))
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout))
            .idle_timeout(Duration::from_secs(IDLE_TIMEOUT_SECS))
            .connect_with(opts)
            .await?;

        info!(
            "Database pool ready (max_connections={})",
            settings.max_connections
        );
        Ok(Self { pool })
    }

    /// Private in-memory database with the schema already in place.
    ///
    /// A memory database lives as long as its connection, so the pool is pinned
    /// to one connection that is never recycled.
    pub async fn in_memory() -> DataResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self::from_pool(pool);
        repo.ensure_schema().await?;
        Ok(repo)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get database pool reference
    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Ensure the coins table and its lookup index exist
    pub async fn ensure_schema(&self) -> DataResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS coins (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                coin_name TEXT NOT NULL,
                price REAL NOT NULL CHECK (price > 0),
                created_at INTEGER NOT NULL,
                UNIQUE (coin_name, created_at)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_coins_name_created \
             ON coins(coin_name, created_at DESC)",
        )
        .execute(&self.pool)
        .await?;

        debug!("Coins schema ensured");
        Ok(())
    }

    // =================================================================
    // Helper Methods
    // =================================================================

    fn validate_batch(coins: &[Coin]) -> DataResult<()> {
        for coin in coins {
            coin.validate()?;
        }
        Ok(())
    }

    fn encode_price(coin: &Coin) -> DataResult<f64> {
        coin.price.to_f64().ok_or_else(|| {
            DataError::Validation(format!(
                "price {} of {} is not representable",
                coin.price, coin.symbol
            ))
        })
    }

    fn decode_price(symbol: &str, value: f64) -> DataResult<Decimal> {
        Decimal::from_f64(value).ok_or_else(|| {
            DataError::Decode(format!("invalid stored price {} for {}", value, symbol))
        })
    }

    fn decode_timestamp(symbol: &str, millis: i64) -> DataResult<DateTime<Utc>> {
        Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
            DataError::Decode(format!("invalid stored timestamp {} for {}", millis, symbol))
        })
    }

    fn push_symbol_list<'a>(qb: &mut QueryBuilder<'a, Sqlite>, symbols: &'a [String]) {
        let mut separated = qb.separated(", ");
        for symbol in symbols {
            separated.push_bind(symbol.as_str());
        }
        separated.push_unseparated(")");
    }
}

#[async_trait]
impl RateStore for SqliteRateRepository {
    async fn upsert(&self, coins: &[Coin]) -> DataResult<()> {
        if coins.is_empty() {
            return Ok(());
        }

        Self::validate_batch(coins)?;

        debug!("Upserting {} coin observations", coins.len());
        let mut tx = self.pool.begin().await?;

        for coin in coins {
            sqlx::query(
                r#"
                INSERT INTO coins (coin_name, price, created_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT (coin_name, created_at)
                DO UPDATE SET price = excluded.price
                "#,
            )
            .bind(&coin.symbol)
            .bind(Self::encode_price(coin)?)
            .bind(coin.observed_at.timestamp_millis())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Stored {} coin observations", coins.len());
        Ok(())
    }

    async fn list_symbols(&self) -> DataResult<Vec<String>> {
        let symbols = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT coin_name FROM coins ORDER BY coin_name",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!("Store knows {} symbols", symbols.len());
        Ok(symbols)
    }

    async fn get_latest(&self, symbols: &[String]) -> DataResult<Vec<Coin>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT c.coin_name, c.price, c.created_at FROM coins c WHERE c.coin_name IN (",
        );
        Self::push_symbol_list(&mut qb, symbols);
        qb.push(
            " AND c.id = (SELECT c2.id FROM coins c2 WHERE c2.coin_name = c.coin_name \
             ORDER BY c2.created_at DESC, c2.id DESC LIMIT 1) \
             ORDER BY c.coin_name",
        );

        let rows: Vec<(String, f64, i64)> = qb.build_query_as().fetch_all(&self.pool).await?;

        let coins = rows
            .into_iter()
            .map(|(symbol, price, created_at)| {
                let price = Self::decode_price(&symbol, price)?;
                let observed_at = Self::decode_timestamp(&symbol, created_at)?;
                Ok(Coin {
                    symbol,
                    price,
                    observed_at,
                })
            })
            .collect::<DataResult<Vec<_>>>()?;

        debug!(
            "Fetched latest prices for {}/{} symbols in {:?}",
            coins.len(),
            symbols.len(),
            started.elapsed()
        );
        Ok(coins)
    }

    async fn aggregate(
        &self,
        symbols: &[String],
        reducer: Reducer,
        window: AggregateWindow,
    ) -> DataResult<Vec<AggregateResult>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT coin_name, {}(price) FROM coins WHERE coin_name IN (",
            reducer.sql_function()
        ));
        Self::push_symbol_list(&mut qb, symbols);

        if let Some(since) = window.since(Utc::now()) {
            qb.push(" AND created_at >= ");
            qb.push_bind(since.timestamp_millis());
        }
        qb.push(" GROUP BY coin_name ORDER BY coin_name");

        let rows: Vec<(String, f64)> = qb.build_query_as().fetch_all(&self.pool).await?;

        let results = rows
            .into_iter()
            .map(|(symbol, value)| {
                let value = Self::decode_price(&symbol, value)?;
                Ok(AggregateResult { symbol, value })
            })
            .collect::<DataResult<Vec<_>>>()?;

        debug!(
            "Aggregated {} over {} symbols ({:?})",
            reducer,
            results.len(),
            window
        );
        Ok(results)
    }
}

// rates-core/src/config.rs
// Layered settings: compiled-in defaults, optional config file, RATES_* environment

use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use rates_common::data::types::AggregateWindow;
use rates_common::data::DatabaseSettings;
use serde::Deserialize;
use std::time::Duration;

const ENV_PREFIX: &str = "RATES";

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: String,
    /// Quote currency every price is expressed in
    pub price_in: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerSettings {
    pub enabled: bool,
    pub interval_seconds: u64,
    pub run_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AggregateSettings {
    /// `0` aggregates over all stored history
    pub window_hours: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub provider: ProviderSettings,
    pub server: ServerSettings,
    pub scheduler: SchedulerSettings,
    pub aggregate: AggregateSettings,
}

impl Settings {
    /// Load from `config.{toml,yaml,json}` in the working directory (optional)
    /// and `RATES_<SECTION>__<KEY>` variables, on top of the defaults.
    pub fn new() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Self>()
            .and_then(|settings| settings.validate().map(|_| settings))
    }

    /// Reject values that would break the server at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.enabled {
            if self.scheduler.interval_seconds == 0 {
                return Err(ConfigError::Message(
                    "scheduler.interval_seconds must be greater than 0".to_string(),
                ));
            }
            if self.scheduler.run_timeout_seconds == 0 {
                return Err(ConfigError::Message(
                    "scheduler.run_timeout_seconds must be greater than 0".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Defaults only; callers add their own sources.
    pub fn builder() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("database.url", "sqlite:data/rates.db?mode=rwc")?
            .set_default("database.max_connections", 5)?
            .set_default("database.min_connections", 1)?
            .set_default("database.max_lifetime", 1800)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("provider.base_url", "https://min-api.cryptocompare.com")?
            .set_default("provider.api_key", "")?
            .set_default("provider.price_in", "USD")?
            .set_default("provider.timeout_seconds", 10)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("scheduler.enabled", true)?
            .set_default("scheduler.interval_seconds", 600)?
            .set_default("scheduler.run_timeout_seconds", 30)?
            .set_default("aggregate.window_hours", 24)
    }

    pub fn aggregate_window(&self) -> AggregateWindow {
        AggregateWindow::from_hours(self.aggregate.window_hours)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl SchedulerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_seconds)
    }
}

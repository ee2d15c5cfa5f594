// rates-core/src/service/mod.rs

pub mod errors;
pub mod rates;

pub use errors::ServiceError;
pub use rates::{find_missing, ActualizeOptions, RatesService, RatesServiceBuilder};

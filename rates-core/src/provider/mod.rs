// rates-core/src/provider/mod.rs

pub mod cryptocompare;
pub mod errors;
pub mod traits;
pub mod utils;

pub use cryptocompare::CryptoCompareClient;
pub use errors::ProviderError;
pub use traits::RateProvider;

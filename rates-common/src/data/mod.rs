pub mod errors;
pub mod repository;
pub mod store;
pub mod types;

pub use repository::{DatabaseSettings, SqliteRateRepository};
pub use store::RateStore;

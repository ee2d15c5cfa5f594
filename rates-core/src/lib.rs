// rates-core/src/lib.rs
// Rate reconciliation: provider client, service, HTTP API and scheduler

pub mod api;
pub mod config;
pub mod logging;
pub mod provider;
pub mod scheduler;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

// Re-export rates-common for convenience
pub use rates_common::data;

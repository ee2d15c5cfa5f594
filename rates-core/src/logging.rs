// rates-core/src/logging.rs

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

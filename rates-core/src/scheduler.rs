// rates-core/src/scheduler.rs
// Periodic refresh of every known symbol

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::config::SchedulerSettings;
use crate::service::{RatesService, ServiceError};

/// Drives `RatesService::actualize_all` on a fixed interval until shutdown.
pub struct Actualizer {
    service: Arc<RatesService>,
    interval: Duration,
    run_timeout: Duration,
}

impl Actualizer {
    /// Both durations must be non-zero.
    pub fn new(
        service: Arc<RatesService>,
        interval: Duration,
        run_timeout: Duration,
    ) -> Result<Self, ServiceError> {
        if interval.is_zero() {
            return Err(ServiceError::InvalidParameter(
                "scheduler interval must be greater than 0".to_string(),
            ));
        }
        if run_timeout.is_zero() {
            return Err(ServiceError::InvalidParameter(
                "scheduler run timeout must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            service,
            interval,
            run_timeout,
        })
    }

    pub fn from_settings(
        service: Arc<RatesService>,
        settings: &SchedulerSettings,
    ) -> Result<Self, ServiceError> {
        Self::new(service, settings.interval(), settings.run_timeout())
    }

    /// First run fires one interval after start. A failed or timed out run is
    /// logged and the loop waits for the next tick.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval = ?self.interval,
            run_timeout = ?self.run_timeout,
            "Actualizer started"
        );

        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_once().await;
                }
                _ = shutdown.recv() => {
                    info!("Actualizer received shutdown signal");
                    break;
                }
            }
        }

        info!("Actualizer stopped");
    }

    /// One bounded refresh. Returns whether it completed successfully.
    pub async fn run_once(&self) -> bool {
        let started = Instant::now();

        match time::timeout(self.run_timeout, self.service.actualize_all()).await {
            Ok(Ok(updated)) => {
                info!(updated, elapsed = ?started.elapsed(), "Scheduled actualization done");
                true
            }
            Ok(Err(e)) => {
                error!(error = %e, kind = %e.kind(), "Scheduled actualization failed");
                false
            }
            Err(_) => {
                warn!(timeout = ?self.run_timeout, "Scheduled actualization timed out");
                false
            }
        }
    }
}

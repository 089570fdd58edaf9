//! Expired-notification sweeper.
//!
//! [`ExpirySweeper`] runs as a background task, periodically deleting
//! notifications whose `expires_at` has passed. Several sweepers (or a
//! sweeper and a manual sweep) may overlap; records already removed by
//! another sweep are simply not counted.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::service::{NotificationService, ServiceResult};

/// Default delay between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

// ---------------------------------------------------------------------------
// ExpirySweeper
// ---------------------------------------------------------------------------

/// Background service that deletes expired notifications on an interval.
pub struct ExpirySweeper {
    service: Arc<NotificationService>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(service: Arc<NotificationService>, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Run the sweep loop.
    ///
    /// Sweeps immediately, then once per interval. The loop exits
    /// gracefully when the provided [`CancellationToken`] is cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Expiry sweeper cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.sweep().await {
                        tracing::error!(error = %e, "Failed to delete expired notifications");
                    }
                }
            }
        }
    }

    /// Run a single sweep, returning how many notifications were deleted.
    pub async fn sweep(&self) -> ServiceResult<u64> {
        let deleted = self.service.delete_expired().await?;
        if deleted > 0 {
            tracing::info!(deleted, "Deleted expired notifications");
        }
        Ok(deleted)
    }
}

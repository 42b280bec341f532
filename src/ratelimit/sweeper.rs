// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Background task that drops finished rate-limit windows so the store does
//! not grow with every caller ever seen.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::RateLimitStore;

/// Default interval between sweeps.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub struct RateLimitSweeper {
    store: Arc<dyn RateLimitStore>,
    interval: Duration,
}

impl RateLimitSweeper {
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self {
            store,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Rate limit sweeper starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Rate limit sweeper shutting down");
                    return;
                }
            }

            let removed = self.store.remove_expired(Instant::now());
            if removed > 0 {
                debug!(removed, "Removed expired rate limit windows");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::InMemoryRateLimitStore;

    #[tokio::test]
    async fn sweeps_expired_windows_and_stops_on_cancel() {
        let store = Arc::new(InMemoryRateLimitStore::new());
        store.hit("gone", Instant::now(), Duration::ZERO);
        store.hit("kept", Instant::now(), Duration::from_secs(3600));

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(
            RateLimitSweeper::new(store.clone())
                .with_interval(Duration::from_millis(10))
                .run(shutdown.clone()),
        );

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.len(), 1);

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper should stop after cancellation")
            .unwrap();
    }
}

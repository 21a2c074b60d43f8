//! Polite pacing between consecutive sites.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Keeps a fixed pause between the end of one site and the start of the
/// next, however long the site itself took. The first site never waits.
/// Waits are not cancellable.
pub struct SitePacer {
    min_delay: Duration,
    last_finish: Mutex<Option<Instant>>,
}

impl SitePacer {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_finish: Mutex::new(None),
        }
    }

    /// Mark the current site as done. The next `wait_turn` counts from here.
    pub async fn site_finished(&self) {
        *self.last_finish.lock().await = Some(Instant::now());
    }

    /// Wait until the next site may start, returning how long was waited.
    pub async fn wait_turn(&self) -> Duration {
        let last = self.last_finish.lock().await;
        let Some(finished) = *last else {
            return Duration::ZERO;
        };
        let waited = self.min_delay.saturating_sub(finished.elapsed());
        if !waited.is_zero() {
            tokio::time::sleep(waited).await;
        }
        waited
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }
}

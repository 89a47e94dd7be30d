//! Randomized pauses between requests to the register

use std::time::Duration;

use rand::{Rng, thread_rng};
use tracing::debug;

/// Sleeps a random duration within a fixed range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    min: Duration,
    max: Duration,
}

impl Pacer {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    /// Draw the next pause
    pub fn next_delay(&self) -> Duration {
        if self.max == self.min {
            return self.min;
        }
        thread_rng().gen_range(self.min..=self.max)
    }

    pub async fn pause(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        debug!("Pausing for {:?}", delay);
        tokio::time::sleep(delay).await;
    }
}

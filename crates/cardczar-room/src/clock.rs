//! Wall-clock milliseconds that follow tokio time.
//!
//! Rooms persist timestamps (timer arm time, last activity) in Unix
//! milliseconds. Reading them through a tokio [`Instant`] keeps them in
//! step with paused test time as well as with `sleep_until` deadlines.

use std::time::{SystemTime, UNIX_EPOCH};

use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct Clock {
    epoch_ms: u64,
    started: Instant,
}

impl Clock {
    /// Anchored at the current system time.
    pub fn system() -> Self {
        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self::starting_at(epoch_ms)
    }

    /// Anchored at a fixed timestamp, for tests.
    pub fn starting_at(epoch_ms: u64) -> Self {
        Self {
            epoch_ms,
            started: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.epoch_ms + self.started.elapsed().as_millis() as u64
    }

    /// The tokio instant corresponding to `at_ms`; the past clamps to now.
    pub fn instant_at(&self, at_ms: u64) -> Instant {
        let now_ms = self.now_ms();
        Instant::now() + std::time::Duration::from_millis(at_ms.saturating_sub(now_ms))
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_now_ms_follows_paused_time() {
        let clock = Clock::starting_at(1_000);
        assert_eq!(clock.now_ms(), 1_000);
        tokio::time::advance(Duration::from_millis(2_500)).await;
        assert_eq!(clock.now_ms(), 3_500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_instant_at_past_is_now() {
        let clock = Clock::starting_at(10_000);
        assert_eq!(clock.instant_at(5_000), Instant::now());
        assert_eq!(clock.instant_at(12_000), Instant::now() + Duration::from_secs(2));
    }
}

//! Clock abstraction for polling loops
//!
//! Every suspension point in the trading cycle sleeps through this trait,
//! so tests can drive the loops on virtual time instead of real delays.

use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by the tokio timer
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock for tests: sleeps return immediately and accumulate
/// the requested duration so tests can assert on elapsed virtual time.
#[cfg(test)]
pub(crate) struct ManualClock {
    slept_ms: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            slept_ms: std::sync::atomic::AtomicU64::new(0),
        }
    }

    pub fn total_slept(&self) -> Duration {
        Duration::from_millis(self.slept_ms.load(std::sync::atomic::Ordering::SeqCst))
    }
}

#[cfg(test)]
#[async_trait]
impl Clock for ManualClock {
    async fn sleep(&self, duration: Duration) {
        self.slept_ms.fetch_add(
            duration.as_millis() as u64,
            std::sync::atomic::Ordering::SeqCst,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_clock_accumulates() {
        let clock = ManualClock::new();
        clock.sleep(Duration::from_millis(200)).await;
        clock.sleep(Duration::from_millis(300)).await;
        assert_eq!(clock.total_slept(), Duration::from_millis(500));
    }
}

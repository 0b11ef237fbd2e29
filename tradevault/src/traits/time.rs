//! Time provider abstraction for testable time-dependent code.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

/// Trait for reading the clock and suspending for a delay.
///
/// This abstraction allows code that depends on the current time or on
/// retry delays to be tested with deterministic, instant time.
#[async_trait]
pub trait TimeProvider: Send + Sync + Clone {
    /// Returns the current Unix timestamp in seconds.
    fn now_unix(&self) -> u64;

    /// Suspend the current task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Production implementation that uses the system clock and tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

#[async_trait]
impl TimeProvider for SystemTimeProvider {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

impl SystemTimeProvider {
    pub const fn new() -> Self {
        Self
    }
}

//! Mock time provider for testing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::traits::TimeProvider;

/// Mock time provider with controllable time value.
///
/// `sleep` returns immediately, advances the clock and records the
/// requested duration so retry delays can be asserted.
#[derive(Debug, Clone)]
pub struct MockTime {
    current_ms: Arc<AtomicU64>,
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl MockTime {
    /// Create a new mock time provider starting at the specified timestamp.
    pub fn new(initial_time: u64) -> Self {
        Self {
            current_ms: Arc::new(AtomicU64::new(initial_time.saturating_mul(1000))),
            sleeps: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock time provider starting at a reasonable default (2024-01-01).
    pub fn default_time() -> Self {
        Self::new(1_704_067_200)
    }

    /// Set the current time to a specific value.
    pub fn set(&self, timestamp: u64) {
        self.current_ms
            .store(timestamp.saturating_mul(1000), Ordering::SeqCst);
    }

    /// Advance time by the specified number of seconds.
    pub fn advance(&self, seconds: u64) {
        self.current_ms
            .fetch_add(seconds.saturating_mul(1000), Ordering::SeqCst);
    }

    /// Durations passed to `sleep`, in call order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }
}

impl Default for MockTime {
    fn default() -> Self {
        Self::default_time()
    }
}

#[async_trait]
impl TimeProvider for MockTime {
    fn now_unix(&self) -> u64 {
        self.current_ms.load(Ordering::SeqCst) / 1000
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
        let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self.current_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

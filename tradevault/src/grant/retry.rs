//! Bounded retry with a fixed delay between attempts.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::config::{VaultConfig, AUTO_GRANT_RETRY_DELAY_MS, MAX_AUTO_GRANT_ATTEMPTS};
use crate::error::VaultError;
use crate::traits::TimeProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_AUTO_GRANT_ATTEMPTS,
            delay: Duration::from_millis(AUTO_GRANT_RETRY_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &VaultConfig) -> Self {
        Self::new(
            config.grant_max_attempts,
            Duration::from_millis(config.grant_retry_delay_ms),
        )
    }
}

/// Result of a retried operation.
#[derive(Debug)]
pub enum RetryOutcome<R> {
    Succeeded { value: R, attempts: u32 },
    Exhausted { attempts: u32, last_error: VaultError },
}

impl<R> RetryOutcome<R> {
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Succeeded { attempts, .. } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Run `op` up to `policy.max_attempts` times, sleeping `policy.delay`
/// between failed attempts.
///
/// `op` receives the 1-based attempt number. `on_failure` is told the
/// attempt number, the error and whether another attempt follows.
pub async fn retry_with_delay<T, F, Fut, R, H>(
    policy: RetryPolicy,
    time: &T,
    mut op: F,
    mut on_failure: H,
) -> RetryOutcome<R>
where
    T: TimeProvider,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<R, VaultError>>,
    H: FnMut(u32, &VaultError, bool),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => {
                return RetryOutcome::Succeeded {
                    value,
                    attempts: attempt,
                }
            }
            Err(e) => {
                let will_retry = attempt < max_attempts;
                on_failure(attempt, &e, will_retry);
                if !will_retry {
                    return RetryOutcome::Exhausted {
                        attempts: attempt,
                        last_error: e,
                    };
                }
            }
        }
        debug!("Retrying in {:?} (attempt {} of {})", policy.delay, attempt + 1, max_attempts);
        time.sleep(policy.delay).await;
        attempt += 1;
    }
}

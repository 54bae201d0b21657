//! Constant-interval retry
//!
//! Re-invokes an operation with a fixed pause between attempts. The policy has
//! no attempt limit of its own; callers bound it with [`ConstantBackoff::retry_until`]
//! when the target might never converge.

use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Retry loop gave up
#[derive(Error, Debug)]
pub enum RetryError<E> {
    #[error("gave up after {attempts} attempts in {elapsed:?}: {last}")]
    TimedOut {
        attempts: u32,
        elapsed: Duration,
        last: E,
    },
}

/// Fixed delay between attempts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConstantBackoff {
    interval: Duration,
}

impl ConstantBackoff {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Retry until the operation succeeds, however long that takes
    pub async fn retry<T, E, F, Fut>(&self, mut operation: F) -> T
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return value,
                Err(e) => {
                    debug!(
                        "Attempt {} failed: {}, retrying in {:?}",
                        attempt, e, self.interval
                    );
                    sleep(self.interval).await;
                }
            }
        }
    }

    /// Retry until the operation succeeds or `timeout` has elapsed
    ///
    /// An attempt is never started once the deadline has passed, and the loop
    /// does not sleep past the deadline only to give up afterwards.
    pub async fn retry_until<T, E, F, Fut>(
        &self,
        timeout: Duration,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let start = Instant::now();
        let interval = self.interval;
        let mut attempt = 0u32;

        // Giving up is reported as a successful attempt so the unbounded loop ends.
        self.retry(|| {
            attempt += 1;
            let attempts = attempt;
            let pending = operation();
            async move {
                match pending.await {
                    Ok(value) => {
                        debug!("Succeeded after {} attempt(s)", attempts);
                        Ok(Ok(value))
                    }
                    Err(last) => {
                        let elapsed = start.elapsed();
                        if elapsed + interval > timeout {
                            Ok(Err(RetryError::TimedOut {
                                attempts,
                                elapsed,
                                last,
                            }))
                        } else {
                            Err(last)
                        }
                    }
                }
            }
        })
        .await
    }
}

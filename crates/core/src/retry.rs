//! `RetryPolicy` for transient `NetworkError`/`TimeoutError` (spec §4.10,
//! §4.13). Grounded on `discovery::udp_multicast::RetryPolicy` /
//! `discovery::protocol::RetryPolicy`, generalized here from socket
//! bring-up into a reusable policy for any fallible async operation.

use std::future::Future;
use std::time::Duration;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy)]
pub enum BackoffKind {
    Linear,
    Exponential,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub kind: BackoffKind,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_millis(200), kind: BackoffKind::Exponential }
    }
}

impl RetryPolicy {
    pub fn linear(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts, base_delay, kind: BackoffKind::Linear }
    }

    pub fn exponential(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts, base_delay, kind: BackoffKind::Exponential }
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self.kind {
            BackoffKind::Linear => self.base_delay * attempt,
            BackoffKind::Exponential => self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1)),
        }
    }

    /// Retries `operation` up to `max_attempts` times. Only transient
    /// errors (`CoreError::is_transient`) are retried; anything else
    /// propagates immediately (spec §7: "AuthError ... not retried").
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    tokio::time::sleep(self.delay_for_attempt(attempt)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let policy = RetryPolicy::linear(5, Duration::from_millis(1));
        let attempts = AtomicU32::new(0);
        let result = policy
            .run(|| async {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(CoreError::Network("not yet".into()))
                } else {
                    Ok(n)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn does_not_retry_non_transient_errors() {
        let policy = RetryPolicy::linear(5, Duration::from_millis(1));
        let attempts = AtomicU32::new(0);
        let result = policy
            .run(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(CoreError::Auth("bad secret".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let policy = RetryPolicy::linear(3, Duration::from_millis(1));
        let attempts = AtomicU32::new(0);
        let result = policy
            .run(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(CoreError::Timeout("slow".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}

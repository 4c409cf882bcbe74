//! Bounded retry for flaky UI automation steps.
//!
//! Retry policy is a handler-level concern: the dispatcher never retries.
//! Attempts are strictly bounded and the backoff is linear.

use std::future::Future;
use std::time::Duration;

use crate::error::ServerError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

/// Run `op` up to `policy.attempts` times, sleeping `backoff * attempt`
/// between failures. Caller mistakes are not retried here: only automation
/// action errors are considered transient.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, ServerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServerError>>,
{
    let attempts = policy.attempts.max(1);
    let mut last = None;
    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err @ ServerError::AutomationAction { .. }) => {
                if attempt < attempts {
                    tracing::debug!(attempt, "Automation step failed, retrying: {}", err);
                    tokio::time::sleep(policy.backoff * attempt).await;
                }
                last = Some(err);
            }
            // Anything else is not transient — surface immediately.
            Err(err) => return Err(err),
        }
    }
    Err(last.expect("at least one attempt ran"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_transient_failures_up_to_bound() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            attempts: 3,
            backoff: Duration::ZERO,
        };
        let result: Result<(), _> = with_retry(policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ServerError::automation("click", "button", "flaky")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            attempts: 3,
            backoff: Duration::ZERO,
        };
        let result = with_retry(policy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(ServerError::automation("click", "button", "flaky"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 1);
    }

    #[tokio::test]
    async fn non_transient_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(RetryPolicy::default(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ServerError::SessionClosed) }
        })
        .await;
        assert!(matches!(result, Err(ServerError::SessionClosed)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

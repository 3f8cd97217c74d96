//! Caller-side retry policy for read-only portal requests

use crate::config::schema::ProxyConfig;
use crate::error::PortalResult;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounded retry with linear backoff
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Delay before retry `n` is `base_delay * n`
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Never retry
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Build the policy from proxy configuration
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Run `op`, retrying only errors that report themselves retryable
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> PortalResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = PortalResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "{} failed ({}), retry {}/{}",
                        what, e, attempt, self.max_retries
                    );
                    tokio::time::sleep(self.base_delay * attempt).await;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PortalError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn retries_transport_errors_until_success() {
        let calls = AtomicU32::new(0);
        let result = fast(3)
            .run("fetch", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(PortalError::Transport("reset".into()))
                } else {
                    Ok(7)
                }
            })
            .await
            .unwrap();

        assert_eq!(result, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn session_expiry_is_not_retried() {
        let calls = AtomicU32::new(0);
        let err = fast(3)
            .run("fetch", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(PortalError::SessionExpired)
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PortalError::SessionExpired));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_budget() {
        let calls = AtomicU32::new(0);
        let err = fast(1)
            .run("fetch", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(PortalError::RequestFailed { status: 503 })
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PortalError::RequestFailed { status: 503 }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(RetryPolicy::none().max_retries, 0);
    }
}

//! Bounded retry with connection recovery
//!
//! A unit of work is retried as a whole. Between attempts the warehouse pool
//! is reset, because a failed query may leave its connection unusable, and
//! the worker waits a fixed backoff. Only transient errors are retried.

use crate::adapters::warehouse::Warehouse;
use crate::config::ExportConfig;
use crate::domain::{ErrorClass, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Attempts and backoff for one unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// Create a policy; `max_attempts` is raised to at least one
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Policy from the `[export]` section
    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_secs(config.backoff_seconds),
        )
    }

    /// Maximum number of times the action runs
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Fixed wait between attempts
    pub fn backoff(&self) -> Duration {
        self.backoff
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(10, Duration::from_secs(20))
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Recover and run the action again
    Retry,
    /// Surface the error to the caller
    GiveUp,
}

/// Decide whether attempt number `attempt` (1-based) may be followed by another
pub fn retry_decision(class: ErrorClass, attempt: u32, max_attempts: u32) -> RetryDecision {
    match class {
        ErrorClass::Transient if attempt < max_attempts => RetryDecision::Retry,
        _ => RetryDecision::GiveUp,
    }
}

/// Result of a retried action together with the number of attempts made
#[derive(Debug)]
pub struct Attempted<T> {
    /// Final outcome; on failure, the error of the last attempt
    pub result: Result<T>,
    /// Number of times the action ran
    pub attempts: u32,
}

/// Runs units of work under a [`RetryPolicy`]
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    warehouse: Arc<dyn Warehouse>,
}

impl RetryExecutor {
    /// Create an executor that resets `warehouse` connections between attempts
    pub fn new(policy: RetryPolicy, warehouse: Arc<dyn Warehouse>) -> Self {
        Self { policy, warehouse }
    }

    /// Run `action` until it succeeds, fails fatally or runs out of attempts
    pub async fn run_with_retry<T, F, Fut>(&self, operation: &str, action: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run_counted(operation, action).await.result
    }

    /// Like [`run_with_retry`](Self::run_with_retry), also reporting the attempt count
    pub async fn run_counted<T, F, Fut>(&self, operation: &str, mut action: F) -> Attempted<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match action().await {
                Ok(value) => {
                    return Attempted {
                        result: Ok(value),
                        attempts: attempt,
                    }
                }
                Err(e) => e,
            };

            match retry_decision(error.class(), attempt, max_attempts) {
                RetryDecision::Retry => {
                    crate::log_retry_attempt!(
                        operation,
                        attempt,
                        max_attempts,
                        self.policy.backoff,
                        &error
                    );
                    self.warehouse.reset_connections().await;
                    if !self.policy.backoff.is_zero() {
                        tokio::time::sleep(self.policy.backoff).await;
                    }
                }
                RetryDecision::GiveUp => {
                    if error.is_transient() {
                        tracing::error!(
                            operation = operation,
                            attempts = attempt,
                            error = %error,
                            "Retries exhausted"
                        );
                    } else {
                        tracing::error!(
                            operation = operation,
                            attempt = attempt,
                            error = %error,
                            "Fatal error, not retrying"
                        );
                    }
                    return Attempted {
                        result: Err(error),
                        attempts: attempt,
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::warehouse::WarehouseSession;
    use crate::domain::ExportError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct CountingWarehouse {
        resets: AtomicU32,
    }

    #[async_trait]
    impl Warehouse for CountingWarehouse {
        async fn open_session(&self) -> Result<Box<dyn WarehouseSession>> {
            Err(ExportError::Warehouse("not used".to_string()))
        }

        async fn reset_connections(&self) {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn executor(max_attempts: u32) -> (RetryExecutor, Arc<CountingWarehouse>) {
        let warehouse = Arc::new(CountingWarehouse::default());
        let executor = RetryExecutor::new(
            RetryPolicy::new(max_attempts, Duration::ZERO),
            warehouse.clone(),
        );
        (executor, warehouse)
    }

    #[test]
    fn test_retry_decision() {
        assert_eq!(
            retry_decision(ErrorClass::Transient, 1, 10),
            RetryDecision::Retry
        );
        assert_eq!(
            retry_decision(ErrorClass::Transient, 9, 10),
            RetryDecision::Retry
        );
        assert_eq!(
            retry_decision(ErrorClass::Transient, 10, 10),
            RetryDecision::GiveUp
        );
        assert_eq!(
            retry_decision(ErrorClass::Fatal, 1, 10),
            RetryDecision::GiveUp
        );
    }

    #[test]
    fn test_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 10);
        assert_eq!(policy.backoff(), Duration::from_secs(20));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let (executor, warehouse) = executor(10);
        let calls = &AtomicU32::new(0);

        let outcome = executor
            .run_counted("test", move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n <= 3 {
                    Err(ExportError::Warehouse(format!("timeout {n}")))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(outcome.result.unwrap(), 4);
        assert_eq!(outcome.attempts, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(warehouse.resets.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_exactly_max_attempts() {
        let (executor, warehouse) = executor(10);
        let calls = &AtomicU32::new(0);

        let result: Result<()> = executor
            .run_with_retry("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ExportError::Storage("503".to_string()))
            })
            .await;

        assert!(matches!(result, Err(ExportError::Storage(ref m)) if m == "503"));
        assert_eq!(calls.load(Ordering::SeqCst), 10);
        assert_eq!(warehouse.resets.load(Ordering::SeqCst), 9);
    }

    #[tokio::test]
    async fn test_fatal_error_not_retried() {
        let (executor, warehouse) = executor(10);
        let calls = &AtomicU32::new(0);

        let outcome: Attempted<()> = executor
            .run_counted("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ExportError::Invariant("missing column".to_string()))
            })
            .await;

        assert!(matches!(outcome.result, Err(ExportError::Invariant(_))));
        assert_eq!(outcome.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(warehouse.resets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_backoff_between_attempts() {
        let warehouse = Arc::new(CountingWarehouse::default());
        let executor = RetryExecutor::new(
            RetryPolicy::new(3, Duration::from_secs(20)),
            warehouse.clone(),
        );
        let start = tokio::time::Instant::now();

        let result: Result<()> = executor
            .run_with_retry("test", || async {
                Err(ExportError::Warehouse("down".to_string()))
            })
            .await;

        assert!(result.is_err());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(40));
        assert!(elapsed < Duration::from_secs(41));
    }
}

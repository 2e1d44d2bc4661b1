//! Async completion waiter
//!
//! Some provider mutations take effect asynchronously; the provider reports
//! a status that moves forward through `Pending`/`InProgress` into a terminal
//! `Succeeded` or `Failed`. [`await_completion`] polls that status at a fixed
//! interval until it is terminal or the wait budget runs out. The wait is a
//! cooperative suspension point, not a blocking sleep; concurrent waiters on
//! the same resource poll independently and the provider remains the single
//! source of truth.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{ProvisionError, Result};
use crate::provider::ProviderError;

/// Status of an asynchronous provider operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    InProgress,
    Succeeded,
    Failed,
}

impl OperationStatus {
    /// A terminal status admits no further transition
    pub fn is_terminal(self) -> bool {
        matches!(self, OperationStatus::Succeeded | OperationStatus::Failed)
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationStatus::Pending => "pending",
            OperationStatus::InProgress => "in progress",
            OperationStatus::Succeeded => "succeeded",
            OperationStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Polling interval and total wait budget for [`await_completion`]
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Delay between consecutive polls
    pub poll_interval: Duration,
    /// Total time allowed before the wait gives up
    pub budget: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            budget: Duration::from_secs(60),
        }
    }
}

/// Poll `poll` until it reports a terminal status or the budget is exhausted.
///
/// The first poll is issued immediately, so an operation that is already
/// terminal completes without sleeping. A terminal `Failed` becomes
/// [`ProvisionError::OperationFailed`]; budget exhaustion while still
/// non-terminal is a hard [`ProvisionError::Timeout`]. Nothing is retried
/// and nothing provider-side is rolled back on either error.
pub async fn await_completion<F, Fut>(
    identity: &str,
    mut poll: F,
    config: &WaitConfig,
) -> Result<OperationStatus>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<OperationStatus, ProviderError>>,
{
    let mut remaining = config.budget;
    let mut status = poll().await.map_err(|e| ProvisionError::Provider {
        operation: "poll",
        identity: identity.to_string(),
        message: e.to_string(),
    })?;

    while !status.is_terminal() {
        if remaining < config.poll_interval {
            warn!(%identity, last = %status, "wait budget exhausted");
            return Err(ProvisionError::Timeout {
                identity: identity.to_string(),
                budget_ms: config.budget.as_millis() as u64,
                last: status,
            });
        }

        debug!(%identity, %status, "operation not terminal, waiting");
        sleep(config.poll_interval).await;
        remaining -= config.poll_interval;

        status = poll().await.map_err(|e| ProvisionError::Provider {
            operation: "poll",
            identity: identity.to_string(),
            message: e.to_string(),
        })?;
    }

    if status == OperationStatus::Failed {
        return Err(ProvisionError::OperationFailed {
            identity: identity.to_string(),
            last: status,
        });
    }

    debug!(%identity, "operation reached terminal success");
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_poll(
        polls: Arc<AtomicUsize>,
        sequence: Vec<OperationStatus>,
    ) -> impl FnMut() -> std::pin::Pin<
        Box<dyn Future<Output = std::result::Result<OperationStatus, ProviderError>> + Send>,
    > {
        move || {
            let n = polls.fetch_add(1, Ordering::SeqCst);
            let status = sequence
                .get(n)
                .copied()
                .unwrap_or(*sequence.last().unwrap_or(&OperationStatus::InProgress));
            Box::pin(async move { Ok(status) })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_success_polls_once_with_zero_sleeps() {
        let polls = Arc::new(AtomicUsize::new(0));
        let poll = counting_poll(polls.clone(), vec![OperationStatus::Succeeded]);

        let started = tokio::time::Instant::now();
        let status = await_completion("function demo", poll, &WaitConfig::default())
            .await
            .unwrap();

        assert_eq!(status, OperationStatus::Succeeded);
        assert_eq!(polls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_operation_times_out_within_budget() {
        let polls = Arc::new(AtomicUsize::new(0));
        let poll = counting_poll(polls.clone(), vec![OperationStatus::InProgress]);
        let config = WaitConfig {
            poll_interval: Duration::from_secs(5),
            budget: Duration::from_secs(60),
        };

        let started = tokio::time::Instant::now();
        let err = await_completion("function demo", poll, &config)
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::Timeout { .. }));
        // Initial poll plus one per interval that fits in the budget.
        assert_eq!(polls.load(Ordering::SeqCst), 13);
        assert!(started.elapsed() <= config.budget);
    }

    #[tokio::test(start_paused = true)]
    async fn forward_transitions_reach_success() {
        let polls = Arc::new(AtomicUsize::new(0));
        let poll = counting_poll(
            polls.clone(),
            vec![
                OperationStatus::Pending,
                OperationStatus::InProgress,
                OperationStatus::Succeeded,
            ],
        );

        let status = await_completion("function demo", poll, &WaitConfig::default())
            .await
            .unwrap();

        assert_eq!(status, OperationStatus::Succeeded);
        assert_eq!(polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_failure_is_reported_as_operation_failed() {
        let polls = Arc::new(AtomicUsize::new(0));
        let poll = counting_poll(
            polls.clone(),
            vec![OperationStatus::InProgress, OperationStatus::Failed],
        );

        let err = await_completion("function demo", poll, &WaitConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProvisionError::OperationFailed {
                last: OperationStatus::Failed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn poll_errors_propagate_unretried() {
        let polls = Arc::new(AtomicUsize::new(0));
        let counter = polls.clone();
        let poll = move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::Failure("throttled".to_string())) }
        };

        let err = await_completion("function demo", poll, &WaitConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::Provider { .. }));
        assert_eq!(polls.load(Ordering::SeqCst), 1);
    }
}

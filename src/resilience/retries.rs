//! Retry driver shared by the provider clients.
//!
//! # Responsibilities
//! - Run one attempt at a time, at most `max_attempts` times
//! - Sleep per the backoff policy between attempts
//! - Turn an exhausted budget into `RetriesExhausted`
//!
//! Classifying a response is the caller's job: each attempt reports either a
//! final [`CallResult`] or a transient [`RetryReason`], never both.

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::providers::{CallResult, ErrorKind, Provider, ProviderFailure};
use crate::resilience::backoff::calculate_backoff;

/// Why an attempt asked to be retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    /// Provider signalled rate limiting or quota exhaustion.
    RateLimited(String),
    /// Transport failure: timeout, DNS, connection reset, non-success status.
    Network(String),
}

impl RetryReason {
    fn label(&self) -> &'static str {
        match self {
            RetryReason::RateLimited(_) => "rate_limited",
            RetryReason::Network(_) => "network",
        }
    }

    fn detail(&self) -> &str {
        match self {
            RetryReason::RateLimited(detail) | RetryReason::Network(detail) => detail,
        }
    }
}

/// Outcome of a single attempt.
#[derive(Debug)]
pub enum Attempt {
    /// Final result, success or non-transient failure.
    Done(CallResult),
    /// Transient condition; try again after backing off.
    Retry(RetryReason),
}

/// Attempt ceiling and base delay for one provider client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay to wait after the given 0-based attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.base_delay())
    }
}

/// Per-call retry bookkeeping. Lives for one provider call only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RetryState {
    attempt: u32,
    delay: Duration,
}

impl RetryState {
    fn start(policy: &RetryPolicy) -> Self {
        Self {
            attempt: 0,
            delay: policy.delay_for_attempt(0),
        }
    }

    fn has_budget(&self, policy: &RetryPolicy) -> bool {
        self.attempt < policy.max_attempts
    }

    fn is_final(&self, policy: &RetryPolicy) -> bool {
        self.attempt + 1 >= policy.max_attempts
    }

    fn advance(self, policy: &RetryPolicy) -> Self {
        let attempt = self.attempt + 1;
        Self {
            attempt,
            delay: policy.delay_for_attempt(attempt),
        }
    }
}

/// Drive `attempt_fn` until it yields a result or the budget runs out.
///
/// `attempt_fn` receives the 0-based attempt index. The caller is suspended
/// while backing off; no delay follows the final attempt.
pub async fn run_with_retries<F, Fut>(
    policy: &RetryPolicy,
    provider: Provider,
    mut attempt_fn: F,
) -> CallResult
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt>,
{
    let mut state = RetryState::start(policy);
    while state.has_budget(policy) {
        let reason = match attempt_fn(state.attempt).await {
            Attempt::Done(result) => {
                metrics::record_provider_call(provider, &result);
                return result;
            }
            Attempt::Retry(reason) => reason,
        };

        metrics::record_retry(provider, reason.label());

        if state.is_final(policy) {
            tracing::warn!(
                provider = provider.as_str(),
                attempt = state.attempt,
                reason = reason.label(),
                detail = %reason.detail(),
                "Final attempt failed"
            );
            break;
        }

        tracing::info!(
            provider = provider.as_str(),
            attempt = state.attempt,
            delay_ms = state.delay.as_millis() as u64,
            reason = reason.label(),
            detail = %reason.detail(),
            "Retrying provider call"
        );
        tokio::time::sleep(state.delay).await;
        state = state.advance(policy);
    }

    let result = Err(ProviderFailure::new(
        ErrorKind::RetriesExhausted,
        format!(
            "Max retries exceeded for {} API call due to rate limits or network issues.",
            provider.display_name()
        ),
    ));
    metrics::record_provider_call(provider, &result);
    result
}

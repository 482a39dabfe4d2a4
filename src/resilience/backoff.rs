//! Exponential backoff.

use std::time::Duration;

/// Calculate the delay before the retry following `attempt` (0-based).
///
/// Returns `base * 2^attempt`. No cap and no jitter: total wait is bounded
/// only by the attempt ceiling of the caller.
pub fn calculate_backoff(attempt: u32, base: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    base.saturating_mul(factor)
}

//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Provider call:
//!     → provider client issues one attempt (with its own timeout)
//!     → classifier decides: final result, or transient (retry)
//!     → retries.rs sleeps per backoff.rs and runs the next attempt
//!     → budget exhausted: RetriesExhausted
//! ```
//!
//! # Design Decisions
//! - Fixed attempt ceiling, no wall-clock deadline
//! - Backoff doubles from the base delay with no cap and no jitter
//! - Non-transient failures never consume retry budget

pub mod backoff;
pub mod retries;

pub use backoff::calculate_backoff;
pub use retries::{run_with_retries, Attempt, RetryPolicy, RetryReason};

//! Full-report subsystem.
//!
//! # Data Flow
//! ```text
//! ticker
//!     → aggregator.rs (four concurrent financial-data calls)
//!     → types.rs (extract sections, record labeled failures)
//!     → termination policy (no quote and no overview → failure)
//! ```

pub mod aggregator;
pub mod types;

pub use aggregator::ReportAggregator;
pub use types::{AggregateReport, ReportError, Section, SectionError};

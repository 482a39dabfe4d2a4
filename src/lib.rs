//! Stock report proxy library.
//!
//! Hides the financial-data and generative-text provider keys from browser
//! clients, retries transient provider failures with exponential backoff,
//! and merges several provider calls into one full report.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod providers;
pub mod report;
pub mod resilience;

pub use config::{Credentials, ProxyConfig};
pub use http::HttpServer;
pub use lifecycle::Shutdown;

//! Upstream provider clients.
//!
//! # Data Flow
//! ```text
//! validated parameters + credential
//!     → financial.rs / generative.rs (one outbound request per attempt)
//!     → provider-specific classifier (final result or transient)
//!     → resilience::retries (backoff, attempt ceiling)
//!     → result.rs (CallResult = Ok(payload) | Err(ProviderFailure))
//! ```
//!
//! # Security Constraints
//! - Credentials come from `config::Credentials`, never from globals
//! - Request URLs carry the financial key and are never logged

pub mod financial;
pub mod generative;
pub mod result;

pub use financial::{
    classify_financial_response, FinancialClassification, FinancialClient, FinancialRequest,
};
pub use generative::{
    classify_generation, GenerationClassification, GenerativeClient, REPORT_SECTIONS,
};
pub use result::{CallResult, ErrorKind, ProviderFailure};

/// Identifies an upstream provider in logs, metrics and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Financial,
    Generative,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Financial => "financial",
            Provider::Generative => "generative",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Financial => "Alpha Vantage",
            Provider::Generative => "Gemini",
        }
    }
}

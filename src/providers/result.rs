//! Normalized outcome of one provider call.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Category of a failed provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The provider's credential is missing.
    NotConfigured,
    /// The provider reported rate limiting and the condition is not retried.
    RateLimited,
    /// Transport failure surfaced without retrying.
    NetworkError,
    /// The provider reported a semantic error (bad symbol, bad call).
    ProviderError,
    /// The response could not be parsed or carried no content.
    MalformedResponse,
    /// Every attempt hit a transient condition.
    RetriesExhausted,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotConfigured => "not_configured",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::ProviderError => "provider_error",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::RetriesExhausted => "retries_exhausted",
        }
    }

    /// Message used when the provider gave none.
    fn fallback_message(&self) -> &'static str {
        match self {
            ErrorKind::NotConfigured => "The provider API key is not configured in the server.",
            ErrorKind::RateLimited => "The provider rate limit was reached. Please try again later.",
            ErrorKind::NetworkError => "The provider could not be reached.",
            ErrorKind::ProviderError => "The provider returned an error.",
            ErrorKind::MalformedResponse => "The provider response was empty or malformed.",
            ErrorKind::RetriesExhausted => "Max retries exceeded for the provider call.",
        }
    }
}

/// A failed provider call: a kind plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl ProviderFailure {
    /// Build a failure, substituting a generic message for a blank one.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            kind.fallback_message().to_string()
        } else {
            message
        };
        Self { kind, message }
    }
}

/// Result of one provider call: the provider payload, or why there is none.
///
/// Being a `Result`, a value is always exactly one of success or failure.
pub type CallResult = Result<Value, ProviderFailure>;

/// Case-insensitive check for rate-limit wording in provider text.
pub fn mentions_rate_limit(text: &str) -> bool {
    text.to_lowercase().contains("rate limit")
}

/// Case-insensitive check for quota or rate-limit wording.
pub fn mentions_quota_or_rate_limit(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("quota") || lower.contains("rate limit")
}

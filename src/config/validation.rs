//! Configuration validation.
//!
//! Serde handles syntax; this pass checks value ranges and URLs and returns
//! every problem found, not just the first.

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address must not be empty")]
    EmptyBindAddress,

    #[error("retries.max_attempts must be at least 1")]
    NoAttempts,

    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("generative.model must not be empty")]
    EmptyModel,
}

/// Validate a configuration, collecting all errors.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.trim().is_empty() {
        errors.push(ValidationError::EmptyBindAddress);
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::NoAttempts);
    }

    if Url::parse(&config.financial.base_url).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field: "financial.base_url",
            value: config.financial.base_url.clone(),
        });
    }

    if Url::parse(&config.generative.base_url).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field: "generative.base_url",
            value: config.generative.base_url.clone(),
        });
    }

    if config.financial.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("financial.timeout_secs"));
    }

    if config.generative.timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout("generative.timeout_secs"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    }

    if config.generative.model.trim().is_empty() {
        errors.push(ValidationError::EmptyModel);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! Inbound request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every request
//! - Sanitize path parameters before they reach a provider
//! - Extract the prompt from a generation request body

use axum::http::{HeaderValue, Request};
use serde::Deserialize;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request ID, in both directions.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID set by the request-id layer.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Keep only ASCII letters, digits, `.`, `-` and `_`.
pub fn sanitize_symbol(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect()
}

/// Sanitized, upper-cased ticker, or `None` when nothing usable remains.
pub fn sanitize_ticker(raw: &str) -> Option<String> {
    let ticker = sanitize_symbol(raw).to_ascii_uppercase();
    (!ticker.is_empty()).then_some(ticker)
}

/// Body of a generation request: `{"contents":[{"parts":[{"text":"..."}]}]}`.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub contents: Vec<PromptContent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PromptContent {
    #[serde(default)]
    pub parts: Vec<PromptPart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PromptPart {
    pub text: Option<String>,
}

impl GenerateRequest {
    /// Text of the first part of the first content entry, if non-blank.
    pub fn prompt(&self) -> Option<&str> {
        self.contents
            .first()?
            .parts
            .first()?
            .text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

//! Generative-text provider client (Gemini `generateContent`).
//!
//! The model is asked for JSON constrained by a response schema: an object
//! whose properties are the report sections, each a string. The payload of a
//! successful call is the raw JSON text the model produced.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::GenerativeConfig;
use crate::providers::result::{mentions_quota_or_rate_limit, CallResult, ErrorKind, ProviderFailure};
use crate::providers::Provider;
use crate::resilience::{run_with_retries, Attempt, RetryPolicy, RetryReason};

/// Sections the model must fill, in display order.
pub const REPORT_SECTIONS: [&str; 9] = [
    "fundamentals",
    "management",
    "guidance",
    "competition",
    "risks",
    "targetPrice",
    "revenueForecast",
    "bottomLine",
    "recommendation",
];

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

/// How a generation response should be treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationClassification {
    /// Generated text of the first candidate.
    Content(String),
    /// Well-formed response without any generated content.
    Empty,
    /// Quota or rate limiting: transient, retried.
    QuotaExceeded(String),
    /// Any other provider error.
    Rejected(String),
    /// Successful status but a body that is not a generation response.
    Unparsable(String),
}

impl GenerationClassification {
    fn into_attempt(self) -> Attempt {
        match self {
            GenerationClassification::Content(text) => Attempt::Done(Ok(Value::String(text))),
            GenerationClassification::Empty => Attempt::Done(Err(ProviderFailure::new(
                ErrorKind::MalformedResponse,
                "Gemini API response was empty or malformed.",
            ))),
            GenerationClassification::QuotaExceeded(message) => {
                Attempt::Retry(RetryReason::RateLimited(message))
            }
            GenerationClassification::Rejected(message) => Attempt::Done(Err(ProviderFailure::new(
                ErrorKind::ProviderError,
                format!("An unexpected error occurred during AI content generation: {}", message),
            ))),
            GenerationClassification::Unparsable(detail) => Attempt::Done(Err(ProviderFailure::new(
                ErrorKind::MalformedResponse,
                format!("Gemini API response was empty or malformed: {}", detail),
            ))),
        }
    }
}

/// Classify a generation response by HTTP status and body.
pub fn classify_generation(status: u16, body: &str) -> GenerationClassification {
    if !(200..300).contains(&status) {
        let message = match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => match envelope.error.status {
                Some(code) if envelope.error.message.is_empty() => code,
                Some(code) => format!("{} ({})", envelope.error.message, code),
                None => envelope.error.message,
            },
            Err(_) => format!("HTTP {}", status),
        };
        return if status == 429 || mentions_quota_or_rate_limit(&message) {
            GenerationClassification::QuotaExceeded(message)
        } else {
            GenerationClassification::Rejected(message)
        };
    }

    let response: GenerateContentResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) => return GenerationClassification::Unparsable(e.to_string()),
    };

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        GenerationClassification::Empty
    } else {
        GenerationClassification::Content(text)
    }
}

/// Request body asking for JSON constrained to the report-section schema.
pub fn build_request_body(prompt: &str) -> Value {
    let properties: Map<String, Value> = REPORT_SECTIONS
        .iter()
        .map(|section| (section.to_string(), json!({ "type": "STRING" })))
        .collect();

    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": properties
            }
        }
    })
}

/// Client for the generative-text provider.
#[derive(Clone)]
pub struct GenerativeClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    timeout: Option<Duration>,
    retry_policy: RetryPolicy,
    api_key: Option<String>,
}

impl GenerativeClient {
    /// Create a client. A `None` key makes every call fail with `NotConfigured`.
    pub fn new(config: &GenerativeConfig, retry_policy: RetryPolicy, api_key: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("stock-report-proxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let endpoint = format!(
            "{}/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        Self {
            http,
            endpoint,
            model: config.model.clone(),
            timeout: config.timeout_secs.map(Duration::from_secs),
            retry_policy,
            api_key,
        }
    }

    /// Whether a credential is present.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate report sections for `prompt`, with retries.
    pub async fn generate(&self, prompt: &str) -> CallResult {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::error!("Gemini API key is not configured");
            return Err(ProviderFailure::new(
                ErrorKind::NotConfigured,
                "Gemini API key is not configured in the server.",
            ));
        };

        let body = build_request_body(prompt);
        run_with_retries(&self.retry_policy, Provider::Generative, |attempt| {
            self.attempt(&body, api_key, attempt)
        })
        .await
    }

    async fn attempt(&self, body: &Value, api_key: &str, attempt: u32) -> Attempt {
        tracing::debug!(model = %self.model, attempt = attempt, "Sending prompt to Gemini");

        let mut request = self
            .http
            .post(&self.endpoint)
            .header(API_KEY_HEADER, api_key)
            .json(body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let e = e.without_url();
                tracing::warn!(attempt = attempt, error = %e, "Network error during Gemini call");
                return Attempt::Retry(RetryReason::Network(e.to_string()));
            }
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(attempt = attempt, error = %e, "Failed to read Gemini response body");
                return Attempt::Retry(RetryReason::Network(e.to_string()));
            }
        };

        let classification = classify_generation(status, &text);
        match &classification {
            GenerationClassification::Content(content) => {
                tracing::debug!(chars = content.len(), "Gemini content received");
            }
            GenerationClassification::QuotaExceeded(message) => {
                tracing::warn!(status = status, message = %message, "Gemini rate limit or quota hit");
            }
            GenerationClassification::Rejected(message) => {
                tracing::error!(status = status, message = %message, "Error during Gemini API call");
            }
            GenerationClassification::Empty | GenerationClassification::Unparsable(_) => {
                tracing::error!(status = status, "Gemini response was empty or malformed");
            }
        }
        classification.into_attempt()
    }
}

impl std::fmt::Debug for GenerativeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerativeClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("retry_policy", &self.retry_policy)
            .field("configured", &self.is_configured())
            .finish()
    }
}

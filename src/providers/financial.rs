//! Financial-data provider client (Alpha Vantage query API).
//!
//! Every call is a `GET {base_url}?function=...&<params>&apikey=...`. The
//! provider answers HTTP 200 even for errors and signals problems through
//! well-known top-level fields, which [`classify_financial_response`] sorts out.

use std::time::{Duration, Instant};

use serde_json::Value;

use crate::config::FinancialConfig;
use crate::providers::result::{mentions_rate_limit, CallResult, ErrorKind, ProviderFailure};
use crate::providers::Provider;
use crate::resilience::{run_with_retries, Attempt, RetryPolicy, RetryReason};

const ERROR_FIELD: &str = "Error Message";
const INFORMATION_FIELD: &str = "Information";

/// One logical query against the financial-data provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinancialRequest {
    SymbolSearch { keywords: String },
    GlobalQuote { symbol: String },
    Overview { symbol: String },
    IncomeStatement { symbol: String },
    Earnings { symbol: String },
    BalanceSheet { symbol: String },
    CashFlow { symbol: String },
}

impl FinancialRequest {
    /// Provider `function` parameter.
    pub fn function(&self) -> &'static str {
        match self {
            FinancialRequest::SymbolSearch { .. } => "SYMBOL_SEARCH",
            FinancialRequest::GlobalQuote { .. } => "GLOBAL_QUOTE",
            FinancialRequest::Overview { .. } => "OVERVIEW",
            FinancialRequest::IncomeStatement { .. } => "INCOME_STATEMENT",
            FinancialRequest::Earnings { .. } => "EARNINGS",
            FinancialRequest::BalanceSheet { .. } => "BALANCE_SHEET",
            FinancialRequest::CashFlow { .. } => "CASH_FLOW",
        }
    }

    /// The call-specific parameter (`keywords` or `symbol`) and its value.
    pub fn parameter(&self) -> (&'static str, &str) {
        match self {
            FinancialRequest::SymbolSearch { keywords } => ("keywords", keywords),
            FinancialRequest::GlobalQuote { symbol }
            | FinancialRequest::Overview { symbol }
            | FinancialRequest::IncomeStatement { symbol }
            | FinancialRequest::Earnings { symbol }
            | FinancialRequest::BalanceSheet { symbol }
            | FinancialRequest::CashFlow { symbol } => ("symbol", symbol),
        }
    }
}

/// How a parsed financial-data response body should be treated.
#[derive(Debug, Clone, PartialEq)]
pub enum FinancialClassification {
    /// Usable data; the whole body is the payload.
    Data(Value),
    /// Error field mentioning a rate limit: transient, retried.
    RetryableRateLimit(String),
    /// Error field with any other text: the request itself is bad.
    Rejected(String),
    /// Information field mentioning a rate limit: surfaced without retrying.
    RateLimited(String),
}

impl FinancialClassification {
    fn label(&self) -> &'static str {
        match self {
            FinancialClassification::Data(_) => "data",
            FinancialClassification::RetryableRateLimit(_) => "retryable_rate_limit",
            FinancialClassification::Rejected(_) => "rejected",
            FinancialClassification::RateLimited(_) => "rate_limited",
        }
    }

    fn into_attempt(self) -> Attempt {
        match self {
            FinancialClassification::Data(body) => Attempt::Done(Ok(body)),
            FinancialClassification::RetryableRateLimit(text) => {
                Attempt::Retry(RetryReason::RateLimited(text))
            }
            FinancialClassification::Rejected(text) => {
                Attempt::Done(Err(ProviderFailure::new(ErrorKind::ProviderError, text)))
            }
            FinancialClassification::RateLimited(text) => {
                Attempt::Done(Err(ProviderFailure::new(ErrorKind::RateLimited, text)))
            }
        }
    }
}

/// Classify a parsed response body.
///
/// The `Note` field ("Thank you for using Alpha Vantage...") is advisory and
/// does not affect the outcome.
pub fn classify_financial_response(body: Value) -> FinancialClassification {
    if let Some(error) = body.get(ERROR_FIELD) {
        let text = field_text(error);
        return if mentions_rate_limit(&text) {
            FinancialClassification::RetryableRateLimit(text)
        } else {
            FinancialClassification::Rejected(text)
        };
    }

    if let Some(information) = body.get(INFORMATION_FIELD) {
        let text = field_text(information);
        if mentions_rate_limit(&text) {
            return FinancialClassification::RateLimited(text);
        }
    }

    FinancialClassification::Data(body)
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Client for the financial-data provider.
#[derive(Clone)]
pub struct FinancialClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    retry_policy: RetryPolicy,
    api_key: Option<String>,
}

impl FinancialClient {
    /// Create a client. A `None` key makes every call fail with `NotConfigured`.
    pub fn new(config: &FinancialConfig, retry_policy: RetryPolicy, api_key: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("stock-report-proxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: config.base_url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            retry_policy,
            api_key,
        }
    }

    /// Whether a credential is present.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Run one logical query with retries.
    pub async fn fetch(&self, request: &FinancialRequest) -> CallResult {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::error!(function = request.function(), "Alpha Vantage API key is not configured");
            return Err(ProviderFailure::new(
                ErrorKind::NotConfigured,
                "Alpha Vantage API key is not configured in the server.",
            ));
        };

        run_with_retries(&self.retry_policy, Provider::Financial, |attempt| {
            self.attempt(request, api_key, attempt)
        })
        .await
    }

    async fn attempt(&self, request: &FinancialRequest, api_key: &str, attempt: u32) -> Attempt {
        let (param, value) = request.parameter();
        let started = Instant::now();

        tracing::debug!(
            function = request.function(),
            param = param,
            value = %value,
            attempt = attempt,
            "Requesting financial data"
        );

        let response = self
            .http
            .get(&self.base_url)
            .query(&[("function", request.function()), (param, value), ("apikey", api_key)])
            .timeout(self.timeout)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        let body = match response {
            Ok(response) => response.text().await,
            Err(e) => Err(e),
        };

        let body = match body {
            Ok(body) => body,
            Err(e) => {
                let e = e.without_url();
                tracing::warn!(
                    function = request.function(),
                    attempt = attempt,
                    error = %e,
                    "Network error during Alpha Vantage call"
                );
                return Attempt::Retry(RetryReason::Network(e.to_string()));
            }
        };

        let data: Value = match serde_json::from_str(&body) {
            Ok(data) => data,
            Err(e) => {
                // Usually an HTML error page from an edge proxy; treated like a failed transfer.
                tracing::warn!(
                    function = request.function(),
                    attempt = attempt,
                    error = %e,
                    "Unparsable Alpha Vantage response"
                );
                return Attempt::Retry(RetryReason::Network(format!(
                    "Alpha Vantage returned a response that is not valid JSON: {}",
                    e
                )));
            }
        };

        let classification = classify_financial_response(data);
        tracing::debug!(
            function = request.function(),
            attempt = attempt,
            elapsed_ms = started.elapsed().as_millis() as u64,
            outcome = classification.label(),
            "Alpha Vantage response classified"
        );
        if let FinancialClassification::RateLimited(text) = &classification {
            tracing::warn!(information = %text, "Alpha Vantage 'Information' rate limit detected");
        }
        classification.into_attempt()
    }
}

impl std::fmt::Debug for FinancialClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinancialClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retry_policy", &self.retry_policy)
            .field("configured", &self.is_configured())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_data_is_success() {
        let body = json!({"Global Quote": {"01. symbol": "IBM"}});
        assert_eq!(
            classify_financial_response(body.clone()),
            FinancialClassification::Data(body)
        );
    }

    #[test]
    fn test_error_field_with_rate_limit_is_retryable() {
        let body = json!({"Error Message": "You have exceeded the Rate Limit for this key."});
        assert!(matches!(
            classify_financial_response(body),
            FinancialClassification::RetryableRateLimit(_)
        ));
    }

    #[test]
    fn test_other_error_field_is_rejected() {
        let body = json!({"Error Message": "Invalid API call. Please retry or visit the documentation."});
        assert_eq!(
            classify_financial_response(body),
            FinancialClassification::Rejected(
                "Invalid API call. Please retry or visit the documentation.".to_string()
            )
        );
    }

    #[test]
    fn test_information_rate_limit_fails_without_retry() {
        let body = json!({"Information": "Our standard API rate limit is 25 requests per day."});
        let classification = classify_financial_response(body);
        assert!(matches!(classification, FinancialClassification::RateLimited(_)));
        match classification.into_attempt() {
            Attempt::Done(Err(failure)) => assert_eq!(failure.kind, ErrorKind::RateLimited),
            other => panic!("unexpected attempt outcome: {:?}", other),
        }
    }

    #[test]
    fn test_unrelated_information_and_note_are_ignored() {
        let body = json!({
            "Information": "The demo API key is for demo purposes only.",
            "Note": "Thank you for using Alpha Vantage!",
            "bestMatches": []
        });
        assert!(matches!(
            classify_financial_response(body),
            FinancialClassification::Data(_)
        ));
    }

    #[test]
    fn test_request_parameters() {
        let search = FinancialRequest::SymbolSearch { keywords: "tesco".into() };
        assert_eq!(search.function(), "SYMBOL_SEARCH");
        assert_eq!(search.parameter(), ("keywords", "tesco"));

        let earnings = FinancialRequest::Earnings { symbol: "IBM".into() };
        assert_eq!(earnings.function(), "EARNINGS");
        assert_eq!(earnings.parameter(), ("symbol", "IBM"));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let client = FinancialClient::new(&FinancialConfig::default(), RetryPolicy::default(), None);
        let failure = client
            .fetch(&FinancialRequest::Overview { symbol: "IBM".into() })
            .await
            .unwrap_err();
        assert_eq!(failure.kind, ErrorKind::NotConfigured);
        assert!(!client.is_configured());
    }
}

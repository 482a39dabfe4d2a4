//! Route handlers.
//!
//! Handlers only validate parameters, call a provider client or the
//! aggregator, and map the result; retry and classification live below them.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::http::request::{sanitize_symbol, sanitize_ticker, GenerateRequest};
use crate::http::response::{ApiError, ApiResult};
use crate::http::server::AppState;
use crate::providers::FinancialRequest;

const INVALID_KEYWORD: &str = "Invalid search keyword provided.";
const INVALID_TICKER: &str = "Invalid ticker symbol provided.";
const NO_MATCHES: &str = "No matching symbols found for your search.";
const NO_PROMPT: &str = "No prompt provided for AI generation.";

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub financial_configured: bool,
    pub generative_configured: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        financial_configured: state.financial.is_configured(),
        generative_configured: state.generative.is_configured(),
    })
}

/// One entry of a symbol search, reshaped from the provider's numbered keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolMatch {
    pub symbol: String,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub region: Option<String>,
    pub currency: Option<String>,
}

/// Usable entries of `bestMatches`; entries without a real symbol are dropped.
pub fn symbol_matches(body: &Value) -> Vec<SymbolMatch> {
    let text = |entry: &Value, key: &str| entry.get(key).and_then(Value::as_str).map(str::to_string);

    body.get("bestMatches")
        .and_then(Value::as_array)
        .map(|matches| {
            matches
                .iter()
                .filter_map(|entry| {
                    let symbol = text(entry, "1. symbol").filter(|s| !s.is_empty() && s != "N/A")?;
                    Some(SymbolMatch {
                        symbol,
                        name: text(entry, "2. name"),
                        kind: text(entry, "3. type"),
                        region: text(entry, "4. region"),
                        currency: text(entry, "8. currency"),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

pub async fn search_symbols(
    State(state): State<AppState>,
    Path(keyword): Path<String>,
) -> ApiResult<Json<Vec<SymbolMatch>>> {
    let keywords = sanitize_symbol(&keyword);
    if keywords.is_empty() {
        return Err(ApiError::bad_request(INVALID_KEYWORD));
    }

    let body = state
        .financial
        .fetch(&FinancialRequest::SymbolSearch { keywords })
        .await?;

    let matches = symbol_matches(&body);
    if matches.is_empty() {
        tracing::debug!("No valid options found after filtering symbol matches");
        return Err(ApiError::not_found(NO_MATCHES));
    }
    Ok(Json(matches))
}

async fn proxy_financial(
    state: &AppState,
    ticker: &str,
    request: fn(String) -> FinancialRequest,
) -> ApiResult<Json<Value>> {
    let symbol = sanitize_ticker(ticker).ok_or_else(|| ApiError::bad_request(INVALID_TICKER))?;
    let body = state.financial.fetch(&request(symbol)).await?;
    Ok(Json(body))
}

pub async fn overview(State(state): State<AppState>, Path(ticker): Path<String>) -> ApiResult<Json<Value>> {
    proxy_financial(&state, &ticker, |symbol| FinancialRequest::Overview { symbol }).await
}

pub async fn global_quote(State(state): State<AppState>, Path(ticker): Path<String>) -> ApiResult<Json<Value>> {
    proxy_financial(&state, &ticker, |symbol| FinancialRequest::GlobalQuote { symbol }).await
}

pub async fn income_statement(State(state): State<AppState>, Path(ticker): Path<String>) -> ApiResult<Json<Value>> {
    proxy_financial(&state, &ticker, |symbol| FinancialRequest::IncomeStatement { symbol }).await
}

pub async fn earnings(State(state): State<AppState>, Path(ticker): Path<String>) -> ApiResult<Json<Value>> {
    proxy_financial(&state, &ticker, |symbol| FinancialRequest::Earnings { symbol }).await
}

pub async fn balance_sheet(State(state): State<AppState>, Path(ticker): Path<String>) -> ApiResult<Json<Value>> {
    proxy_financial(&state, &ticker, |symbol| FinancialRequest::BalanceSheet { symbol }).await
}

pub async fn cash_flow(State(state): State<AppState>, Path(ticker): Path<String>) -> ApiResult<Json<Value>> {
    proxy_financial(&state, &ticker, |symbol| FinancialRequest::CashFlow { symbol }).await
}

pub async fn full_report(State(state): State<AppState>, Path(ticker): Path<String>) -> ApiResult<Json<Value>> {
    let symbol = sanitize_ticker(&ticker).ok_or_else(|| ApiError::bad_request(INVALID_TICKER))?;
    let report = state.aggregator.full_report(&symbol).await?;
    Ok(Json(report.to_json()))
}

pub async fn generate_report_sections(
    State(state): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = body.map_err(|e| {
        tracing::debug!(error = %e, "Rejected generation request body");
        ApiError::bad_request(NO_PROMPT)
    })?;
    let prompt = request.prompt().ok_or_else(|| ApiError::bad_request(NO_PROMPT))?;

    let generated = state.generative.generate(prompt).await?;
    let content = match generated {
        Value::String(text) => text,
        other => other.to_string(),
    };
    Ok(Json(json!({ "generated_content": content })))
}

//! Full-report aggregation against a stub financial provider.

use std::time::{Duration, Instant};

use serde_json::{json, Value};

use stock_report_proxy::config::FinancialConfig;
use stock_report_proxy::providers::FinancialClient;
use stock_report_proxy::report::{ReportAggregator, Section};
use stock_report_proxy::resilience::RetryPolicy;

mod common;

fn aggregator_for(base_url: String) -> ReportAggregator {
    let config = FinancialConfig {
        base_url,
        ..FinancialConfig::default()
    };
    let client = FinancialClient::new(
        &config,
        RetryPolicy::new(5, Duration::from_millis(1)),
        Some(common::FINANCIAL_KEY.to_string()),
    );
    ReportAggregator::new(client)
}

fn annual_reports(count: usize) -> Value {
    let reports: Vec<Value> = (0..count)
        .map(|i| json!({"fiscalDateEnding": format!("{}-12-31", 2024 - i), "totalRevenue": "1000"}))
        .collect();
    Value::Array(reports)
}

fn healthy(function: &str) -> (u16, Value) {
    match function {
        "GLOBAL_QUOTE" => (200, json!({"Global Quote": {"01. symbol": "IBM", "05. price": "170.00"}})),
        "OVERVIEW" => (200, json!({"Symbol": "IBM", "Name": "International Business Machines"})),
        "INCOME_STATEMENT" => (200, json!({"symbol": "IBM", "annualReports": annual_reports(5)})),
        "EARNINGS" => (200, json!({"symbol": "IBM", "annualEarnings": annual_reports(4)})),
        other => panic!("unexpected function {}", other),
    }
}

fn invalid_call() -> (u16, Value) {
    (200, json!({"Error Message": "Invalid API call."}))
}

#[tokio::test]
async fn test_complete_report_keeps_three_recent_entries() {
    let (addr, log) = common::financial_stub(|function, _| healthy(function)).await;
    let aggregator = aggregator_for(format!("http://{}/query", addr));

    let report = aggregator.full_report("IBM").await.unwrap();

    assert!(report.errors.is_empty());
    assert_eq!(report.populated_sections(), 4);
    assert_eq!(report.global_quote.as_ref().unwrap()["05. price"], "170.00");
    let income = report.income_statement.as_ref().unwrap();
    assert_eq!(income.len(), 3);
    assert_eq!(income[0]["fiscalDateEnding"], "2024-12-31");
    assert_eq!(report.earnings.as_ref().unwrap().len(), 3);
    assert_eq!(report.to_json()["error"], Value::Null);
    assert_eq!(log.total(), 4);
}

#[tokio::test]
async fn test_missing_quote_and_overview_fails_with_both_labels() {
    let (addr, _log) = common::financial_stub(|function, _| match function {
        "GLOBAL_QUOTE" | "OVERVIEW" => invalid_call(),
        other => healthy(other),
    })
    .await;
    let aggregator = aggregator_for(format!("http://{}/query", addr));

    let error = aggregator.full_report("IBM").await.unwrap_err();

    assert!(error.message.contains("Quote Error: Invalid API call."));
    assert!(error.message.contains("Overview Error: Invalid API call."));
}

#[tokio::test]
async fn test_empty_quote_and_overview_is_not_found() {
    let (addr, _log) = common::financial_stub(|function, _| match function {
        "GLOBAL_QUOTE" => (200, json!({"Global Quote": {}})),
        "OVERVIEW" => (200, json!({})),
        other => healthy(other),
    })
    .await;
    let aggregator = aggregator_for(format!("http://{}/query", addr));

    let error = aggregator.full_report("ZZZZ").await.unwrap_err();

    assert!(error.message.contains("not found"), "got {}", error.message);
}

#[tokio::test]
async fn test_earnings_failure_yields_partial_report() {
    let (addr, _log) = common::financial_stub(|function, _| match function {
        "EARNINGS" => invalid_call(),
        other => healthy(other),
    })
    .await;
    let aggregator = aggregator_for(format!("http://{}/query", addr));

    let report = aggregator.full_report("IBM").await.unwrap();

    assert_eq!(report.populated_sections(), 3);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].section, Section::Earnings);
    assert_eq!(report.narrative(), "Earnings Error: Invalid API call.. ");

    let body = report.to_json();
    assert_eq!(body["earnings"], json!({}));
    assert_eq!(body["error"], "Earnings Error: Invalid API call.. ");
}

#[tokio::test]
async fn test_sub_calls_run_concurrently() {
    let router = axum::Router::new().route(
        "/query",
        axum::routing::get(
            |axum::extract::Query(params): axum::extract::Query<std::collections::HashMap<String, String>>| async move {
                tokio::time::sleep(Duration::from_millis(400)).await;
                let function = params.get("function").cloned().unwrap_or_default();
                axum::Json(healthy(&function).1)
            },
        ),
    );
    let addr = common::serve(router).await;
    let aggregator = aggregator_for(format!("http://{}/query", addr));

    let started = Instant::now();
    let report = aggregator.full_report("IBM").await.unwrap();

    assert_eq!(report.populated_sections(), 4);
    // Four sequential calls would take at least 1.6s.
    assert!(started.elapsed() < Duration::from_millis(1200), "took {:?}", started.elapsed());
}

//! Full-report aggregation.
//!
//! The four sub-calls are independent, so they run concurrently and are
//! joined before merging. Each task owns its own result; nothing is shared
//! while they run.

use std::time::Instant;

use crate::providers::{FinancialClient, FinancialRequest};
use crate::report::types::{AggregateReport, ReportError};

/// Builds full reports from the financial-data client.
#[derive(Debug, Clone)]
pub struct ReportAggregator {
    client: FinancialClient,
}

impl ReportAggregator {
    pub fn new(client: FinancialClient) -> Self {
        Self { client }
    }

    /// Fetch quote, overview, income statement and earnings for `symbol`.
    ///
    /// Partial failures end up in the report narrative; only a report with
    /// neither quote nor overview is an error.
    pub async fn full_report(&self, symbol: &str) -> Result<AggregateReport, ReportError> {
        let started = Instant::now();
        let symbol = symbol.to_string();

        let quote = FinancialRequest::GlobalQuote { symbol: symbol.clone() };
        let overview = FinancialRequest::Overview { symbol: symbol.clone() };
        let income = FinancialRequest::IncomeStatement { symbol: symbol.clone() };
        let earnings = FinancialRequest::Earnings { symbol: symbol.clone() };

        let (quote, overview, income, earnings) = tokio::join!(
            self.client.fetch(&quote),
            self.client.fetch(&overview),
            self.client.fetch(&income),
            self.client.fetch(&earnings),
        );

        let report = AggregateReport::from_results(symbol, quote, overview, income, earnings);
        tracing::info!(
            symbol = %report.symbol,
            populated = report.populated_sections(),
            failed = report.errors.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Full report assembled"
        );

        report.into_outcome()
    }
}

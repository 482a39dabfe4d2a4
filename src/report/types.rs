//! Full-report types.

use serde_json::{json, Value};
use thiserror::Error;

use crate::providers::ProviderFailure;

/// Annual entries kept from income statements and earnings.
pub const RECENT_REPORTS: usize = 3;

/// Used when the report has no primary data and no sub-call said why.
pub const NOT_FOUND_MESSAGE: &str =
    "Stock ticker not found or no data available from Alpha Vantage.";

/// One logical section of the full report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Quote,
    Overview,
    IncomeStatement,
    Earnings,
}

impl Section {
    /// Label used in the error narrative.
    pub fn label(&self) -> &'static str {
        match self {
            Section::Quote => "Quote",
            Section::Overview => "Overview",
            Section::IncomeStatement => "Income Statement",
            Section::Earnings => "Earnings",
        }
    }
}

/// A sub-call failure recorded in the narrative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionError {
    pub section: Section,
    pub message: String,
}

impl std::fmt::Display for SectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Error: {}. ", self.section.label(), self.message)
    }
}

/// The aggregate has no quote and no overview.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ReportError {
    pub message: String,
}

/// Merged result of the four independent financial-data calls.
///
/// Absent sections are `None`; `errors` keeps section order, not completion
/// order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateReport {
    pub symbol: String,
    pub global_quote: Option<Value>,
    pub overview: Option<Value>,
    pub income_statement: Option<Vec<Value>>,
    pub earnings: Option<Vec<Value>>,
    pub errors: Vec<SectionError>,
}

impl AggregateReport {
    /// Merge the four sub-call results into a report.
    pub fn from_results(
        symbol: impl Into<String>,
        quote: Result<Value, ProviderFailure>,
        overview: Result<Value, ProviderFailure>,
        income_statement: Result<Value, ProviderFailure>,
        earnings: Result<Value, ProviderFailure>,
    ) -> Self {
        let mut report = AggregateReport {
            symbol: symbol.into(),
            ..Default::default()
        };

        report.global_quote = report
            .record(Section::Quote, quote)
            .and_then(|body| non_empty(body.get("Global Quote").cloned()));
        report.overview = report
            .record(Section::Overview, overview)
            .and_then(|body| non_empty(Some(body)));
        report.income_statement = report
            .record(Section::IncomeStatement, income_statement)
            .map(|body| recent_entries(&body, "annualReports"));
        report.earnings = report
            .record(Section::Earnings, earnings)
            .map(|body| recent_entries(&body, "annualEarnings"));

        report
    }

    fn record(&mut self, section: Section, result: Result<Value, ProviderFailure>) -> Option<Value> {
        match result {
            Ok(body) => Some(body),
            Err(failure) => {
                self.errors.push(SectionError {
                    section,
                    message: failure.message,
                });
                None
            }
        }
    }

    /// Concatenated per-section errors, empty if every sub-call succeeded.
    pub fn narrative(&self) -> String {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Number of sections that hold data.
    pub fn populated_sections(&self) -> usize {
        [
            self.global_quote.is_some(),
            self.overview.is_some(),
            self.income_statement.is_some(),
            self.earnings.is_some(),
        ]
        .into_iter()
        .filter(|populated| *populated)
        .count()
    }

    /// Apply the termination policy: without quote and overview the whole
    /// report fails; anything else is a (possibly partial) success.
    pub fn into_outcome(self) -> Result<AggregateReport, ReportError> {
        if self.global_quote.is_none() && self.overview.is_none() {
            let narrative = self.narrative();
            let message = if narrative.is_empty() {
                NOT_FOUND_MESSAGE.to_string()
            } else {
                narrative
            };
            return Err(ReportError { message });
        }
        Ok(self)
    }

    /// Response body: absent sections render as empty values, `error` is the
    /// narrative or `null`.
    pub fn to_json(&self) -> Value {
        let narrative = self.narrative();
        json!({
            "symbol": self.symbol,
            "global_quote": self.global_quote.clone().unwrap_or_else(|| json!({})),
            "overview": self.overview.clone().unwrap_or_else(|| json!({})),
            "income_statement": self.income_statement.clone().unwrap_or_default(),
            "earnings": match &self.earnings {
                Some(entries) => json!({ "annualReports": entries }),
                None => json!({}),
            },
            "error": if narrative.is_empty() { Value::Null } else { Value::String(narrative) },
        })
    }
}

fn non_empty(value: Option<Value>) -> Option<Value> {
    value.filter(|value| match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    })
}

/// First `RECENT_REPORTS` entries of an array field; missing field → empty.
pub fn recent_entries(body: &Value, field: &str) -> Vec<Value> {
    body.get(field)
        .and_then(Value::as_array)
        .map(|entries| entries.iter().take(RECENT_REPORTS).cloned().collect())
        .unwrap_or_default()
}

//! Data source traits and request types.
//!
//! Two upstream contracts feed the pipelines:
//!
//! | Trait | Request | Response | Description |
//! |-------|---------|----------|-------------|
//! | [`MarketDataSource`] | [`HistoryRequest`] | [`PriceSeries`] | Adjusted close history |
//! | [`FilingSource`] | [`ConceptRequest`] | `Vec<FilingFact>` | Regulatory filing facts for one tag |
//!
//! The free functions [`fetch_histories`] and [`fetch_bank_filings`] apply the
//! degrade-to-empty policy: a failed call is logged and yields an empty result
//! instead of aborting the run.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::BankProfile;
use crate::{BankFilings, DateRange, FilingFact, Interval, MetricKind, PriceSeries, Symbol, TrailingRange};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    InvalidRequest,
    Parse,
    Internal,
}

/// Structured source error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Parse,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Parse => "source.parse",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Time window of a history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryWindow {
    /// Explicit `[start, end)` range.
    Range(DateRange),
    /// Lookback from today, e.g. `10y`.
    Trailing(TrailingRange),
}

/// Request payload for price history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub window: HistoryWindow,
    pub interval: Interval,
}

impl HistoryRequest {
    pub fn new(symbol: Symbol, window: HistoryWindow, interval: Interval) -> Self {
        Self {
            symbol,
            window,
            interval,
        }
    }
}

/// Request payload for one filing concept of one company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptRequest {
    pub cik: String,
    pub tag: String,
}

impl ConceptRequest {
    pub fn new(cik: impl Into<String>, tag: impl Into<String>) -> Result<Self, SourceError> {
        let cik = cik.into();
        let tag = tag.into();
        if cik.trim().is_empty() {
            return Err(SourceError::invalid_request("concept request requires a CIK"));
        }
        if tag.trim().is_empty() || !tag.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            return Err(SourceError::invalid_request(format!(
                "concept tag '{tag}' must be a non-empty alphanumeric identifier"
            )));
        }
        Ok(Self { cik, tag })
    }
}

/// Market price history provider.
///
/// Implementations must return split/dividend-adjusted closes in date order.
pub trait MarketDataSource: Send + Sync {
    /// Provider name used in diagnostics.
    fn id(&self) -> &'static str;

    fn history<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, SourceError>> + Send + 'a>>;
}

/// Regulatory filing provider.
pub trait FilingSource: Send + Sync {
    fn id(&self) -> &'static str;

    /// Fetches every reported value of one concept tag for one company.
    fn concept<'a>(
        &'a self,
        req: ConceptRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FilingFact>, SourceError>> + Send + 'a>>;
}

/// Fetches history for each symbol in order. Failed symbols are logged and
/// mapped to an empty series.
pub async fn fetch_histories(
    source: &dyn MarketDataSource,
    symbols: &[Symbol],
    window: HistoryWindow,
    interval: Interval,
) -> BTreeMap<Symbol, PriceSeries> {
    let mut histories = BTreeMap::new();
    for symbol in symbols {
        let request = HistoryRequest::new(symbol.clone(), window, interval);
        let series = match source.history(request).await {
            Ok(series) => {
                debug!(symbol = %symbol, points = series.len(), "history fetched");
                series
            }
            Err(error) => {
                warn!(symbol = %symbol, source = source.id(), %error, "history fetch failed");
                PriceSeries::empty(symbol.clone(), interval)
            }
        };
        histories.insert(symbol.clone(), series);
    }
    histories
}

/// Fetches and merges every configured tag for each metric kind of one bank.
///
/// Tags are merged in configuration order; a failing tag contributes no facts.
pub async fn fetch_bank_filings(source: &dyn FilingSource, bank: &BankProfile) -> BankFilings {
    let mut filings = BankFilings::default();

    for kind in [MetricKind::OtherIncome, MetricKind::Profit, MetricKind::AvailableForSale] {
        for tag in bank.tags(kind) {
            let facts = match ConceptRequest::new(bank.cik.as_str(), tag.as_str()) {
                Ok(request) => match source.concept(request).await {
                    Ok(facts) => facts,
                    Err(error) => {
                        warn!(ticker = %bank.ticker, %tag, %error, "filing fetch failed");
                        Vec::new()
                    }
                },
                Err(error) => {
                    warn!(ticker = %bank.ticker, %tag, %error, "invalid filing request");
                    Vec::new()
                }
            };
            debug!(ticker = %bank.ticker, metric = %kind, %tag, facts = facts.len(), "filing facts merged");
            filings.facts_mut(kind).extend(facts);
        }
    }

    filings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concept_request_rejects_path_characters() {
        let err = ConceptRequest::new("CIK0000070858", "../NetIncomeLoss").expect_err("must fail");
        assert_eq!(err.kind(), SourceErrorKind::InvalidRequest);
        assert_eq!(err.code(), "source.invalid_request");
    }

    #[test]
    fn source_error_display_includes_code() {
        let err = SourceError::unavailable("status 503");
        assert_eq!(err.to_string(), "status 503 (source.unavailable)");
        assert!(err.retryable());
    }
}

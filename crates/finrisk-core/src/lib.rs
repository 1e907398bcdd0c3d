//! # Finrisk Core
//!
//! Domain types, settings and upstream data sources shared by the finrisk
//! pipelines.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Yahoo Finance and SEC EDGAR adapters |
//! | [`config`] | `finrisk.toml` settings and the bank tag table |
//! | [`data_source`] | Source traits, request types and degrade-to-empty fetch helpers |
//! | [`domain`] | Symbols, intervals, calendar helpers, price series, filing facts |
//! | [`error`] | Core error types |
//! | [`http_client`] | HTTP transport abstraction |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  finrisk CLI     │
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │ MarketDataSource │────▶│ HTTP Client      │
//! │ FilingSource     │     │ (reqwest/fake)   │
//! └────────┬─────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │ PriceSeries      │
//! │ BankFilings      │
//! └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Source failures are structured and never abort a run; the fetch helpers
//! log them and substitute empty data:
//!
//! ```rust
//! use finrisk_core::{SourceError, SourceErrorKind};
//!
//! fn describe(error: &SourceError) -> &'static str {
//!     match error.kind() {
//!         SourceErrorKind::Unavailable => "upstream down",
//!         SourceErrorKind::InvalidRequest => "bad request",
//!         SourceErrorKind::Parse => "unexpected payload",
//!         SourceErrorKind::Internal => "internal",
//!     }
//! }
//! ```

pub mod adapters;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;

pub use adapters::{SecAdapter, YahooAdapter};

pub use config::{
    default_banks, BankProfile, CommodityHedgingSettings, InterestRateSettings, PortfolioSettings,
    SecSettings, Settings, SmtpSettings, DEFAULT_SETTINGS_FILE, SMTP_PASSWORD_ENV,
};

pub use data_source::{
    fetch_bank_filings, fetch_histories, ConceptRequest, FilingSource, HistoryRequest,
    HistoryWindow, MarketDataSource, SourceError, SourceErrorKind,
};

pub use domain::{
    format_iso_date, month_bounds, months_back, parse_iso_date, BankFilings, DateRange,
    FilingFact, Interval, MetricKind, PricePoint, PriceSeries, Quarter, Symbol, TrailingRange,
};

pub use error::{CoreError, ValidationError};

pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient};

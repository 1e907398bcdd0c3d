//! # Finrisk Analytics
//!
//! Pure computations behind the finrisk pipelines. Nothing here performs I/O.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`filing_index`] | Sorted-interval lookup over filing facts |
//! | [`reconstruction`] | Quarterly period reconstruction state machine |
//! | [`dataset`] | Trading-day alignment and the flat regression table |
//! | [`stats`] | OLS, logit and quantiles |
//! | [`alert`] | Probability threshold predicate |
//! | [`hedging`] | Commodity-hedging risk panel and Tobin's Q |
//! | [`portfolio`] | Mean-variance statistics, VaR/CVaR, maximum-Sharpe weights |

pub mod alert;
pub mod dataset;
pub mod error;
pub mod filing_index;
pub mod hedging;
pub mod portfolio;
pub mod reconstruction;
pub mod stats;

pub use alert::{flagged_tickers, DEFAULT_ALERT_THRESHOLD};
pub use dataset::{align_trading_days, DatasetRow, RegressionDataset, Variable, COLUMNS};
pub use error::{AnalyticsError, AnalyticsResult};
pub use filing_index::{FilingIndex, Period, Span};
pub use hedging::{
    month_end_index, monthly_volatility, risk_panel, tobin_rows, FinancialRow, RiskRow, TobinRow,
    VolatilityWindow,
};
pub use portfolio::{
    max_sharpe, risk_metrics, AssetStatistics, OptimizationConfig, OptimizationResult,
    Performance, ReturnsMatrix, RiskMetrics,
};
pub use reconstruction::{
    reconstruct, BankIndex, PeriodReconstructor, QuarterRecord, ReconstructorState, TradingDay,
    DEFAULT_EXTREME_RETURN,
};
pub use stats::{quantile, BankModels, Coefficient, Design, LogitFit, OlsFit};

//! # Domain Models
//!
//! Canonical types shared by the finrisk pipelines.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated market symbol (`BAC`, `^TYX`, `CL=F`) |
//! | [`Interval`] | Sampling frequency (1d, 1wk, 1mo) |
//! | [`TrailingRange`] | Lookback such as `10y` |
//! | [`Quarter`] | Calendar quarter label |
//! | [`DateRange`] | Half-open date window |
//! | [`PriceSeries`] | Date-ordered adjusted closes |
//! | [`FilingFact`] | One reported filing figure |
//! | [`BankFilings`] | Facts per metric kind for one bank |

mod calendar;
mod interval;
mod models;
mod symbol;

pub use calendar::{format_iso_date, month_bounds, months_back, parse_iso_date, DateRange, Quarter};
pub use interval::{Interval, TrailingRange};
pub use models::{BankFilings, FilingFact, MetricKind, PricePoint, PriceSeries};
pub use symbol::Symbol;

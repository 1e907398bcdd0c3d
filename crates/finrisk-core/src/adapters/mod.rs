//! Upstream adapters.
//!
//! | Adapter | Trait | Upstream |
//! |---------|-------|----------|
//! | [`YahooAdapter`] | [`MarketDataSource`](crate::MarketDataSource) | Yahoo Finance chart API v8 |
//! | [`SecAdapter`] | [`FilingSource`](crate::FilingSource) | SEC EDGAR companyconcept |

mod sec;
mod yahoo;

pub use sec::SecAdapter;
pub use yahoo::YahooAdapter;

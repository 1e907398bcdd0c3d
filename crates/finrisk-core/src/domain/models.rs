use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Interval, Symbol};

/// One adjusted close observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: Date,
    pub close: f64,
}

impl PricePoint {
    pub const fn new(date: Date, close: f64) -> Self {
        Self { date, close }
    }
}

/// Date-ordered adjusted close history for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: Symbol,
    pub interval: Interval,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series sorted by date; later duplicates of a date are dropped
    /// and non-finite closes are skipped.
    pub fn new(symbol: Symbol, interval: Interval, mut points: Vec<PricePoint>) -> Self {
        points.retain(|point| point.close.is_finite());
        points.sort_by_key(|point| point.date);
        points.dedup_by_key(|point| point.date);
        Self {
            symbol,
            interval,
            points,
        }
    }

    pub fn empty(symbol: Symbol, interval: Interval) -> Self {
        Self::new(symbol, interval, Vec::new())
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = Date> + '_ {
        self.points.iter().map(|point| point.date)
    }

    pub fn close_on(&self, date: Date) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |point| point.date)
            .ok()
            .map(|index| self.points[index].close)
    }

    /// Removes a known-bad observation (e.g. the negative oil settlement).
    pub fn without(mut self, date: Date) -> Self {
        self.points.retain(|point| point.date != date);
        self
    }

    /// `ln(p_t / p_{t-1})` for every observation after the first.
    pub fn log_returns(&self) -> Vec<(Date, f64)> {
        self.points
            .windows(2)
            .map(|pair| (pair[1].date, (pair[1].close / pair[0].close).ln()))
            .collect()
    }

    /// `p_t / p_{t-1} - 1` for every observation after the first.
    pub fn simple_returns(&self) -> Vec<(Date, f64)> {
        self.points
            .windows(2)
            .map(|pair| (pair[1].date, pair[1].close / pair[0].close - 1.0))
            .collect()
    }
}

/// One reported figure from a regulatory filing.
///
/// Duration facts (income, comprehensive income) carry a `start`; instant
/// facts (balance-sheet positions such as AFS securities) do not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilingFact {
    pub start: Option<Date>,
    pub end: Date,
    pub value: f64,
}

impl FilingFact {
    pub const fn duration(start: Date, end: Date, value: f64) -> Self {
        Self {
            start: Some(start),
            end,
            value,
        }
    }

    pub const fn instant(end: Date, value: f64) -> Self {
        Self {
            start: None,
            end,
            value,
        }
    }
}

/// Filing metric families merged per bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Profit,
    OtherIncome,
    AvailableForSale,
}

impl MetricKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Profit => "profit",
            Self::OtherIncome => "other_income",
            Self::AvailableForSale => "available_for_sale",
        }
    }
}

impl Display for MetricKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every fact fetched for one bank, grouped by metric kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankFilings {
    pub profit: Vec<FilingFact>,
    pub other_income: Vec<FilingFact>,
    pub available_for_sale: Vec<FilingFact>,
}

impl BankFilings {
    pub fn facts(&self, kind: MetricKind) -> &[FilingFact] {
        match kind {
            MetricKind::Profit => &self.profit,
            MetricKind::OtherIncome => &self.other_income,
            MetricKind::AvailableForSale => &self.available_for_sale,
        }
    }

    pub fn facts_mut(&mut self, kind: MetricKind) -> &mut Vec<FilingFact> {
        match kind {
            MetricKind::Profit => &mut self.profit,
            MetricKind::OtherIncome => &mut self.other_income,
            MetricKind::AvailableForSale => &mut self.available_for_sale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn series(points: &[(Date, f64)]) -> PriceSeries {
        PriceSeries::new(
            Symbol::parse("BAC").expect("symbol"),
            Interval::Weekly,
            points.iter().map(|&(d, c)| PricePoint::new(d, c)).collect(),
        )
    }

    #[test]
    fn series_is_sorted_and_deduplicated() {
        let s = series(&[
            (date!(2024 - 01 - 08), 11.0),
            (date!(2024 - 01 - 01), 10.0),
            (date!(2024 - 01 - 08), 99.0),
            (date!(2024 - 01 - 15), f64::NAN),
        ]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.close_on(date!(2024 - 01 - 08)), Some(11.0));
    }

    #[test]
    fn log_returns_skip_first_observation() {
        let s = series(&[
            (date!(2024 - 01 - 01), 10.0),
            (date!(2024 - 01 - 08), 10.0 * std::f64::consts::E),
        ]);
        let returns = s.log_returns();
        assert_eq!(returns.len(), 1);
        assert_eq!(returns[0].0, date!(2024 - 01 - 08));
        assert!((returns[0].1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn without_removes_single_date() {
        let s = series(&[
            (date!(2020 - 04 - 17), 18.3),
            (date!(2020 - 04 - 20), 0.01),
            (date!(2020 - 04 - 21), 11.6),
        ])
        .without(date!(2020 - 04 - 20));
        assert_eq!(s.len(), 2);
        assert_eq!(s.close_on(date!(2020 - 04 - 20)), None);
    }
}

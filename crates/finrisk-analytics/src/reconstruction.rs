//! Quarterly period reconstruction.
//!
//! A [`PeriodReconstructor`] walks one bank's trading days in date order and
//! rebuilds its fiscal quarters from the windows of its profit filings. Each
//! day drives one transition of [`ReconstructorState`]:
//!
//! ```text
//!                 resolved (observe day)
//! NoOpenRecord ─────────────────────────────▶ Open
//!      │                                      │  ▲
//!      │ unresolved                day > end  │  │ day <= end (observe)
//!      ▼                      emit + reopen   ▼  │
//! Unresolved ◀────────────────────────────── Open ┘
//!      │ resolved (no observation)           ▲
//!      └─────────────────────────────────────┘
//! ```
//!
//! A record is emitted only when a later day passes its end, so the quarter
//! open at the final trading day is never emitted.
//!
//! Quarters are labelled from the opening day. Q1 to Q3 resolve to the
//! narrowest profit window containing that day, so a year-to-date window is
//! never taken for a quarter even when no floor applies. Q4 resolves to the
//! annual window and subtracts the year-to-date sums.

use finrisk_core::{BankFilings, Quarter, Symbol};
use time::{Date, Duration};
use tracing::{debug, trace};

use crate::filing_index::{FilingIndex, Period, Span};

/// Default absolute log return counted as an extreme move.
pub const DEFAULT_EXTREME_RETURN: f64 = 0.10;

/// One aligned observation: the bank's log return (if both prices exist) and
/// the reference rate on the same date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradingDay {
    pub date: Date,
    pub log_return: Option<f64>,
    pub rate: f64,
}

/// Accumulated figures for one company quarter.
#[derive(Debug, Clone, PartialEq)]
pub struct QuarterRecord {
    pub ticker: Symbol,
    pub year: i32,
    pub quarter: Quarter,
    pub start: Date,
    pub end: Date,
    pub return_count: u32,
    pub lowest_rate: f64,
    pub highest_rate: f64,
    pub first_rate: f64,
    pub last_rate: f64,
    /// Quarterly profit in currency units; Q4 is annual minus year-to-date.
    pub profit: f64,
    pub other_income: f64,
    /// Raw available-for-sale balance at `end`.
    pub afs: f64,
}

impl QuarterRecord {
    pub fn extreme_interest_rate(&self) -> f64 {
        self.highest_rate - self.lowest_rate
    }

    pub fn period_interest_rate(&self) -> f64 {
        self.last_rate - self.first_rate
    }

    /// Other income over profit, or zero when either is zero.
    pub fn margin(&self) -> f64 {
        if self.other_income != 0.0 && self.profit != 0.0 {
            self.other_income / self.profit
        } else {
            0.0
        }
    }

    /// `ln(afs)` for a positive balance, otherwise zero.
    pub fn afs_log(&self) -> f64 {
        if self.afs > 0.0 {
            self.afs.ln()
        } else {
            0.0
        }
    }

    fn observe(&mut self, day: &TradingDay, threshold: f64) {
        if day.log_return.is_some_and(|value| value.abs() >= threshold) {
            self.return_count += 1;
        }
        self.lowest_rate = self.lowest_rate.min(day.rate);
        self.highest_rate = self.highest_rate.max(day.rate);
        self.last_rate = day.rate;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct YearToDate {
    profit: f64,
    other_income: f64,
}

/// Indexes over the three metric families of one bank.
#[derive(Debug, Clone, Default)]
pub struct BankIndex {
    pub profit: FilingIndex,
    pub other_income: FilingIndex,
    pub available_for_sale: FilingIndex,
}

impl BankIndex {
    pub fn new(filings: &BankFilings) -> Self {
        Self {
            profit: FilingIndex::new(&filings.profit),
            other_income: FilingIndex::new(&filings.other_income),
            available_for_sale: FilingIndex::new(&filings.available_for_sale),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReconstructorState {
    /// No day has been processed yet.
    NoOpenRecord,
    /// The last opening attempt found no containing profit period.
    Unresolved,
    Open(QuarterRecord),
}

/// Single-pass quarter accumulator for one bank.
#[derive(Debug, Clone)]
pub struct PeriodReconstructor {
    ticker: Symbol,
    index: BankIndex,
    extreme_return: f64,
    state: ReconstructorState,
    previous_date: Option<Date>,
    last_emitted_end: Option<Date>,
    year_to_date: YearToDate,
}

impl PeriodReconstructor {
    pub fn new(ticker: Symbol, filings: &BankFilings) -> Self {
        Self::with_index(ticker, BankIndex::new(filings))
    }

    pub fn with_index(ticker: Symbol, index: BankIndex) -> Self {
        Self {
            ticker,
            index,
            extreme_return: DEFAULT_EXTREME_RETURN,
            state: ReconstructorState::NoOpenRecord,
            previous_date: None,
            last_emitted_end: None,
            year_to_date: YearToDate::default(),
        }
    }

    pub fn with_extreme_return(mut self, threshold: f64) -> Self {
        self.extreme_return = threshold;
        self
    }

    pub fn state(&self) -> &ReconstructorState {
        &self.state
    }

    /// Advances by one trading day; returns the record completed by it, if any.
    pub fn step(&mut self, day: &TradingDay) -> Option<QuarterRecord> {
        let state = std::mem::replace(&mut self.state, ReconstructorState::Unresolved);
        let mut emitted = None;

        self.state = match state {
            ReconstructorState::NoOpenRecord => match self.open(day, None) {
                Some(mut record) => {
                    record.observe(day, self.extreme_return);
                    ReconstructorState::Open(record)
                }
                None => ReconstructorState::Unresolved,
            },
            ReconstructorState::Unresolved => self.reopen(day),
            ReconstructorState::Open(record) if day.date > record.end => {
                debug!(
                    ticker = %record.ticker,
                    year = record.year,
                    quarter = %record.quarter,
                    returns = record.return_count,
                    "quarter completed"
                );
                self.last_emitted_end = Some(record.end);
                emitted = Some(record);
                self.reopen(day)
            }
            ReconstructorState::Open(mut record) => {
                record.observe(day, self.extreme_return);
                ReconstructorState::Open(record)
            }
        };

        self.previous_date = Some(day.date);
        emitted
    }

    /// Opening after the first day: non-Q4 quarters must start on or after
    /// the previous trading day, which excludes year-to-date windows.
    fn reopen(&mut self, day: &TradingDay) -> ReconstructorState {
        let floor = match Quarter::of(day.date) {
            Quarter::Q4 => None,
            _ => self.previous_date,
        };
        match self.open(day, floor) {
            Some(record) => ReconstructorState::Open(record),
            None => ReconstructorState::Unresolved,
        }
    }

    fn open(&mut self, day: &TradingDay, floor: Option<Date>) -> Option<QuarterRecord> {
        let quarter = Quarter::of(day.date);
        let span = match quarter {
            Quarter::Q4 => Span::Widest,
            _ => Span::Narrowest,
        };
        let Some(period) = self.index.profit.period_containing(day.date, floor, span) else {
            trace!(ticker = %self.ticker, date = %day.date, "no profit period contains date");
            return None;
        };

        if quarter == Quarter::Q1 {
            self.year_to_date = YearToDate::default();
        }

        let (profit, other_income) = self.quarter_figures(quarter, period);
        let start = match quarter {
            // Q4 filings are annual; the quarter begins after the last one emitted.
            Quarter::Q4 => self
                .last_emitted_end
                .filter(|end| *end >= period.start && *end < period.end)
                .map(|end| end + Duration::days(1))
                .unwrap_or(period.start),
            _ => period.start,
        };

        Some(QuarterRecord {
            ticker: self.ticker.clone(),
            year: day.date.year(),
            quarter,
            start,
            end: period.end,
            return_count: 0,
            lowest_rate: day.rate,
            highest_rate: day.rate,
            first_rate: day.rate,
            last_rate: day.rate,
            profit,
            other_income,
            afs: self
                .index
                .available_for_sale
                .value_ending(period.end)
                .unwrap_or(0.0),
        })
    }

    /// Profit and other income for `period`, net of year-to-date sums in Q4.
    fn quarter_figures(&mut self, quarter: Quarter, period: Period) -> (f64, f64) {
        let profit = self.index.profit.value_for(period);
        let other_income = self.index.other_income.value_for(period);

        if quarter == Quarter::Q4 {
            let figures = (
                profit.map_or(0.0, |value| value - self.year_to_date.profit),
                other_income.map_or(0.0, |value| value - self.year_to_date.other_income),
            );
            self.year_to_date = YearToDate::default();
            return figures;
        }

        let figures = (profit.unwrap_or(0.0), other_income.unwrap_or(0.0));
        self.year_to_date.profit += figures.0;
        self.year_to_date.other_income += figures.1;
        figures
    }
}

/// Runs a fresh reconstructor over `days` and collects every emitted quarter.
pub fn reconstruct(
    ticker: &Symbol,
    filings: &BankFilings,
    days: &[TradingDay],
    extreme_return: f64,
) -> Vec<QuarterRecord> {
    let mut reconstructor =
        PeriodReconstructor::new(ticker.clone(), filings).with_extreme_return(extreme_return);
    days.iter()
        .filter_map(|day| reconstructor.step(day))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use finrisk_core::FilingFact;
    use time::macros::date;

    fn ticker() -> Symbol {
        Symbol::parse("BAC").expect("valid symbol")
    }

    fn day(date: Date, log_return: f64, rate: f64) -> TradingDay {
        TradingDay {
            date,
            log_return: Some(log_return),
            rate,
        }
    }

    fn filings() -> BankFilings {
        BankFilings {
            profit: vec![
                FilingFact::duration(date!(2023 - 01 - 01), date!(2023 - 03 - 31), 10.0),
                FilingFact::duration(date!(2023 - 04 - 01), date!(2023 - 06 - 30), 12.0),
            ],
            other_income: vec![FilingFact::duration(
                date!(2023 - 01 - 01),
                date!(2023 - 03 - 31),
                -4.0,
            )],
            available_for_sale: vec![FilingFact::instant(date!(2023 - 03 - 31), 1000.0)],
        }
    }

    #[test]
    fn first_day_is_observed_when_resolved() {
        let mut reconstructor = PeriodReconstructor::new(ticker(), &filings());
        assert!(reconstructor
            .step(&day(date!(2023 - 01 - 06), 0.2, 4.0))
            .is_none());

        let ReconstructorState::Open(record) = reconstructor.state() else {
            panic!("record should be open");
        };
        assert_eq!(record.return_count, 1);
        assert_eq!(record.quarter, Quarter::Q1);
    }

    #[test]
    fn unresolved_day_opens_nothing_and_retries() {
        let mut reconstructor = PeriodReconstructor::new(ticker(), &filings());
        reconstructor.step(&day(date!(2022 - 12 - 30), 0.0, 4.0));
        assert_eq!(reconstructor.state(), &ReconstructorState::Unresolved);

        reconstructor.step(&day(date!(2023 - 01 - 06), 0.5, 4.1));
        let ReconstructorState::Open(record) = reconstructor.state() else {
            panic!("record should be open");
        };
        assert_eq!(record.return_count, 0, "opening day is not observed");
        assert_eq!(record.first_rate, 4.1);
    }

    #[test]
    fn emits_when_day_passes_end() {
        let mut reconstructor = PeriodReconstructor::new(ticker(), &filings());
        reconstructor.step(&day(date!(2023 - 03 - 24), 0.0, 4.0));
        reconstructor.step(&day(date!(2023 - 03 - 31), 0.0, 3.5));
        let record = reconstructor
            .step(&day(date!(2023 - 04 - 07), 0.0, 3.9))
            .expect("Q1 emitted");

        assert_eq!(record.end, date!(2023 - 03 - 31));
        assert_eq!(record.profit, 10.0);
        assert_eq!(record.other_income, -4.0);
        assert!((record.margin() + 0.4).abs() < 1e-12);
        assert!((record.afs_log() - 1000f64.ln()).abs() < 1e-12);
        assert!((record.extreme_interest_rate() - 0.5).abs() < 1e-12);
        assert!((record.period_interest_rate() + 0.5).abs() < 1e-12);
    }

    #[test]
    fn missing_return_is_never_counted() {
        let mut record_day = day(date!(2023 - 02 - 03), 0.0, 4.0);
        record_day.log_return = None;
        let mut reconstructor = PeriodReconstructor::new(ticker(), &filings());
        reconstructor.step(&day(date!(2023 - 01 - 06), 0.0, 4.0));
        reconstructor.step(&record_day);
        reconstructor.step(&TradingDay {
            log_return: Some(f64::NAN),
            ..day(date!(2023 - 02 - 10), 0.0, 4.0)
        });

        let ReconstructorState::Open(record) = reconstructor.state() else {
            panic!("record should be open");
        };
        assert_eq!(record.return_count, 0);
    }

    #[test]
    fn margin_is_zero_when_either_side_is_zero() {
        let record = QuarterRecord {
            ticker: ticker(),
            year: 2023,
            quarter: Quarter::Q1,
            start: date!(2023 - 01 - 01),
            end: date!(2023 - 03 - 31),
            return_count: 0,
            lowest_rate: 0.0,
            highest_rate: 0.0,
            first_rate: 0.0,
            last_rate: 0.0,
            profit: 0.0,
            other_income: -7.0,
            afs: -3.0,
        };
        assert_eq!(record.margin(), 0.0);
        assert_eq!(record.afs_log(), 0.0);
        assert_eq!(QuarterRecord { profit: -2.0, other_income: 0.0, ..record }.margin(), 0.0);
    }
}

//! Market alignment and the flat regression table.

use std::collections::{BTreeMap, BTreeSet};

use finrisk_core::{PriceSeries, Quarter, Symbol};
use time::Date;

use crate::reconstruction::{QuarterRecord, TradingDay};

/// Column headers of the exported table, in order.
pub const COLUMNS: [&str; 12] = [
    "Ticker",
    "Year",
    "Quarter",
    "Start",
    "End",
    "Return",
    "Extreme_Interest_Rate",
    "Period_Interest_Rate",
    "Margin",
    "Profit",
    "Other_Income",
    "AFS",
];

/// One exported quarter. Profit and other income are in thousands.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    pub ticker: String,
    pub year: i32,
    pub quarter: Quarter,
    pub start: Date,
    pub end: Date,
    pub return_count: f64,
    pub extreme_interest_rate: f64,
    pub period_interest_rate: f64,
    pub margin: f64,
    pub profit: f64,
    pub other_income: f64,
    pub afs: f64,
}

impl From<&QuarterRecord> for DatasetRow {
    fn from(record: &QuarterRecord) -> Self {
        Self {
            ticker: record.ticker.to_string(),
            year: record.year,
            quarter: record.quarter,
            start: record.start,
            end: record.end,
            return_count: f64::from(record.return_count),
            extreme_interest_rate: record.extreme_interest_rate(),
            period_interest_rate: record.period_interest_rate(),
            margin: record.margin(),
            profit: record.profit / 1000.0,
            other_income: record.other_income / 1000.0,
            afs: record.afs_log(),
        }
    }
}

/// Numeric dataset columns usable as regression variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    Return,
    ExtremeInterestRate,
    PeriodInterestRate,
    Margin,
    Profit,
    OtherIncome,
    Afs,
}

impl Variable {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Return => "Return",
            Self::ExtremeInterestRate => "Extreme_Interest_Rate",
            Self::PeriodInterestRate => "Period_Interest_Rate",
            Self::Margin => "Margin",
            Self::Profit => "Profit",
            Self::OtherIncome => "Other_Income",
            Self::Afs => "AFS",
        }
    }

    pub fn value(self, row: &DatasetRow) -> f64 {
        match self {
            Self::Return => row.return_count,
            Self::ExtremeInterestRate => row.extreme_interest_rate,
            Self::PeriodInterestRate => row.period_interest_rate,
            Self::Margin => row.margin,
            Self::Profit => row.profit,
            Self::OtherIncome => row.other_income,
            Self::Afs => row.afs,
        }
    }
}

/// Rows for every ticker, concatenated in ticker order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegressionDataset {
    rows: Vec<DatasetRow>,
}

impl RegressionDataset {
    pub fn new(rows: Vec<DatasetRow>) -> Self {
        Self { rows }
    }

    pub fn push_records<'a>(&mut self, records: impl IntoIterator<Item = &'a QuarterRecord>) {
        self.rows.extend(records.into_iter().map(DatasetRow::from));
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<DatasetRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, variable: Variable) -> Vec<f64> {
        self.rows.iter().map(|row| variable.value(row)).collect()
    }

    /// Drops rows with a non-finite numeric field.
    pub fn complete(&self) -> Self {
        const NUMERIC: [Variable; 7] = [
            Variable::Return,
            Variable::ExtremeInterestRate,
            Variable::PeriodInterestRate,
            Variable::Margin,
            Variable::Profit,
            Variable::OtherIncome,
            Variable::Afs,
        ];
        self.filter(|row| NUMERIC.iter().all(|variable| variable.value(row).is_finite()))
    }

    pub fn filter(&self, keep: impl Fn(&DatasetRow) -> bool) -> Self {
        Self {
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        }
    }

    /// Copy with the return count binarised: any extreme move becomes 1.
    pub fn binarized(&self) -> Self {
        Self {
            rows: self
                .rows
                .iter()
                .map(|row| DatasetRow {
                    return_count: if row.return_count > 0.0 { 1.0 } else { 0.0 },
                    ..row.clone()
                })
                .collect(),
        }
    }
}

/// Builds each bank's aligned trading days.
///
/// The calendar is the union of all bank dates without its first date,
/// intersected with the rate dates without their first date. A bank's return
/// on a date is the log change from the previous union date; it is absent
/// when either price is missing.
pub fn align_trading_days(
    banks: &BTreeMap<Symbol, PriceSeries>,
    rates: &PriceSeries,
) -> BTreeMap<Symbol, Vec<TradingDay>> {
    let union = banks
        .values()
        .flat_map(|series| series.dates())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();
    let rate_dates = rates.dates().skip(1).collect::<BTreeSet<_>>();

    banks
        .iter()
        .map(|(symbol, series)| {
            let days = union
                .windows(2)
                .filter(|pair| rate_dates.contains(&pair[1]))
                .filter_map(|pair| {
                    let (previous, date) = (pair[0], pair[1]);
                    let rate = rates.close_on(date)?;
                    let log_return = series
                        .close_on(date)
                        .zip(series.close_on(previous))
                        .map(|(close, prior)| (close / prior).ln())
                        .filter(|value| value.is_finite());
                    Some(TradingDay {
                        date,
                        log_return,
                        rate,
                    })
                })
                .collect();
            (symbol.clone(), days)
        })
        .collect()
}

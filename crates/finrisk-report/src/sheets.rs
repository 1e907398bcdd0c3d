//! Layouts of every workbook the pipelines read or write.

use std::path::{Path, PathBuf};

use finrisk_analytics::{DatasetRow, FinancialRow, RegressionDataset, RiskRow, TobinRow, COLUMNS};
use finrisk_core::Quarter;
use time::macros::format_description;
use time::PrimitiveDateTime;
use tracing::warn;

use crate::error::ReportError;
use crate::table::{Cell, Table};
use crate::xlsx::{read_table, write_table};

pub const DATA_SHEET: &str = "Data";

pub const RISK_COLUMNS: [&str; 7] = ["Ticker", "Date", "FH", "OH", "StDev", "Market_StDev", "Oil_StDev"];

pub const TOBIN_COLUMNS: [&str; 9] = [
    "Ticker", "Year", "FH", "OH", "Q", "Size", "Leverage", "ROA", "Growth",
];

pub const FINANCIAL_COLUMNS: [&str; 11] = [
    "Ticker",
    "Year",
    "FH",
    "OH",
    "Market Cap",
    "Total Sales",
    "Net Income",
    "Total Equity",
    "Total Debt",
    "Total Assets",
    "CAPEX",
];

pub const WEIGHT_COLUMNS: [&str; 3] = ["Tickers", "My Portfolio Weights", "Optimal Portfolio Weights"];

pub fn dataset_table(sheet: &str, dataset: &RegressionDataset) -> Result<Table, ReportError> {
    let mut table = Table::new(sheet, &COLUMNS);
    for row in dataset.rows() {
        table.push_row(vec![
            Cell::text(&row.ticker),
            Cell::number(f64::from(row.year)),
            Cell::text(row.quarter.as_str()),
            Cell::date(row.start),
            Cell::date(row.end),
            Cell::number(row.return_count),
            Cell::number(row.extreme_interest_rate),
            Cell::number(row.period_interest_rate),
            Cell::number(row.margin),
            Cell::number(row.profit),
            Cell::number(row.other_income),
            Cell::number(row.afs),
        ])?;
    }
    Ok(table)
}

pub fn write_dataset(path: &Path, sheet: &str, dataset: &RegressionDataset) -> Result<(), ReportError> {
    write_table(path, &dataset_table(sheet, dataset)?)
}

/// Re-reads a dataset written by [`write_dataset`]. Rows with a blank or
/// unparseable field are dropped.
pub fn read_dataset(path: &Path, sheet: &str) -> Result<RegressionDataset, ReportError> {
    let table = read_table(path, Some(sheet))?;
    let columns = table.columns(&COLUMNS)?;

    let mut dropped = 0usize;
    let rows = table
        .rows()
        .iter()
        .filter_map(|cells| {
            let row = dataset_row(cells, &columns);
            if row.is_none() {
                dropped += 1;
            }
            row
        })
        .collect::<Vec<_>>();
    if dropped > 0 {
        warn!(path = %path.display(), dropped, "dropped incomplete dataset rows");
    }
    Ok(RegressionDataset::new(rows))
}

fn dataset_row(cells: &[Cell], columns: &[usize]) -> Option<DatasetRow> {
    let at = |index: usize| &cells[columns[index]];
    let number = |index: usize| at(index).as_f64().filter(|value| value.is_finite());
    Some(DatasetRow {
        ticker: at(0).as_text()?,
        year: number(1)? as i32,
        quarter: Quarter::parse(&at(2).as_text()?)?,
        start: at(3).as_date()?,
        end: at(4).as_date()?,
        return_count: number(5)?,
        extreme_interest_rate: number(6)?,
        period_interest_rate: number(7)?,
        margin: number(8)?,
        profit: number(9)?,
        other_income: number(10)?,
        afs: number(11)?,
    })
}

pub fn risk_panel_table(rows: &[RiskRow]) -> Result<Table, ReportError> {
    let mut table = Table::new(DATA_SHEET, &RISK_COLUMNS);
    for row in rows {
        table.push_row(vec![
            Cell::text(&row.ticker),
            Cell::date(row.date),
            Cell::optional(row.fh),
            Cell::optional(row.oh),
            Cell::optional(row.stdev),
            Cell::optional(row.market_stdev),
            Cell::optional(row.oil_stdev),
        ])?;
    }
    Ok(table)
}

pub fn tobin_table(rows: &[TobinRow]) -> Result<Table, ReportError> {
    let mut table = Table::new(DATA_SHEET, &TOBIN_COLUMNS);
    for row in rows {
        table.push_row(vec![
            Cell::text(&row.ticker),
            Cell::number(f64::from(row.year)),
            Cell::number(row.fh),
            Cell::number(row.oh),
            Cell::number(row.q),
            Cell::number(row.size),
            Cell::number(row.leverage),
            Cell::number(row.roa),
            Cell::number(row.growth),
        ])?;
    }
    Ok(table)
}

/// Reads the financial input workbook from its first sheet. Rows without a
/// ticker or year are skipped; other blanks become NaN.
pub fn read_financials(path: &Path) -> Result<Vec<FinancialRow>, ReportError> {
    let table = read_table(path, None)?;
    let columns = table.columns(&FINANCIAL_COLUMNS)?;

    Ok(table
        .rows()
        .iter()
        .filter_map(|cells| {
            let number = |index: usize| cells[columns[index]].as_f64().unwrap_or(f64::NAN);
            let ticker = cells[columns[0]].as_text()?;
            let year = cells[columns[1]].as_f64().filter(|value| value.is_finite())? as i32;
            Some(FinancialRow {
                ticker,
                year,
                fh: number(2),
                oh: number(3),
                market_cap: number(4),
                total_sales: number(5),
                net_income: number(6),
                total_equity: number(7),
                total_debt: number(8),
                total_assets: number(9),
                capex: number(10),
            })
        })
        .collect())
}

/// One portfolio line, weights as fractions.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightRow {
    pub ticker: String,
    pub configured: f64,
    pub optimal: f64,
}

/// Weights are written in percent.
pub fn weights_table(rows: &[WeightRow]) -> Result<Table, ReportError> {
    let mut table = Table::new("Sheet1", &WEIGHT_COLUMNS);
    for row in rows {
        table.push_row(vec![
            Cell::text(&row.ticker),
            Cell::number(row.configured * 100.0),
            Cell::number(row.optimal * 100.0),
        ])?;
    }
    Ok(table)
}

/// `<dir>/portfolio_results_<YYYYMMDD_HHMMSS>.xlsx`
pub fn portfolio_results_path(dir: &Path, timestamp: PrimitiveDateTime) -> PathBuf {
    let stamp = timestamp
        .format(format_description!("[year][month][day]_[hour][minute][second]"))
        .unwrap_or_default();
    dir.join(format!("portfolio_results_{stamp}.xlsx"))
}

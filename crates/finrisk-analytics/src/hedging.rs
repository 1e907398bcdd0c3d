//! Commodity-hedging regression inputs: the monthly risk panel and the
//! Tobin's Q table.

use finrisk_core::{month_bounds, months_back, PriceSeries};
use time::{Date, Month};

/// One company-year of the prepared financial workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialRow {
    pub ticker: String,
    pub year: i32,
    /// Financial hedging indicator.
    pub fh: f64,
    /// Operational hedging indicator.
    pub oh: f64,
    pub market_cap: f64,
    pub total_sales: f64,
    pub net_income: f64,
    pub total_equity: f64,
    pub total_debt: f64,
    pub total_assets: f64,
    pub capex: f64,
}

/// Market-model row: one company at one month end.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskRow {
    pub ticker: String,
    pub date: Date,
    pub fh: Option<f64>,
    pub oh: Option<f64>,
    pub stdev: Option<f64>,
    pub market_stdev: Option<f64>,
    pub oil_stdev: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TobinRow {
    pub ticker: String,
    pub year: i32,
    pub fh: f64,
    pub oh: f64,
    pub q: f64,
    pub size: f64,
    pub leverage: f64,
    pub roa: f64,
    pub growth: f64,
}

impl From<&FinancialRow> for TobinRow {
    fn from(row: &FinancialRow) -> Self {
        Self {
            ticker: row.ticker.clone(),
            year: row.year,
            fh: row.fh,
            oh: row.oh,
            q: ((row.total_assets - row.total_equity + row.market_cap) / row.total_assets).ln(),
            size: row.total_assets.ln(),
            leverage: row.total_debt / row.market_cap,
            roa: row.net_income / row.total_assets,
            growth: row.capex / row.total_assets,
        }
    }
}

pub fn tobin_rows(rows: &[FinancialRow]) -> Vec<TobinRow> {
    rows.iter().map(TobinRow::from).collect()
}

/// Tickers in order of first appearance.
pub fn unique_tickers(rows: &[FinancialRow]) -> Vec<String> {
    let mut tickers: Vec<String> = Vec::new();
    for row in rows {
        if !tickers.contains(&row.ticker) {
            tickers.push(row.ticker.clone());
        }
    }
    tickers
}

/// Month ends from `end` backwards, one month apart with the day clamped,
/// while on or after January 31 of `start`'s year.
pub fn month_end_index(start: Date, end: Date) -> Vec<Date> {
    let Ok(floor) = Date::from_calendar_date(start.year(), Month::January, 31) else {
        return Vec::new();
    };
    (0..)
        .map(|shift| months_back(end, shift))
        .take_while(|date| *date >= floor)
        .collect()
}

/// Risk panel skeleton: every ticker against every index date, with FH/OH
/// taken from the prior year's row. Dates in `start_year` have no prior year.
pub fn risk_panel(rows: &[FinancialRow], index: &[Date], start_year: i32) -> Vec<RiskRow> {
    unique_tickers(rows)
        .into_iter()
        .flat_map(|ticker| {
            index.iter().map(move |date| {
                let prior = (date.year() != start_year)
                    .then(|| {
                        rows.iter()
                            .find(|row| row.ticker == ticker && row.year == date.year() - 1)
                    })
                    .flatten();
                RiskRow {
                    ticker: ticker.clone(),
                    date: *date,
                    fh: prior.map(|row| row.fh).filter(|value| value.is_finite()),
                    oh: prior.map(|row| row.oh).filter(|value| value.is_finite()),
                    stdev: None,
                    market_stdev: None,
                    oil_stdev: None,
                }
            })
        })
        .collect()
}

/// Trailing sums over `window` consecutive values; `None` until the window
/// fills and while it holds a non-finite value.
pub fn rolling_sum(values: &[(Date, f64)], window: usize) -> Vec<(Date, Option<f64>)> {
    values
        .iter()
        .enumerate()
        .map(|(i, (date, _))| {
            let sum = (window > 0 && i + 1 >= window)
                .then(|| &values[i + 1 - window..=i])
                .filter(|span| span.iter().all(|(_, value)| value.is_finite()))
                .map(|span| span.iter().map(|(_, value)| value).sum::<f64>());
            (*date, sum)
        })
        .collect()
}

/// Sample standard deviation, `None` for fewer than two values.
pub fn sample_stdev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

/// Volatility settings for [`monthly_volatility`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolatilityWindow {
    /// Daily log returns summed per rolling observation.
    pub rolling: usize,
    /// Minimum rolling observations a month needs to be reported.
    pub min_observations: usize,
}

impl Default for VolatilityWindow {
    fn default() -> Self {
        Self {
            rolling: 100,
            min_observations: 15,
        }
    }
}

/// For each index date, the sample standard deviation of the rolling
/// log-return sums falling in that date's calendar month.
pub fn monthly_volatility(
    series: &PriceSeries,
    index: &[Date],
    window: VolatilityWindow,
) -> Vec<Option<f64>> {
    let sums = rolling_sum(&series.log_returns(), window.rolling)
        .into_iter()
        .filter_map(|(date, sum)| sum.filter(|value| value.is_finite()).map(|value| (date, value)))
        .collect::<Vec<_>>();

    index
        .iter()
        .map(|date| {
            let (first, last) = month_bounds(*date);
            let lo = sums.partition_point(|(day, _)| *day < first);
            let hi = sums.partition_point(|(day, _)| *day <= last);
            let month = sums[lo..hi].iter().map(|(_, value)| *value).collect::<Vec<_>>();
            if month.len() >= window.min_observations {
                sample_stdev(&month)
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use finrisk_core::{Interval, PricePoint, Symbol};
    use time::macros::date;

    fn financial(ticker: &str, year: i32, fh: f64) -> FinancialRow {
        FinancialRow {
            ticker: ticker.to_owned(),
            year,
            fh,
            oh: fh * 2.0,
            market_cap: 50.0,
            total_sales: 80.0,
            net_income: 5.0,
            total_equity: 40.0,
            total_debt: 25.0,
            total_assets: 100.0,
            capex: 10.0,
        }
    }

    #[test]
    fn index_runs_back_to_january_of_start_year() {
        let index = month_end_index(date!(2012 - 01 - 01), date!(2023 - 12 - 31));
        assert_eq!(index.len(), 144);
        assert_eq!(index[0], date!(2023 - 12 - 31));
        assert_eq!(index[1], date!(2023 - 11 - 30));
        assert_eq!(index[10], date!(2023 - 02 - 28));
        assert_eq!(index[143], date!(2012 - 01 - 31));
    }

    #[test]
    fn panel_uses_prior_year_and_skips_start_year() {
        let rows = vec![
            financial("XOM", 2012, 0.1),
            financial("XOM", 2013, 0.2),
            financial("CVX", 2012, 0.3),
        ];
        let index = [date!(2014 - 01 - 31), date!(2013 - 06 - 30), date!(2012 - 03 - 31)];
        let panel = risk_panel(&rows, &index, 2012);

        assert_eq!(panel.len(), 6);
        assert_eq!(panel[0].ticker, "XOM");
        assert_eq!(panel[0].fh, Some(0.2));
        assert_eq!(panel[1].fh, Some(0.1));
        assert_eq!(panel[2].fh, None);
        assert_eq!(panel[3].ticker, "CVX");
        assert_eq!(panel[3].fh, None, "no 2013 row for CVX");
        assert_eq!(panel[4].oh, Some(0.6));
    }

    #[test]
    fn tobin_ratios() {
        let row = TobinRow::from(&financial("XOM", 2015, 0.1));
        assert_relative_eq!(row.q, (110.0f64 / 100.0).ln(), epsilon = 1e-12);
        assert_relative_eq!(row.size, 100f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(row.leverage, 0.5, epsilon = 1e-12);
        assert_relative_eq!(row.roa, 0.05, epsilon = 1e-12);
        assert_relative_eq!(row.growth, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn rolling_sum_waits_for_full_window() {
        let values = [
            (date!(2024 - 01 - 01), 1.0),
            (date!(2024 - 01 - 02), 2.0),
            (date!(2024 - 01 - 03), 3.0),
            (date!(2024 - 01 - 04), 4.0),
        ];
        let sums = rolling_sum(&values, 3)
            .into_iter()
            .map(|(_, sum)| sum)
            .collect::<Vec<_>>();
        assert_eq!(sums, vec![None, None, Some(6.0), Some(9.0)]);
    }

    #[test]
    fn rolling_sum_recovers_once_a_bad_return_leaves_the_window() {
        // Given: flat returns with one NaN from a non-positive close
        let start = date!(2024 - 01 - 01);
        let values = (0..10_i64)
            .map(|i| {
                let value = if i == 2 { f64::NAN } else { 0.01 };
                (start + time::Duration::days(i), value)
            })
            .collect::<Vec<_>>();

        let sums = rolling_sum(&values, 3)
            .into_iter()
            .map(|(_, sum)| sum)
            .collect::<Vec<_>>();

        // Then: only windows touching the NaN are missing
        assert!(sums[..5].iter().all(Option::is_none));
        for sum in &sums[5..] {
            assert_relative_eq!(sum.expect("window is clean"), 0.03, epsilon = 1e-12);
        }
    }

    #[test]
    fn sparse_months_are_not_reported() {
        let start = date!(2024 - 01 - 01);
        let points = (0..40)
            .map(|i| PricePoint::new(start + time::Duration::days(i), 100.0 + (i % 3) as f64))
            .collect();
        let series = PriceSeries::new(Symbol::parse("XOM").expect("symbol"), Interval::Daily, points);
        let window = VolatilityWindow {
            rolling: 5,
            min_observations: 15,
        };

        let stdev = monthly_volatility(&series, &[date!(2024 - 01 - 31), date!(2024 - 02 - 29)], window);
        assert!(stdev[0].is_some(), "January has 26 rolling sums");
        assert!(stdev[1].is_none(), "February has only 9 days of data");
    }
}

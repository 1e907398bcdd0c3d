use finrisk_analytics::{
    max_sharpe, risk_metrics, AssetStatistics, OptimizationConfig, ReturnsMatrix,
};
use finrisk_core::{fetch_histories, DateRange, HistoryWindow, Interval, PriceSeries, Settings, YahooAdapter};
use finrisk_report::{portfolio_results_path, weights_table, write_table, WeightRow};
use time::PrimitiveDateTime;
use tracing::{info, warn};

use crate::cli::PortfolioArgs;
use crate::error::CliError;
use crate::output::{print_portfolio, PortfolioSummary};

pub async fn run(args: &PortfolioArgs, settings: &Settings) -> Result<(), CliError> {
    let config = &settings.portfolio;
    let range = DateRange::new(config.start, config.end)?;

    let mut histories = fetch_histories(
        &YahooAdapter::default(),
        &config.tickers,
        HistoryWindow::Range(range),
        Interval::Monthly,
    )
    .await;
    let series = config
        .tickers
        .iter()
        .map(|ticker| {
            let series = histories
                .remove(ticker)
                .unwrap_or_else(|| PriceSeries::empty(ticker.clone(), Interval::Monthly));
            if series.is_empty() {
                warn!(ticker = %ticker, "no monthly prices");
            }
            series
        })
        .collect::<Vec<_>>();

    let returns = ReturnsMatrix::from_prices(&series);
    let statistics = AssetStatistics::from_returns(&returns)?;
    info!(months = returns.dates.len(), assets = statistics.assets(), "return statistics ready");

    let rf = config.risk_free_rate;
    let optimal = max_sharpe(&statistics, rf, &OptimizationConfig::default())?;
    if !optimal.converged {
        warn!(iterations = optimal.iterations, "sharpe optimisation hit the iteration limit");
    }

    let tickers = config.tickers.iter().map(ToString::to_string).collect::<Vec<_>>();
    print_portfolio(&PortfolioSummary {
        label: "Current portfolio",
        tickers: &tickers,
        weights: &config.weights,
        performance: statistics.performance(&config.weights)?,
        sharpe_ratio: statistics.sharpe_ratio(&config.weights, rf)?,
        risk: risk_metrics(&statistics, &config.weights)?,
    });
    print_portfolio(&PortfolioSummary {
        label: "Maximum-Sharpe portfolio",
        tickers: &tickers,
        weights: &optimal.weights,
        performance: statistics.performance(&optimal.weights)?,
        sharpe_ratio: optimal.sharpe_ratio,
        risk: risk_metrics(&statistics, &optimal.weights)?,
    });

    let rows = tickers
        .iter()
        .zip(config.weights.iter().zip(&optimal.weights))
        .map(|(ticker, (configured, optimal))| WeightRow {
            ticker: ticker.clone(),
            configured: *configured,
            optimal: *optimal,
        })
        .collect::<Vec<_>>();

    let now = super::now();
    let dir = args.results_dir.as_ref().unwrap_or(&config.results_dir);
    let path = portfolio_results_path(dir, PrimitiveDateTime::new(now.date(), now.time()));
    write_table(&path, &weights_table(&rows)?)?;
    info!(output = %path.display(), "portfolio results written");
    Ok(())
}

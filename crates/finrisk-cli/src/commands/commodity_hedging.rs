use finrisk_analytics::hedging::unique_tickers;
use finrisk_analytics::{month_end_index, monthly_volatility, risk_panel, tobin_rows, VolatilityWindow};
use finrisk_core::{fetch_histories, DateRange, HistoryWindow, Interval, PriceSeries, Settings, Symbol, YahooAdapter};
use finrisk_report::{read_financials, risk_panel_table, tobin_table, write_table};
use tracing::{info, warn};

use crate::cli::CommodityHedgingArgs;
use crate::error::CliError;

pub async fn run(args: &CommodityHedgingArgs, settings: &Settings) -> Result<(), CliError> {
    let config = &settings.commodity_hedging;
    let input = args.input.as_ref().unwrap_or(&config.input);

    let financials = read_financials(input)?;
    let tickers = unique_tickers(&financials);
    info!(input = %input.display(), rows = financials.len(), companies = tickers.len(), "financials loaded");

    let companies = tickers
        .iter()
        .map(|ticker| Symbol::parse(ticker))
        .collect::<Result<Vec<_>, _>>()?;
    let mut symbols = companies.clone();
    symbols.push(config.market_index.clone());
    symbols.push(config.oil_index.clone());

    let range = DateRange::new(config.start, config.end)?;
    let mut histories =
        fetch_histories(&YahooAdapter::default(), &symbols, HistoryWindow::Range(range), Interval::Daily).await;

    let mut take = |symbol: &Symbol| {
        histories
            .remove(symbol)
            .unwrap_or_else(|| PriceSeries::empty(symbol.clone(), Interval::Daily))
    };
    let market = take(&config.market_index);
    let oil = config
        .excluded_oil_dates
        .iter()
        .fold(take(&config.oil_index), |series, date| series.without(*date));

    let index = month_end_index(config.start, config.end);
    let window = VolatilityWindow {
        rolling: config.rolling_window,
        min_observations: config.min_month_observations,
    };
    let market_stdev = monthly_volatility(&market, &index, window);
    let oil_stdev = monthly_volatility(&oil, &index, window);

    let mut panel = risk_panel(&financials, &index, config.start.year());
    if !index.is_empty() {
        for (rows, symbol) in panel.chunks_mut(index.len()).zip(&companies) {
            let series = take(symbol);
            if series.is_empty() {
                warn!(ticker = %symbol, "no prices; volatility left blank");
            }
            let stdev = monthly_volatility(&series, &index, window);
            for (i, row) in rows.iter_mut().enumerate() {
                row.stdev = stdev[i];
                row.market_stdev = market_stdev[i];
                row.oil_stdev = oil_stdev[i];
            }
        }
    }

    write_table(&config.market_output, &risk_panel_table(&panel)?)?;
    info!(output = %config.market_output.display(), rows = panel.len(), "risk panel written");

    let tobin = tobin_rows(&financials);
    write_table(&config.tobin_output, &tobin_table(&tobin)?)?;
    info!(output = %config.tobin_output.display(), rows = tobin.len(), "Tobin's Q written");
    Ok(())
}

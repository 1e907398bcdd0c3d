use std::sync::Arc;

use finrisk_analytics::{
    align_trading_days, flagged_tickers, reconstruct, AnalyticsError, BankModels,
    RegressionDataset,
};
use finrisk_core::{
    fetch_bank_filings, fetch_histories, BankProfile, FilingSource, HistoryWindow,
    InterestRateSettings, MarketDataSource, SecAdapter, Settings, Symbol, YahooAdapter,
};
use finrisk_report::{read_dataset, write_dataset, LogTransport, MailTransport, Notifier, SmtpMailer};
use tracing::{info, warn};

use crate::cli::{InterestRateArgs, InterestRateMode};
use crate::error::CliError;
use crate::output;

pub async fn run(args: &InterestRateArgs, settings: &Settings) -> Result<(), CliError> {
    let config = &settings.interest_rate;
    let banks = config.select_banks(&args.tickers)?;

    let dataset = match &args.mode {
        Some(InterestRateMode::Regress(regress)) => {
            let sheet = regress.sheet.as_deref().unwrap_or(&config.sheet);
            let dataset = read_dataset(&regress.input, sheet)?;
            info!(input = %regress.input.display(), rows = dataset.len(), "dataset loaded");
            if args.tickers.is_empty() {
                dataset
            } else {
                dataset.filter(|row| banks.iter().any(|bank| bank.ticker.as_str() == row.ticker))
            }
        }
        None => {
            let market = YahooAdapter::default();
            let filings = SecAdapter::new(&settings.sec);
            let dataset = build_dataset(&market, &filings, &banks, config).await?;
            let path = args.output.as_ref().unwrap_or(&config.output);
            write_dataset(path, &config.sheet, &dataset)?;
            info!(output = %path.display(), rows = dataset.len(), "dataset written");
            dataset
        }
    };

    if dataset.is_empty() {
        return Err(AnalyticsError::InsufficientData {
            required: 1,
            actual: 0,
        }
        .into());
    }

    let models = BankModels::fit(&dataset);
    output::print_bank_models(&models);

    match &models.probabilities {
        Ok(probabilities) => {
            let today = super::now().date();
            let flagged = flagged_tickers(
                models.dataset.rows(),
                probabilities,
                today,
                config.alert_threshold,
            );
            output::print_flagged(&flagged, config.alert_threshold);
            if args.no_email {
                info!(flagged = flagged.len(), "warning e-mail disabled");
            } else {
                notifier(settings).send_warning(&flagged).await;
            }
        }
        Err(error) => warn!(%error, "no logit probabilities; alerting skipped"),
    }

    models.full.map(|_| ()).map_err(CliError::from)
}

/// Fetches prices and filings and reconstructs every bank's quarters, rows
/// concatenated in bank order.
pub(crate) async fn build_dataset(
    market: &dyn MarketDataSource,
    filings: &dyn FilingSource,
    banks: &[&BankProfile],
    config: &InterestRateSettings,
) -> Result<RegressionDataset, CliError> {
    let window = HistoryWindow::Trailing(config.range);
    let tickers = banks.iter().map(|bank| bank.ticker.clone()).collect::<Vec<_>>();

    let prices = fetch_histories(market, &tickers, window, config.interval).await;
    let rates = fetch_histories(
        market,
        std::slice::from_ref(&config.yield_symbol),
        window,
        config.interval,
    )
    .await
    .remove(&config.yield_symbol)
    .filter(|series| !series.is_empty())
    .ok_or_else(|| no_data(&config.yield_symbol))?;

    let days = align_trading_days(&prices, &rates);

    let mut dataset = RegressionDataset::default();
    for bank in banks {
        let Some(bank_days) = days.get(&bank.ticker) else {
            continue;
        };
        let bank_filings = fetch_bank_filings(filings, bank).await;
        let records = reconstruct(
            &bank.ticker,
            &bank_filings,
            bank_days,
            config.extreme_return_threshold,
        );
        info!(ticker = %bank.ticker, days = bank_days.len(), quarters = records.len(), "bank reconstructed");
        dataset.push_records(&records);
    }
    Ok(dataset)
}

fn no_data(symbol: &Symbol) -> CliError {
    CliError::NoData {
        symbol: symbol.to_string(),
    }
}

fn notifier(settings: &Settings) -> Notifier {
    let transport: Arc<dyn MailTransport> = match SmtpMailer::from_env(&settings.smtp) {
        Ok(mailer) => Arc::new(mailer),
        Err(error) => {
            warn!(%error, "SMTP unavailable; warnings will only be logged");
            Arc::new(LogTransport)
        }
    };
    Notifier::from_settings(transport, &settings.smtp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::pin::Pin;

    use finrisk_core::{
        ConceptRequest, FilingFact, HistoryRequest, Interval, PricePoint, PriceSeries,
        SourceError,
    };
    use time::macros::date;
    use time::Date;

    struct FakeMarket;

    impl MarketDataSource for FakeMarket {
        fn id(&self) -> &'static str {
            "fake"
        }

        fn history<'a>(
            &'a self,
            req: HistoryRequest,
        ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, SourceError>> + Send + 'a>> {
            Box::pin(async move {
                let dates: [Date; 4] = [
                    date!(2024 - 02 - 05),
                    date!(2024 - 03 - 04),
                    date!(2024 - 04 - 01),
                    date!(2024 - 07 - 01),
                ];
                let closes = if req.symbol.is_index() {
                    [4.0, 4.2, 4.1, 4.5]
                } else {
                    [100.0, 120.0, 121.0, 122.0]
                };
                let points = dates
                    .iter()
                    .zip(closes)
                    .map(|(date, close)| PricePoint::new(*date, close))
                    .collect();
                Ok(PriceSeries::new(req.symbol, Interval::Weekly, points))
            })
        }
    }

    struct FakeFilings;

    impl FilingSource for FakeFilings {
        fn id(&self) -> &'static str {
            "fake"
        }

        fn concept<'a>(
            &'a self,
            _req: ConceptRequest,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<FilingFact>, SourceError>> + Send + 'a>>
        {
            Box::pin(async move {
                Ok(vec![
                    FilingFact::duration(date!(2024 - 01 - 01), date!(2024 - 03 - 31), 1000.0),
                    FilingFact::duration(date!(2024 - 04 - 01), date!(2024 - 06 - 30), 2000.0),
                ])
            })
        }
    }

    #[tokio::test]
    async fn dataset_is_built_per_bank_in_configured_order() {
        let config = InterestRateSettings::default();
        let banks = config
            .select_banks(&["JPM".to_owned(), "BAC".to_owned()])
            .expect("known banks");

        let dataset = build_dataset(&FakeMarket, &FakeFilings, &banks, &config)
            .await
            .expect("dataset");

        let tickers = dataset.rows().iter().map(|row| row.ticker.as_str()).collect::<Vec<_>>();
        assert_eq!(tickers.len(), 4);
        assert_eq!(tickers, vec!["BAC", "BAC", "JPM", "JPM"]);
        assert_eq!(dataset.rows()[0].start, date!(2024 - 01 - 01));
        assert_eq!(dataset.rows()[0].return_count, 1.0, "20% jump counted");
    }
}

mod commodity_hedging;
mod interest_rate;
mod portfolio;

use finrisk_core::Settings;
use time::OffsetDateTime;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli, settings: &Settings) -> Result<(), CliError> {
    match &cli.command {
        Command::InterestRate(args) => interest_rate::run(args, settings).await,
        Command::CommodityHedging(args) => commodity_hedging::run(args, settings).await,
        Command::Portfolio(args) => portfolio::run(args, settings).await,
    }
}

/// Local wall-clock time, falling back to UTC when the offset is unknown.
fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

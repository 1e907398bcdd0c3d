//! CLI argument definitions for finrisk.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `interest-rate` | Bank rate-sensitivity dataset, regressions and warning e-mail |
//! | `interest-rate regress` | Regressions and alerting over a saved dataset, offline |
//! | `commodity-hedging` | Risk panel and Tobin's Q workbooks |
//! | `portfolio` | VaR/CVaR and maximum-Sharpe weights |
//!
//! Logging is controlled with `RUST_LOG` and written to stderr.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "finrisk",
    author,
    version,
    about = "Financial risk pipelines: bank rate sensitivity, commodity hedging, portfolio optimisation"
)]
pub struct Cli {
    /// Settings file. Defaults to ./finrisk.toml when present, else built-in defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the quarterly bank dataset, fit the models and send warnings.
    InterestRate(InterestRateArgs),
    /// Build the commodity-hedging regression workbooks.
    CommodityHedging(CommodityHedgingArgs),
    /// Report portfolio risk and the maximum-Sharpe allocation.
    Portfolio(PortfolioArgs),
}

impl Command {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::InterestRate(_) => "interest-rate",
            Self::CommodityHedging(_) => "commodity-hedging",
            Self::Portfolio(_) => "portfolio",
        }
    }
}

#[derive(Debug, Args)]
pub struct InterestRateArgs {
    /// Only process these bank tickers (comma separated).
    #[arg(long, value_delimiter = ',', global = true)]
    pub tickers: Vec<String>,

    /// Do not send the warning e-mail.
    #[arg(long, global = true, default_value_t = false)]
    pub no_email: bool,

    /// Dataset output path, overriding the settings file.
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub mode: Option<InterestRateMode>,
}

#[derive(Debug, Subcommand)]
pub enum InterestRateMode {
    /// Re-run regressions and alerting on a previously written dataset.
    Regress(RegressArgs),
}

#[derive(Debug, Args)]
pub struct RegressArgs {
    /// Workbook written by a previous `interest-rate` run.
    #[arg(long)]
    pub input: PathBuf,

    /// Sheet name; defaults to the configured dataset sheet.
    #[arg(long)]
    pub sheet: Option<String>,
}

#[derive(Debug, Args)]
pub struct CommodityHedgingArgs {
    /// Financial input workbook, overriding the settings file.
    #[arg(long)]
    pub input: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PortfolioArgs {
    /// Directory for the results workbook, overriding the settings file.
    #[arg(long)]
    pub results_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interest_rate_accepts_ticker_filter() {
        let cli = Cli::try_parse_from(["finrisk", "interest-rate", "--tickers", "BAC,JPM"])
            .expect("parse");
        let Command::InterestRate(args) = cli.command else {
            panic!("expected interest-rate");
        };
        assert_eq!(args.tickers, vec!["BAC", "JPM"]);
        assert!(args.mode.is_none());
    }

    #[test]
    fn regress_requires_input() {
        assert!(Cli::try_parse_from(["finrisk", "interest-rate", "regress"]).is_err());

        let cli = Cli::try_parse_from([
            "finrisk",
            "--config",
            "custom.toml",
            "interest-rate",
            "regress",
            "--input",
            "output.xlsx",
        ])
        .expect("parse");
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        let Command::InterestRate(InterestRateArgs {
            mode: Some(InterestRateMode::Regress(regress)),
            ..
        }) = cli.command
        else {
            panic!("expected regress");
        };
        assert_eq!(regress.input, PathBuf::from("output.xlsx"));
    }

    #[test]
    fn command_names() {
        let cli = Cli::try_parse_from(["finrisk", "portfolio"]).expect("parse");
        assert_eq!(cli.command.name(), "portfolio");
    }
}

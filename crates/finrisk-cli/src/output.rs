//! Human-readable reports on stdout. Diagnostics go through `tracing`.

use std::fmt::Display;

use finrisk_analytics::{AnalyticsResult, BankModels, Performance, RiskMetrics};

fn print_fit<T: Display>(title: &str, fit: &AnalyticsResult<T>) {
    println!("== {title} ==");
    match fit {
        Ok(fit) => println!("{fit}"),
        Err(error) => println!("not fitted: {error}\n"),
    }
}

pub fn print_bank_models(models: &BankModels) {
    println!("Observations: {}\n", models.dataset.len());
    print_fit("Full model", &models.full);
    print_fit("Interest rates only", &models.restricted);
    print_fit("Extreme interest rate above 75th percentile", &models.extreme_stress);
    print_fit("Period interest rate above 75th percentile", &models.period_stress);
    print_fit("Logit on any extreme return", &models.logit);
}

pub fn print_flagged(tickers: &[String], threshold: f64) {
    if tickers.is_empty() {
        println!("No ticker reaches probability {threshold:.2} in the current quarter.");
    } else {
        println!(
            "Probability at or above {threshold:.2}: {}",
            tickers.join(", ")
        );
    }
}

/// One side of the portfolio comparison.
pub struct PortfolioSummary<'a> {
    pub label: &'a str,
    pub tickers: &'a [String],
    pub weights: &'a [f64],
    pub performance: Performance,
    pub sharpe_ratio: f64,
    pub risk: RiskMetrics,
}

pub fn print_portfolio(summary: &PortfolioSummary<'_>) {
    println!("== {} ==", summary.label);
    for (ticker, weight) in summary.tickers.iter().zip(summary.weights) {
        println!("  {ticker:<8} {:>7.2}%", weight * 100.0);
    }
    println!(
        "  Annual return {:>8.2}%   Annual volatility {:>8.2}%   Sharpe {:.3}",
        summary.performance.annual_return * 100.0,
        summary.performance.annual_volatility * 100.0,
        summary.sharpe_ratio
    );
    println!(
        "  Monthly VaR 95% {:>7.2}%   CVaR 95% {:>7.2}%   VaR 99% {:>7.2}%   CVaR 99% {:>7.2}%\n",
        summary.risk.var_95 * 100.0,
        summary.risk.cvar_95 * 100.0,
        summary.risk.var_99 * 100.0,
        summary.risk.cvar_99 * 100.0
    );
}

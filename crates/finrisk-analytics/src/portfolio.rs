//! Mean-variance portfolio statistics, parametric VaR/CVaR and a
//! maximum-Sharpe optimiser constrained to long-only, fully invested weights.

use std::collections::BTreeSet;

use finrisk_core::{PriceSeries, Symbol};
use nalgebra::{DMatrix, DVector};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};
use time::Date;
use tracing::debug;

use crate::error::{AnalyticsError, AnalyticsResult};

pub const MONTHS_PER_YEAR: f64 = 12.0;

/// Simple monthly returns, one column per ticker, over the union of all
/// observation dates. A missing close carries the previous one forward;
/// leading gaps are filled with the column mean.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnsMatrix {
    pub tickers: Vec<Symbol>,
    pub dates: Vec<Date>,
    pub values: DMatrix<f64>,
}

impl ReturnsMatrix {
    pub fn from_prices(series: &[PriceSeries]) -> Self {
        let dates = series
            .iter()
            .flat_map(|series| series.dates())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();

        let mut values = DMatrix::from_element(dates.len(), series.len(), f64::NAN);
        for (col, prices) in series.iter().enumerate() {
            let mut previous = None;
            for (row, date) in dates.iter().enumerate() {
                let current = prices.close_on(*date).or(previous);
                if let (Some(current), Some(previous)) = (current, previous) {
                    values[(row, col)] = current / previous - 1.0;
                }
                previous = current;
            }

            let observed = values
                .column(col)
                .iter()
                .copied()
                .filter(|value| value.is_finite())
                .collect::<Vec<_>>();
            if !observed.is_empty() {
                let mean = observed.iter().sum::<f64>() / observed.len() as f64;
                for value in values.column_mut(col).iter_mut() {
                    if !value.is_finite() {
                        *value = mean;
                    }
                }
            }
        }

        Self {
            tickers: series.iter().map(|series| series.symbol.clone()).collect(),
            dates,
            values,
        }
    }
}

/// Annualised return and volatility of a weight vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Performance {
    pub annual_return: f64,
    pub annual_volatility: f64,
}

/// Mean vector and sample covariance of asset returns.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetStatistics {
    pub mean: DVector<f64>,
    pub covariance: DMatrix<f64>,
}

impl AssetStatistics {
    pub fn from_returns(returns: &ReturnsMatrix) -> AnalyticsResult<Self> {
        let n = returns.values.nrows();
        if n < 2 {
            return Err(AnalyticsError::InsufficientData {
                required: 2,
                actual: n,
            });
        }
        if let Some((col, _)) = returns
            .values
            .column_iter()
            .enumerate()
            .find(|(_, column)| column.iter().any(|value| !value.is_finite()))
        {
            return Err(AnalyticsError::InvalidParameter {
                reason: format!("no returns observed for {}", returns.tickers[col]),
            });
        }

        let mean = returns.values.row_mean().transpose();
        let mut centered = returns.values.clone();
        for mut row in centered.row_iter_mut() {
            row -= mean.transpose();
        }
        let covariance = centered.transpose() * &centered / (n - 1) as f64;

        Ok(Self { mean, covariance })
    }

    pub fn assets(&self) -> usize {
        self.mean.len()
    }

    fn weight_vector(&self, weights: &[f64]) -> AnalyticsResult<DVector<f64>> {
        if weights.len() != self.assets() {
            return Err(AnalyticsError::DimensionMismatch {
                expected: self.assets(),
                actual: weights.len(),
            });
        }
        Ok(DVector::from_column_slice(weights))
    }

    /// Monthly portfolio mean and standard deviation.
    pub fn moments(&self, weights: &[f64]) -> AnalyticsResult<(f64, f64)> {
        let w = self.weight_vector(weights)?;
        let variance = (w.transpose() * &self.covariance * &w)[(0, 0)];
        Ok((self.mean.dot(&w), variance.max(0.0).sqrt()))
    }

    pub fn performance(&self, weights: &[f64]) -> AnalyticsResult<Performance> {
        let (mean, std_dev) = self.moments(weights)?;
        Ok(Performance {
            annual_return: mean * MONTHS_PER_YEAR,
            annual_volatility: std_dev * MONTHS_PER_YEAR.sqrt(),
        })
    }

    pub fn sharpe_ratio(&self, weights: &[f64], risk_free_rate: f64) -> AnalyticsResult<f64> {
        let performance = self.performance(weights)?;
        Ok((performance.annual_return - risk_free_rate) / performance.annual_volatility)
    }
}

fn normal(mean: f64, std_dev: f64) -> AnalyticsResult<Normal> {
    Normal::new(mean, std_dev).map_err(|e| AnalyticsError::InvalidParameter {
        reason: e.to_string(),
    })
}

fn check_confidence(confidence: f64) -> AnalyticsResult<()> {
    if confidence > 0.0 && confidence < 1.0 {
        Ok(())
    } else {
        Err(AnalyticsError::InvalidParameter {
            reason: format!("confidence level {confidence} must lie in (0, 1)"),
        })
    }
}

/// Parametric VaR: the `1 - confidence` quantile of `N(mean, std_dev)`.
pub fn value_at_risk(mean: f64, std_dev: f64, confidence: f64) -> AnalyticsResult<f64> {
    check_confidence(confidence)?;
    Ok(normal(mean, std_dev)?.inverse_cdf(1.0 - confidence))
}

/// Parametric CVaR, `mean - std_dev * φ(Φ⁻¹(confidence)) / (1 - confidence)`.
pub fn conditional_value_at_risk(mean: f64, std_dev: f64, confidence: f64) -> AnalyticsResult<f64> {
    check_confidence(confidence)?;
    let standard = normal(0.0, 1.0)?;
    let z = standard.inverse_cdf(confidence);
    Ok(mean - std_dev * standard.pdf(z) / (1.0 - confidence))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskMetrics {
    pub var_95: f64,
    pub cvar_95: f64,
    pub var_99: f64,
    pub cvar_99: f64,
}

pub fn risk_metrics(statistics: &AssetStatistics, weights: &[f64]) -> AnalyticsResult<RiskMetrics> {
    let (mean, std_dev) = statistics.moments(weights)?;
    Ok(RiskMetrics {
        var_95: value_at_risk(mean, std_dev, 0.95)?,
        cvar_95: conditional_value_at_risk(mean, std_dev, 0.95)?,
        var_99: value_at_risk(mean, std_dev, 0.99)?,
        cvar_99: conditional_value_at_risk(mean, std_dev, 0.99)?,
    })
}

/// Configuration for the projected-gradient optimiser.
#[derive(Debug, Clone, Copy)]
pub struct OptimizationConfig {
    /// Weight movement below which the search stops.
    pub tolerance: f64,
    pub max_iterations: u32,
    /// Step for central-difference gradients.
    pub step_size: f64,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 1_000,
            step_size: 1e-7,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    pub weights: Vec<f64>,
    pub sharpe_ratio: f64,
    pub iterations: u32,
    pub converged: bool,
}

/// Euclidean projection onto `{w : w >= 0, Σw = 1}`.
pub fn project_to_simplex(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));

    let mut cumulative = 0.0;
    let mut theta = 0.0;
    for (j, value) in sorted.iter().enumerate() {
        cumulative += value;
        let candidate = (cumulative - 1.0) / (j + 1) as f64;
        if value - candidate > 0.0 {
            theta = candidate;
        }
    }

    values.iter().map(|value| (value - theta).max(0.0)).collect()
}

/// Maximises the Sharpe ratio over long-only, fully invested weights,
/// starting from equal weights.
pub fn max_sharpe(
    statistics: &AssetStatistics,
    risk_free_rate: f64,
    config: &OptimizationConfig,
) -> AnalyticsResult<OptimizationResult> {
    let n = statistics.assets();
    if n == 0 {
        return Err(AnalyticsError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }

    let objective = |weights: &[f64]| -> f64 {
        statistics
            .sharpe_ratio(weights, risk_free_rate)
            .map(|sharpe| -sharpe)
            .unwrap_or(f64::INFINITY)
    };

    let mut weights = vec![1.0 / n as f64; n];
    let mut value = objective(&weights);
    if !value.is_finite() {
        return Err(AnalyticsError::InvalidParameter {
            reason: String::from("portfolio volatility is zero at equal weights"),
        });
    }

    for iteration in 0..config.max_iterations {
        let gradient = (0..n)
            .map(|i| {
                let mut plus = weights.clone();
                let mut minus = weights.clone();
                plus[i] += config.step_size;
                minus[i] -= config.step_size;
                (objective(&plus) - objective(&minus)) / (2.0 * config.step_size)
            })
            .collect::<Vec<_>>();

        let mut step = 1.0;
        let accepted = loop {
            let candidate = project_to_simplex(
                &weights
                    .iter()
                    .zip(&gradient)
                    .map(|(w, g)| w - step * g)
                    .collect::<Vec<_>>(),
            );
            let candidate_value = objective(&candidate);
            if candidate_value < value {
                break Some((candidate, candidate_value));
            }
            step *= 0.5;
            if step < 1e-15 {
                break None;
            }
        };

        let Some((candidate, candidate_value)) = accepted else {
            debug!(iteration, "sharpe search cannot improve further");
            return Ok(OptimizationResult {
                weights,
                sharpe_ratio: -value,
                iterations: iteration,
                converged: true,
            });
        };

        let movement = candidate
            .iter()
            .zip(&weights)
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt();
        weights = candidate;
        value = candidate_value;

        if movement < config.tolerance {
            return Ok(OptimizationResult {
                weights,
                sharpe_ratio: -value,
                iterations: iteration + 1,
                converged: true,
            });
        }
    }

    Ok(OptimizationResult {
        weights,
        sharpe_ratio: -value,
        iterations: config.max_iterations,
        converged: false,
    })
}

use std::fmt::{self, Display, Formatter};

use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::warn;

use super::{spd_inverse, write_coefficients, Coefficient, Design};
use crate::error::{AnalyticsError, AnalyticsResult};

const MAX_ITERATIONS: usize = 35;
const TOLERANCE: f64 = 1e-8;
const PROBABILITY_FLOOR: f64 = 1e-15;

/// Binary logistic regression. The response must be 0/1.
#[derive(Debug, Clone, PartialEq)]
pub struct LogitFit {
    pub response: &'static str,
    pub coefficients: Vec<Coefficient>,
    pub log_likelihood: f64,
    pub null_log_likelihood: f64,
    /// McFadden's pseudo R-squared.
    pub pseudo_r_squared: f64,
    pub n_obs: usize,
    pub iterations: usize,
    pub converged: bool,
}

impl LogitFit {
    pub fn fit(design: &Design) -> AnalyticsResult<Self> {
        let k = design.n_params();
        design.require_observations(k + 1)?;

        if let Some(value) = design.y.iter().find(|value| **value != 0.0 && **value != 1.0) {
            return Err(AnalyticsError::InvalidParameter {
                reason: format!("logit response must be 0 or 1, found {value}"),
            });
        }

        let xt = design.x.transpose();
        let mut beta = DVector::zeros(k);
        let mut converged = false;
        let mut iterations = 0;

        while iterations < MAX_ITERATIONS {
            iterations += 1;
            let probabilities = probabilities(&design.x, &beta);
            let gradient = &xt * (&design.y - &probabilities);
            let hessian_inv = spd_inverse(weighted_cross_product(&design.x, &probabilities))?;
            let step = &hessian_inv * gradient;
            beta += &step;

            if step.amax() < TOLERANCE {
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(iterations, "logit did not converge");
        }

        let fitted = probabilities(&design.x, &beta);
        let covariance = spd_inverse(weighted_cross_product(&design.x, &fitted))?;
        let log_likelihood = log_likelihood(&design.y, &fitted);
        let null_log_likelihood = null_log_likelihood(&design.y);

        let normal = Normal::new(0.0, 1.0).map_err(|e| AnalyticsError::InvalidParameter {
            reason: e.to_string(),
        })?;
        let coefficients = design
            .names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let std_error = covariance[(i, i)].sqrt();
                let statistic = beta[i] / std_error;
                Coefficient {
                    name: *name,
                    estimate: beta[i],
                    std_error,
                    statistic,
                    p_value: 2.0 * (1.0 - normal.cdf(statistic.abs())),
                }
            })
            .collect();

        Ok(Self {
            response: design.response,
            coefficients,
            log_likelihood,
            null_log_likelihood,
            pseudo_r_squared: if null_log_likelihood != 0.0 {
                1.0 - log_likelihood / null_log_likelihood
            } else {
                f64::NAN
            },
            n_obs: design.n_obs(),
            iterations,
            converged,
        })
    }

    /// Predicted probability for each row of `design`, which must carry the
    /// same columns as the fitted one.
    pub fn predict(&self, design: &Design) -> AnalyticsResult<Vec<f64>> {
        if design.n_params() != self.coefficients.len() {
            return Err(AnalyticsError::DimensionMismatch {
                expected: self.coefficients.len(),
                actual: design.n_params(),
            });
        }
        let beta = DVector::from_iterator(
            self.coefficients.len(),
            self.coefficients.iter().map(|coefficient| coefficient.estimate),
        );
        Ok(probabilities(&design.x, &beta).iter().copied().collect())
    }

    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        Coefficient::named(&self.coefficients, name)
    }
}

fn sigmoid(value: f64) -> f64 {
    if value >= 0.0 {
        1.0 / (1.0 + (-value).exp())
    } else {
        let e = value.exp();
        e / (1.0 + e)
    }
}

fn probabilities(x: &DMatrix<f64>, beta: &DVector<f64>) -> DVector<f64> {
    (x * beta).map(sigmoid)
}

/// `Xᵀ W X` with `W = diag(p (1 - p))`.
fn weighted_cross_product(x: &DMatrix<f64>, probabilities: &DVector<f64>) -> DMatrix<f64> {
    let mut weighted = x.clone();
    for (mut row, p) in weighted.row_iter_mut().zip(probabilities.iter()) {
        row *= p * (1.0 - p);
    }
    x.transpose() * weighted
}

fn log_likelihood(y: &DVector<f64>, probabilities: &DVector<f64>) -> f64 {
    y.iter()
        .zip(probabilities.iter())
        .map(|(y, p)| {
            let p = p.clamp(PROBABILITY_FLOOR, 1.0 - PROBABILITY_FLOOR);
            y * p.ln() + (1.0 - y) * (1.0 - p).ln()
        })
        .sum()
}

fn null_log_likelihood(y: &DVector<f64>) -> f64 {
    let n = y.len() as f64;
    let mean = y.mean();
    let term = |p: f64| if p > 0.0 { p * p.ln() } else { 0.0 };
    n * (term(mean) + term(1.0 - mean))
}

impl Display for LogitFit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Logit Regression Results")?;
        writeln!(
            f,
            "Dep. Variable: {:<16} No. Observations: {}",
            self.response, self.n_obs
        )?;
        writeln!(
            f,
            "Pseudo R-squ.: {:<16.4} Log-Likelihood: {:.3}",
            self.pseudo_r_squared, self.log_likelihood
        )?;
        writeln!(
            f,
            "converged: {:<20} LL-Null: {:.3}",
            self.converged, self.null_log_likelihood
        )?;
        write_coefficients(f, &self.coefficients, "z")
    }
}

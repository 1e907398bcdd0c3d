//! Regression models over the bank dataset.
//!
//! | Type | Model |
//! |------|-------|
//! | [`OlsFit`] | Ordinary least squares with t-statistics and F-test |
//! | [`LogitFit`] | Binary logistic regression fitted by Newton-Raphson (IRLS) |
//!
//! Both consume a [`Design`]: the response, an intercept and the chosen
//! predictor columns of a [`RegressionDataset`]. [`BankModels`] fits the
//! whole set used by the interest-rate report.

mod logit;
mod ols;
mod suite;

use std::fmt::{self, Formatter};

use nalgebra::{DMatrix, DVector};

use crate::dataset::{RegressionDataset, Variable};
use crate::error::{AnalyticsError, AnalyticsResult};

pub use logit::LogitFit;
pub use ols::OlsFit;
pub use suite::{BankModels, FULL_PREDICTORS, RESTRICTED_PREDICTORS, STRESS_QUANTILE};

pub const INTERCEPT: &str = "Intercept";

/// Response vector and design matrix with a leading intercept column.
#[derive(Debug, Clone, PartialEq)]
pub struct Design {
    response: &'static str,
    names: Vec<&'static str>,
    x: DMatrix<f64>,
    y: DVector<f64>,
}

impl Design {
    pub fn from_dataset(
        dataset: &RegressionDataset,
        response: Variable,
        predictors: &[Variable],
    ) -> Self {
        let rows = dataset.rows();
        let cols = predictors.len() + 1;
        let x = DMatrix::from_fn(rows.len(), cols, |i, j| match j {
            0 => 1.0,
            _ => predictors[j - 1].value(&rows[i]),
        });
        let y = DVector::from_iterator(rows.len(), rows.iter().map(|row| response.value(row)));

        let mut names = Vec::with_capacity(cols);
        names.push(INTERCEPT);
        names.extend(predictors.iter().map(|variable| variable.name()));

        Self {
            response: response.name(),
            names,
            x,
            y,
        }
    }

    pub fn n_obs(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_params(&self) -> usize {
        self.x.ncols()
    }

    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    fn require_observations(&self, required: usize) -> AnalyticsResult<()> {
        if self.n_obs() < required {
            return Err(AnalyticsError::InsufficientData {
                required,
                actual: self.n_obs(),
            });
        }
        Ok(())
    }
}

/// One fitted parameter with its inference statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficient {
    pub name: &'static str,
    pub estimate: f64,
    pub std_error: f64,
    /// t statistic for OLS, z statistic for logit.
    pub statistic: f64,
    pub p_value: f64,
}

impl Coefficient {
    pub fn named<'a>(coefficients: &'a [Coefficient], name: &str) -> Option<&'a Coefficient> {
        coefficients.iter().find(|coefficient| coefficient.name == name)
    }
}

/// Linear-interpolated sample quantile of the finite values, the same
/// convention as a spreadsheet `PERCENTILE.INC`.
pub fn quantile(values: &[f64], q: f64) -> AnalyticsResult<f64> {
    if !(0.0..=1.0).contains(&q) {
        return Err(AnalyticsError::InvalidQuantile { q });
    }

    let mut sorted = values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .collect::<Vec<_>>();
    if sorted.is_empty() {
        return Err(AnalyticsError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    sorted.sort_by(f64::total_cmp);

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    Ok(sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64))
}

/// Relative pivot size below which a cross-product matrix is treated as singular.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Symmetric inverse of a positive-definite cross-product matrix.
fn spd_inverse(matrix: DMatrix<f64>) -> AnalyticsResult<DMatrix<f64>> {
    let scale = matrix.diagonal().max().max(f64::MIN_POSITIVE);
    let cholesky = matrix.cholesky().ok_or(AnalyticsError::SingularMatrix)?;
    if cholesky
        .l_dirty()
        .diagonal()
        .iter()
        .any(|pivot| pivot * pivot <= scale * PIVOT_TOLERANCE)
    {
        return Err(AnalyticsError::SingularMatrix);
    }
    Ok(cholesky.inverse())
}

fn write_coefficients(
    f: &mut Formatter<'_>,
    coefficients: &[Coefficient],
    statistic: &str,
) -> fmt::Result {
    writeln!(
        f,
        "{:<24}{:>12}{:>12}{:>10}{:>10}",
        "", "coef", "std err", statistic, format!("P>|{statistic}|")
    )?;
    for coefficient in coefficients {
        writeln!(
            f,
            "{:<24}{:>12.4}{:>12.4}{:>10.3}{:>10.3}",
            coefficient.name,
            coefficient.estimate,
            coefficient.std_error,
            coefficient.statistic,
            coefficient.p_value
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quantile_interpolates_linearly() {
        let values = [4.0, 1.0, 3.0, 2.0, f64::NAN];
        assert_relative_eq!(quantile(&values, 0.75).expect("quantile"), 3.25, epsilon = 1e-12);
        assert_relative_eq!(quantile(&values, 0.0).expect("quantile"), 1.0, epsilon = 1e-12);
        assert_relative_eq!(quantile(&values, 1.0).expect("quantile"), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn quantile_rejects_empty_and_out_of_range() {
        assert!(matches!(
            quantile(&[], 0.5),
            Err(AnalyticsError::InsufficientData { .. })
        ));
        assert!(matches!(
            quantile(&[1.0], 1.5),
            Err(AnalyticsError::InvalidQuantile { .. })
        ));
    }
}

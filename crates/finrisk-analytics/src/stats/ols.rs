use std::fmt::{self, Display, Formatter};

use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

use super::{spd_inverse, write_coefficients, Coefficient, Design};
use crate::error::{AnalyticsError, AnalyticsResult};

/// Ordinary least squares fit with classical (non-robust) standard errors.
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    pub response: &'static str,
    pub coefficients: Vec<Coefficient>,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_statistic: f64,
    pub f_p_value: f64,
    pub n_obs: usize,
    pub df_resid: usize,
}

impl OlsFit {
    pub fn fit(design: &Design) -> AnalyticsResult<Self> {
        let k = design.n_params();
        design.require_observations(k + 1)?;
        let n = design.n_obs();
        let df_resid = n - k;

        let xt = design.x.transpose();
        let xtx_inv = spd_inverse(&xt * &design.x)?;
        let beta = &xtx_inv * (&xt * &design.y);

        let residuals = &design.y - &design.x * &beta;
        let ssr = residuals.dot(&residuals);
        let mean = design.y.mean();
        let tss = design.y.iter().map(|value| (value - mean).powi(2)).sum::<f64>();
        let sigma2 = ssr / df_resid as f64;

        let student = StudentsT::new(0.0, 1.0, df_resid as f64).map_err(|e| {
            AnalyticsError::InvalidParameter {
                reason: e.to_string(),
            }
        })?;

        let coefficients = design
            .names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let std_error = (sigma2 * xtx_inv[(i, i)]).sqrt();
                let statistic = beta[i] / std_error;
                Coefficient {
                    name: *name,
                    estimate: beta[i],
                    std_error,
                    statistic,
                    p_value: 2.0 * (1.0 - student.cdf(statistic.abs())),
                }
            })
            .collect();

        let r_squared = if tss > 0.0 { 1.0 - ssr / tss } else { f64::NAN };
        let adj_r_squared = 1.0 - (1.0 - r_squared) * (n - 1) as f64 / df_resid as f64;

        let df_model = k - 1;
        let (f_statistic, f_p_value) = if df_model > 0 && ssr > 0.0 {
            let f_statistic = ((tss - ssr) / df_model as f64) / sigma2;
            let p = FisherSnedecor::new(df_model as f64, df_resid as f64)
                .map(|dist| 1.0 - dist.cdf(f_statistic))
                .unwrap_or(f64::NAN);
            (f_statistic, p)
        } else {
            (f64::NAN, f64::NAN)
        };

        Ok(Self {
            response: design.response,
            coefficients,
            r_squared,
            adj_r_squared,
            f_statistic,
            f_p_value,
            n_obs: n,
            df_resid,
        })
    }

    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        Coefficient::named(&self.coefficients, name)
    }
}

impl Display for OlsFit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "OLS Regression Results")?;
        writeln!(
            f,
            "Dep. Variable: {:<16} No. Observations: {}",
            self.response, self.n_obs
        )?;
        writeln!(
            f,
            "R-squared: {:<20.3} Adj. R-squared: {:.3}",
            self.r_squared, self.adj_r_squared
        )?;
        writeln!(
            f,
            "F-statistic: {:<18.3} Prob (F-statistic): {:.3e}",
            self.f_statistic, self.f_p_value
        )?;
        write_coefficients(f, &self.coefficients, "t")
    }
}

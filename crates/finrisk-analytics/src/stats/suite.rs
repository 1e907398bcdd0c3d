use crate::dataset::{RegressionDataset, Variable};
use crate::error::AnalyticsResult;

use super::{quantile, Design, LogitFit, OlsFit};

pub const FULL_PREDICTORS: [Variable; 4] = [
    Variable::ExtremeInterestRate,
    Variable::PeriodInterestRate,
    Variable::Margin,
    Variable::Afs,
];

pub const RESTRICTED_PREDICTORS: [Variable; 2] =
    [Variable::ExtremeInterestRate, Variable::PeriodInterestRate];

/// Upper quantile used to select the stressed subsets.
pub const STRESS_QUANTILE: f64 = 0.75;

/// Every model fitted over the bank dataset. Each fit fails independently.
#[derive(Debug, Clone)]
pub struct BankModels {
    /// Complete rows the models were fitted on.
    pub dataset: RegressionDataset,
    pub full: AnalyticsResult<OlsFit>,
    pub restricted: AnalyticsResult<OlsFit>,
    /// Full model on rows with an extreme rate range at or above its 75th percentile.
    pub extreme_stress: AnalyticsResult<OlsFit>,
    /// Full model on rows with a period rate change at or above its 75th percentile.
    pub period_stress: AnalyticsResult<OlsFit>,
    /// Logit on the binarised return count.
    pub logit: AnalyticsResult<LogitFit>,
    /// Logit probability per row of `dataset`.
    pub probabilities: AnalyticsResult<Vec<f64>>,
}

impl BankModels {
    pub fn fit(dataset: &RegressionDataset) -> Self {
        let dataset = dataset.complete();

        let full = OlsFit::fit(&Design::from_dataset(&dataset, Variable::Return, &FULL_PREDICTORS));
        let restricted = OlsFit::fit(&Design::from_dataset(
            &dataset,
            Variable::Return,
            &RESTRICTED_PREDICTORS,
        ));
        let extreme_stress = stressed_fit(&dataset, Variable::ExtremeInterestRate);
        let period_stress = stressed_fit(&dataset, Variable::PeriodInterestRate);

        let binary = Design::from_dataset(&dataset.binarized(), Variable::Return, &FULL_PREDICTORS);
        let logit = LogitFit::fit(&binary);
        let probabilities = logit
            .as_ref()
            .map_err(Clone::clone)
            .and_then(|fit| fit.predict(&binary));

        Self {
            dataset,
            full,
            restricted,
            extreme_stress,
            period_stress,
            logit,
            probabilities,
        }
    }
}

fn stressed_fit(dataset: &RegressionDataset, variable: Variable) -> AnalyticsResult<OlsFit> {
    let threshold = quantile(&dataset.column(variable), STRESS_QUANTILE)?;
    let subset = dataset.filter(|row| variable.value(row) >= threshold);
    OlsFit::fit(&Design::from_dataset(&subset, Variable::Return, &FULL_PREDICTORS))
}

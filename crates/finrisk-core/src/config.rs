//! Settings loaded once per run from `finrisk.toml`.
//!
//! Every field has a default matching the production pipelines, so the file
//! is optional. The SMTP password is never read from the file; it comes from
//! `FINRISK_SMTP_PASSWORD`.
//!
//! ```toml
//! [sec]
//! contact_email = "risk@example.com"
//!
//! [interest_rate]
//! yield_symbol = "^TYX"
//! range = "10y"
//! interval = "1wk"
//!
//! [[interest_rate.banks]]
//! ticker = "BAC"
//! cik = "CIK0000070858"
//! profit_tags = ["NetIncomeLoss"]
//! other_income_tags = ["OtherComprehensiveIncomeAvailableforsaleSecuritiesAdjustmentNetOfTaxPortionAttributableToParent"]
//! afs_tags = ["AvailableForSaleSecuritiesDebtSecurities"]
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::Date;
use tracing::{debug, info};

use crate::{CoreError, Interval, MetricKind, Symbol, TrailingRange, ValidationError};

pub const DEFAULT_SETTINGS_FILE: &str = "finrisk.toml";
pub const SMTP_PASSWORD_ENV: &str = "FINRISK_SMTP_PASSWORD";

/// Root settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sec: SecSettings,
    pub interest_rate: InterestRateSettings,
    pub commodity_hedging: CommodityHedgingSettings,
    pub portfolio: PortfolioSettings,
    pub smtp: SmtpSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sec: SecSettings::default(),
            interest_rate: InterestRateSettings::default(),
            commodity_hedging: CommodityHedgingSettings::default(),
            portfolio: PortfolioSettings::default(),
            smtp: SmtpSettings::default(),
        }
    }
}

impl Settings {
    /// Loads settings from `path`, or from `finrisk.toml` in the working
    /// directory when present, or falls back to defaults. The result is
    /// validated before it is returned.
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        let settings = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_SETTINGS_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_SETTINGS_FILE))?
            }
            None => {
                debug!("no settings file found, using defaults");
                Self::default()
            }
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CoreError::SettingsIo {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_toml_str(&raw).map_err(|source| CoreError::SettingsParse {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.interest_rate.validate()?;
        self.portfolio.validate()?;
        Ok(())
    }
}

/// SEC EDGAR access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecSettings {
    pub base_url: String,
    /// Contact address embedded in the User-Agent, as SEC fair-access rules require.
    pub contact_email: String,
}

impl Default for SecSettings {
    fn default() -> Self {
        Self {
            base_url: String::from("https://data.sec.gov"),
            contact_email: String::from("risk-desk@example.com"),
        }
    }
}

impl SecSettings {
    pub fn user_agent(&self) -> String {
        format!("BS/1.0 ({})", self.contact_email)
    }
}

/// Filing tags merged for one bank, per metric kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankProfile {
    pub ticker: Symbol,
    pub cik: String,
    pub profit_tags: Vec<String>,
    #[serde(default)]
    pub other_income_tags: Vec<String>,
    #[serde(default)]
    pub afs_tags: Vec<String>,
}

impl BankProfile {
    pub fn tags(&self, kind: MetricKind) -> &[String] {
        match kind {
            MetricKind::Profit => &self.profit_tags,
            MetricKind::OtherIncome => &self.other_income_tags,
            MetricKind::AvailableForSale => &self.afs_tags,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let digits = self.cik.strip_prefix("CIK").unwrap_or("");
        if digits.len() != 10 || !digits.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(ValidationError::InvalidCik {
                value: self.cik.clone(),
            });
        }
        if self.profit_tags.is_empty() {
            return Err(ValidationError::MissingProfitTags {
                ticker: self.ticker.to_string(),
            });
        }
        Ok(())
    }
}

/// Bank interest-rate sensitivity pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterestRateSettings {
    pub yield_symbol: Symbol,
    pub range: TrailingRange,
    pub interval: Interval,
    pub output: PathBuf,
    pub sheet: String,
    /// Predicted probability at or above which a ticker is flagged.
    pub alert_threshold: f64,
    /// Absolute log return at or above which a period counts as extreme.
    pub extreme_return_threshold: f64,
    pub banks: Vec<BankProfile>,
}

impl Default for InterestRateSettings {
    fn default() -> Self {
        Self {
            yield_symbol: Symbol::from_static("^TYX"),
            range: TrailingRange::Years(10),
            interval: Interval::Weekly,
            output: PathBuf::from("output.xlsx"),
            sheet: String::from("Banks"),
            alert_threshold: 0.30,
            extreme_return_threshold: 0.10,
            banks: default_banks(),
        }
    }
}

impl InterestRateSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for bank in &self.banks {
            bank.validate()?;
            if !seen.insert(bank.ticker.clone()) {
                return Err(ValidationError::DuplicateTicker {
                    ticker: bank.ticker.to_string(),
                });
            }
        }
        if !self.alert_threshold.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "alert_threshold",
            });
        }
        if !self.extreme_return_threshold.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "extreme_return_threshold",
            });
        }
        Ok(())
    }

    /// Resolves a ticker filter against the tag table, keeping table order.
    /// An empty filter selects every bank.
    pub fn select_banks(&self, filter: &[String]) -> Result<Vec<&BankProfile>, ValidationError> {
        if filter.is_empty() {
            return Ok(self.banks.iter().collect());
        }

        let wanted = filter
            .iter()
            .map(|raw| Symbol::parse(raw))
            .collect::<Result<HashSet<_>, _>>()?;

        if let Some(unknown) = wanted
            .iter()
            .find(|symbol| !self.banks.iter().any(|bank| &bank.ticker == *symbol))
        {
            return Err(ValidationError::UnknownTicker {
                ticker: unknown.to_string(),
            });
        }

        Ok(self
            .banks
            .iter()
            .filter(|bank| wanted.contains(&bank.ticker))
            .collect())
    }
}

/// Commodity hedging regression inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommodityHedgingSettings {
    pub input: PathBuf,
    pub market_output: PathBuf,
    pub tobin_output: PathBuf,
    #[serde(with = "iso_date")]
    pub start: Date,
    #[serde(with = "iso_date")]
    pub end: Date,
    pub market_index: Symbol,
    pub oil_index: Symbol,
    /// Oil observations dropped before computing returns.
    #[serde(with = "iso_date::list")]
    pub excluded_oil_dates: Vec<Date>,
    pub rolling_window: usize,
    pub min_month_observations: usize,
}

impl Default for CommodityHedgingSettings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/input.xlsx"),
            market_output: PathBuf::from("regression/output_market.xlsx"),
            tobin_output: PathBuf::from("regression/output_tobin.xlsx"),
            start: time::macros::date!(2012 - 01 - 01),
            end: time::macros::date!(2023 - 12 - 31),
            market_index: Symbol::from_static("^GSPC"),
            oil_index: Symbol::from_static("CL=F"),
            excluded_oil_dates: vec![time::macros::date!(2020 - 04 - 20)],
            rolling_window: 100,
            min_month_observations: 15,
        }
    }
}

/// Modern portfolio theory report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioSettings {
    #[serde(with = "iso_date")]
    pub start: Date,
    #[serde(with = "iso_date")]
    pub end: Date,
    pub risk_free_rate: f64,
    pub tickers: Vec<Symbol>,
    pub weights: Vec<f64>,
    pub results_dir: PathBuf,
}

impl Default for PortfolioSettings {
    fn default() -> Self {
        Self {
            start: time::macros::date!(2001 - 01 - 01),
            end: time::macros::date!(2025 - 12 - 31),
            risk_free_rate: 0.0375,
            tickers: ["MMM", "BP.L", "C", "T", "DAL", "PSN.L", "CNR.TO", "GSK.L"]
                .into_iter()
                .map(Symbol::from_static)
                .collect(),
            weights: vec![0.1424, 0.1468, 0.2213, 0.0308, 0.0525, 0.1463, 0.1360, 0.1240],
            results_dir: PathBuf::from("results"),
        }
    }
}

impl PortfolioSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tickers.len() != self.weights.len() {
            return Err(ValidationError::WeightCountMismatch {
                tickers: self.tickers.len(),
                weights: self.weights.len(),
            });
        }
        if self.weights.iter().any(|weight| !weight.is_finite()) {
            return Err(ValidationError::NonFiniteValue { field: "weights" });
        }
        if !self.risk_free_rate.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "risk_free_rate",
            });
        }
        Ok(())
    }
}

/// Outbound warning mail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub sender: String,
    pub receiver: String,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            server: String::from("smtp.gmail.com"),
            port: 587,
            sender: String::new(),
            receiver: String::new(),
        }
    }
}

impl SmtpSettings {
    pub fn password_from_env() -> Option<String> {
        std::env::var(SMTP_PASSWORD_ENV).ok().filter(|value| !value.is_empty())
    }
}

fn bank(ticker: &'static str, cik: &str, profit: &[&str], other_income: &[&str], afs: &[&str]) -> BankProfile {
    let owned = |tags: &[&str]| tags.iter().map(|tag| (*tag).to_owned()).collect::<Vec<_>>();
    BankProfile {
        ticker: Symbol::from_static(ticker),
        cik: cik.to_owned(),
        profit_tags: owned(profit),
        other_income_tags: owned(other_income),
        afs_tags: owned(afs),
    }
}

/// Tag table for the default bank universe.
pub fn default_banks() -> Vec<BankProfile> {
    const OCI_PARENT: &str =
        "OtherComprehensiveIncomeAvailableforsaleSecuritiesAdjustmentNetOfTaxPortionAttributableToParent";
    const OCI_NET: &str = "OtherComprehensiveIncomeLossAvailableForSaleSecuritiesAdjustmentNetOfTax";
    const OCI_HOLDING: &str =
        "OtherComprehensiveIncomeUnrealizedHoldingGainLossOnSecuritiesArisingDuringPeriodNetOfTax";
    const NET_INCOME: &str = "NetIncomeLoss";
    const PROFIT_LOSS: &str = "ProfitLoss";
    const CONTINUING: &str =
        "IncomeLossFromContinuingOperationsIncludingPortionAttributableToNoncontrollingInterest";
    const AFS_EXCL_INTEREST: &str = "DebtSecuritiesAvailableForSaleExcludingAccruedInterest";
    const AFS_DEBT: &str = "AvailableForSaleSecuritiesDebtSecurities";
    const AFS: &str = "AvailableForSaleSecurities";
    const MARKETABLE: &str = "MarketableSecuritiesUnrealizedGainLoss";

    vec![
        bank("BAC", "CIK0000070858", &[NET_INCOME], &[OCI_PARENT], &[AFS_EXCL_INTEREST, AFS_DEBT]),
        bank("JPM", "CIK0000019617", &[NET_INCOME], &[OCI_PARENT], &[AFS_EXCL_INTEREST, AFS_DEBT]),
        bank("C", "CIK0000831001", &[PROFIT_LOSS], &[OCI_PARENT], &[AFS_EXCL_INTEREST, AFS_DEBT]),
        bank("WFC", "CIK0000072971", &[CONTINUING], &[OCI_NET], &[AFS_EXCL_INTEREST, AFS_DEBT]),
        bank("TFSL", "CIK0001381668", &[NET_INCOME], &[OCI_NET], &[AFS_DEBT, AFS]),
        bank("BK", "CIK0001390777", &[PROFIT_LOSS], &[OCI_NET], &[AFS_DEBT]),
        bank("HBAN", "CIK0000049196", &[NET_INCOME], &[OCI_PARENT, OCI_NET], &[AFS_EXCL_INTEREST, MARKETABLE]),
        bank("TFC", "CIK0000092230", &[PROFIT_LOSS], &[OCI_HOLDING], &[AFS_DEBT]),
    ]
}

/// `YYYY-MM-DD` strings in settings files.
mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    use crate::{format_iso_date, parse_iso_date};

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_iso_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_iso_date(&raw).map_err(serde::de::Error::custom)
    }

    pub mod list {
        use super::*;
        use serde::ser::SerializeSeq;

        pub fn serialize<S: Serializer>(dates: &[Date], serializer: S) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(dates.len()))?;
            for date in dates {
                seq.serialize_element(&format_iso_date(*date))?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Date>, D::Error> {
            Vec::<String>::deserialize(deserializer)?
                .iter()
                .map(|raw| parse_iso_date(raw).map_err(serde::de::Error::custom))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_valid() {
        let settings = Settings::default();
        settings.validate().expect("defaults must validate");
        assert_eq!(settings.interest_rate.banks.len(), 8);
    }

    #[test]
    fn built_in_symbols_are_normalized() {
        let settings = Settings::default();
        let symbols = [
            &settings.interest_rate.yield_symbol,
            &settings.commodity_hedging.market_index,
            &settings.commodity_hedging.oil_index,
        ]
        .into_iter()
        .chain(&settings.portfolio.tickers)
        .chain(settings.interest_rate.banks.iter().map(|bank| &bank.ticker));

        for symbol in symbols {
            assert_eq!(Symbol::parse(symbol.as_str()).as_ref(), Ok(symbol));
        }
    }

    #[test]
    fn hban_merges_two_other_income_tags() {
        let banks = default_banks();
        let hban = banks
            .iter()
            .find(|bank| bank.ticker.as_str() == "HBAN")
            .expect("HBAN configured");
        assert_eq!(hban.tags(MetricKind::OtherIncome).len(), 2);
        assert_eq!(hban.tags(MetricKind::Profit), ["NetIncomeLoss"]);
    }

    #[test]
    fn rejects_malformed_cik() {
        let mut profile = default_banks().remove(0);
        profile.cik = String::from("70858");
        assert!(matches!(profile.validate(), Err(ValidationError::InvalidCik { .. })));
    }
}

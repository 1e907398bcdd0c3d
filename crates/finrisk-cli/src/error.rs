use finrisk_analytics::AnalyticsError;
use finrisk_core::{CoreError, SourceError, ValidationError};
use finrisk_report::ReportError;
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] CoreError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("no price data for {symbol}")]
    NoData { symbol: String },
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Config(_) => 2,
            Self::Source(_) => 3,
            Self::NoData { .. } => 3,
            Self::Analytics(_) => 4,
            Self::Report(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_category() {
        let validation = CliError::from(ValidationError::EmptySymbol);
        assert_eq!(validation.exit_code(), 2);

        let source = CliError::from(SourceError::unavailable("down"));
        assert_eq!(source.exit_code(), 3);

        let analytics = CliError::from(AnalyticsError::SingularMatrix);
        assert_eq!(analytics.exit_code(), 4);

        let report = CliError::from(ReportError::MissingColumn {
            sheet: "Banks".to_owned(),
            column: "AFS".to_owned(),
        });
        assert_eq!(report.exit_code(), 10);
    }
}

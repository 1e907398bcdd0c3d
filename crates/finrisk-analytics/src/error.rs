use thiserror::Error;

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Errors raised by the statistical and optimisation routines.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("design matrix is singular; predictors are collinear")]
    SingularMatrix,

    #[error("unknown dataset column '{name}'")]
    UnknownColumn { name: String },

    #[error("quantile {q} outside [0, 1]")]
    InvalidQuantile { q: f64 },

    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },
}

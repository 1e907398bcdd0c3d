use thiserror::Error;

/// Validation and contract errors exposed by `finrisk-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter or '^': '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid interval '{value}', expected one of 1d, 1wk, 1mo")]
    InvalidInterval { value: String },
    #[error("invalid range '{value}', expected a count followed by d, mo or y (e.g. 10y)")]
    InvalidRange { value: String },

    #[error("date must be formatted YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("date range is empty: start {start} is not before end {end}")]
    EmptyDateRange { start: String, end: String },

    #[error("CIK must be 'CIK' followed by 10 digits: '{value}'")]
    InvalidCik { value: String },
    #[error("bank '{ticker}' must declare at least one profit tag")]
    MissingProfitTags { ticker: String },
    #[error("ticker '{ticker}' is declared more than once")]
    DuplicateTicker { ticker: String },
    #[error("ticker '{ticker}' is not present in the bank tag table")]
    UnknownTicker { ticker: String },

    #[error("portfolio has {tickers} tickers but {weights} weights")]
    WeightCountMismatch { tickers: usize, weights: usize },
    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to read settings file '{path}': {source}")]
    SettingsIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file '{path}': {source}")]
    SettingsParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

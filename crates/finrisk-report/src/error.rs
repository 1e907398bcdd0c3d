use std::path::PathBuf;

use thiserror::Error;

/// Spreadsheet read/write failures.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write workbook '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    #[error("failed to read workbook '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },

    #[error("workbook '{path}' has no worksheets")]
    NoWorksheet { path: PathBuf },

    #[error("sheet '{sheet}' is missing column '{column}'")]
    MissingColumn { sheet: String, column: String },

    #[error("row width {actual} does not match {expected} headers")]
    RowWidth { expected: usize, actual: usize },
}

/// Mail composition and delivery failures. Never escapes
/// [`Notifier::send_warning`](crate::Notifier::send_warning).
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("SMTP password is not set; export {var}")]
    MissingPassword { var: &'static str },

    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("mail transport rejected message: {0}")]
    Rejected(String),
}

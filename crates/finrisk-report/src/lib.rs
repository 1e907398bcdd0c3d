//! # Finrisk Report
//!
//! Everything the pipelines hand to the outside world: spreadsheets and
//! warning e-mails.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`table`] | Sheet model: headers plus rows of [`Cell`]s |
//! | [`xlsx`] | Workbook write (`rust_xlsxwriter`) and read (`calamine`) |
//! | [`sheets`] | Layouts of the bank dataset, risk panel, Tobin and portfolio workbooks |
//! | [`notify`] | [`Notifier`] over a pluggable [`MailTransport`], SMTP via `lettre` |
//!
//! ```rust,no_run
//! use std::path::Path;
//! use finrisk_analytics::RegressionDataset;
//! use finrisk_report::{read_dataset, write_dataset};
//!
//! let dataset = RegressionDataset::default();
//! write_dataset(Path::new("output.xlsx"), "Banks", &dataset)?;
//! let reread = read_dataset(Path::new("output.xlsx"), "Banks")?;
//! assert_eq!(reread.len(), dataset.len());
//! # Ok::<(), finrisk_report::ReportError>(())
//! ```

pub mod error;
pub mod notify;
pub mod sheets;
pub mod table;
pub mod xlsx;

pub use error::{NotifyError, ReportError};
pub use notify::{
    Delivery, LogTransport, MailFuture, MailMessage, MailTransport, Notifier, SmtpMailer,
    WARNING_SUBJECT,
};
pub use sheets::{
    dataset_table, portfolio_results_path, read_dataset, read_financials, risk_panel_table,
    tobin_table, weights_table, write_dataset, WeightRow, DATA_SHEET, FINANCIAL_COLUMNS,
    RISK_COLUMNS, TOBIN_COLUMNS, WEIGHT_COLUMNS,
};
pub use table::{Cell, Table};
pub use xlsx::{read_table, write_table};

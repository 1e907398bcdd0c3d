//! In-memory sheet model shared by the xlsx reader and writer.

use std::collections::HashMap;

use finrisk_core::parse_iso_date;
use time::{Date, Duration};

use crate::error::ReportError;

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Blank,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Non-finite numbers become blanks; Excel has no NaN.
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            Self::Number(value)
        } else {
            Self::Blank
        }
    }

    pub fn optional(value: Option<f64>) -> Self {
        value.map_or(Self::Blank, Self::number)
    }

    pub fn date(value: Date) -> Self {
        Self::Text(finrisk_core::format_iso_date(value))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(raw) => raw.trim().parse::<f64>().ok(),
            Self::Blank => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(raw) if !raw.trim().is_empty() => Some(raw.trim().to_owned()),
            Self::Number(value) => Some(value.to_string()),
            _ => None,
        }
    }

    /// Accepts ISO text or an Excel serial day number.
    pub fn as_date(&self) -> Option<Date> {
        match self {
            Self::Text(raw) => parse_iso_date(raw.get(..10).unwrap_or(raw)).ok(),
            Self::Number(serial) => excel_serial_date(*serial),
            Self::Blank => None,
        }
    }
}

/// Excel's 1900 date system, counting from 1899-12-30.
pub(crate) fn excel_serial_date(serial: f64) -> Option<Date> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = Date::from_calendar_date(1899, time::Month::December, 30).ok()?;
    epoch.checked_add(Duration::days(serial.floor() as i64))
}

/// A named sheet: header row plus data rows of equal width.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub sheet: String,
    pub headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<S: AsRef<str>>(sheet: impl Into<String>, headers: &[S]) -> Self {
        Self {
            sheet: sheet.into(),
            headers: headers.iter().map(|header| header.as_ref().to_owned()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), ReportError> {
        if row.len() != self.headers.len() {
            return Err(ReportError::RowWidth {
                expected: self.headers.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Appends a row read from a file, padding or truncating to the header width.
    pub(crate) fn push_padded(&mut self, mut row: Vec<Cell>) {
        row.resize(self.headers.len(), Cell::Blank);
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column positions for `names`, failing on the first header not present.
    pub fn columns(&self, names: &[&str]) -> Result<Vec<usize>, ReportError> {
        let positions = self
            .headers
            .iter()
            .enumerate()
            .map(|(index, header)| (header.trim(), index))
            .collect::<HashMap<_, _>>();
        names
            .iter()
            .map(|name| {
                positions
                    .get(name)
                    .copied()
                    .ok_or_else(|| ReportError::MissingColumn {
                        sheet: self.sheet.clone(),
                        column: (*name).to_owned(),
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn non_finite_numbers_are_blank() {
        assert_eq!(Cell::number(f64::NAN), Cell::Blank);
        assert_eq!(Cell::optional(None), Cell::Blank);
        assert_eq!(Cell::optional(Some(1.5)), Cell::Number(1.5));
    }

    #[test]
    fn dates_parse_from_text_and_serials() {
        assert_eq!(Cell::text("2024-03-31").as_date(), Some(date!(2024 - 03 - 31)));
        assert_eq!(
            Cell::text("2024-03-31 00:00:00").as_date(),
            Some(date!(2024 - 03 - 31))
        );
        assert_eq!(Cell::Number(45382.0).as_date(), Some(date!(2024 - 03 - 31)));
        assert_eq!(Cell::Blank.as_date(), None);
    }

    #[test]
    fn push_row_checks_width() {
        let mut table = Table::new("Data", &["A", "B"]);
        assert!(table.push_row(vec![Cell::Blank]).is_err());
        assert!(table.push_row(vec![Cell::Blank, Cell::number(1.0)]).is_ok());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn missing_column_is_named() {
        let table = Table::new("Banks", &["Ticker", "Year"]);
        assert_eq!(table.columns(&["Year"]).expect("present"), vec![1]);
        let error = table.columns(&["AFS"]).expect_err("absent");
        assert!(error.to_string().contains("AFS"));
    }
}

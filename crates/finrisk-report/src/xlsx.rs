//! Workbook I/O: `rust_xlsxwriter` writes, `calamine` reads.

use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook};
use tracing::debug;

use crate::error::ReportError;
use crate::table::{Cell, Table};

/// Writes `table` as the only sheet of a new workbook at `path`, creating
/// parent directories. Blank cells are left empty.
pub fn write_table(path: &Path, table: &Table) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ReportError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let write_error = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&table.sheet).map_err(write_error)?;

    for (col, header) in table.headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, column_index(col), header, &header_format)
            .map_err(write_error)?;
    }

    for (index, row) in table.rows().iter().enumerate() {
        let row_index = u32::try_from(index + 1).unwrap_or(u32::MAX);
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(value) => {
                    worksheet
                        .write_string(row_index, column_index(col), value)
                        .map_err(write_error)?;
                }
                Cell::Number(value) => {
                    worksheet
                        .write_number(row_index, column_index(col), *value)
                        .map_err(write_error)?;
                }
                Cell::Blank => {}
            }
        }
    }

    workbook.save(path).map_err(write_error)?;
    debug!(path = %path.display(), sheet = %table.sheet, rows = table.len(), "workbook written");
    Ok(())
}

/// Reads `sheet` (or the first sheet) of the workbook at `path`. The first
/// row supplies the headers; fully blank rows are skipped.
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<Table, ReportError> {
    let read_error = |source| ReportError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook: Xlsx<_> = open_workbook(path).map_err(read_error)?;
    let sheet = match sheet {
        Some(name) => name.to_owned(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ReportError::NoWorksheet {
                path: path.to_path_buf(),
            })?,
    };
    let range = workbook.worksheet_range(&sheet).map_err(read_error)?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|header| {
            header
                .iter()
                .map(|data| cell(data).as_text().unwrap_or_default())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let mut table = Table::new(sheet, &headers);
    for row in rows {
        let cells = row.iter().map(cell).collect::<Vec<_>>();
        if cells.iter().all(|cell| *cell == Cell::Blank) {
            continue;
        }
        table.push_padded(cells);
    }
    debug!(path = %path.display(), sheet = %table.sheet, rows = table.len(), "workbook read");
    Ok(table)
}

fn column_index(col: usize) -> u16 {
    u16::try_from(col).unwrap_or(u16::MAX)
}

fn cell(data: &Data) -> Cell {
    match data {
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Float(value) => Cell::number(*value),
        Data::Bool(value) => Cell::Number(if *value { 1.0 } else { 0.0 }),
        Data::String(value) | Data::DateTimeIso(value) => Cell::Text(value.clone()),
        Data::DateTime(value) => Cell::number(value.as_f64()),
        _ => Cell::Blank,
    }
}

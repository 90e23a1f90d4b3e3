//! Local look at a filled-in template before it is uploaded
//!
//! The backend stays the authority on validity; this only lets the operator
//! spot an obviously wrong file (missing identifier column, no rows).

use anyhow::{Context, Result};
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use std::io::Cursor;

#[derive(Debug, Clone, PartialEq)]
pub struct UploadSummary {
    /// First sheet, the one the backend reads
    pub sheet_name: String,
    /// Header names, trimmed
    pub headers: Vec<String>,
    /// Data rows with at least one non-empty cell
    pub row_count: usize,
}

impl UploadSummary {
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// Columns from `expected` the file does not have
    pub fn missing_columns<'a>(&self, expected: &[&'a str]) -> Vec<&'a str> {
        expected
            .iter()
            .copied()
            .filter(|c| !self.has_column(c))
            .collect()
    }
}

/// Read headers and row count from workbook bytes (xlsx, xls, xlsb or ods)
pub fn inspect_upload(bytes: &[u8]) -> Result<UploadSummary> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).context("File is not a readable workbook")?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .context("Excel file has no sheets")?
        .clone();

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Failed to read sheet: {}", sheet_name))?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|row| row.iter().map(|c| cell_text(c).trim().to_string()).collect())
        .unwrap_or_default();

    let row_count = rows
        .filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
        .count();

    Ok(UploadSummary {
        sheet_name,
        headers,
        row_count,
    })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

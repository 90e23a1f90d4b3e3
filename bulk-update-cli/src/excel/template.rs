//! Build the bulk update template locally
//!
//! Produces the same scaffold the backend serves: one sheet, a header row of
//! `[identifier, ...update columns]`, each column sized to its header.

use anyhow::{Context, Result, bail};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

pub const TEMPLATE_SHEET: &str = "Bulk Update Template";

/// Extra width added to each header's length
const COLUMN_PADDING: usize = 5;

/// Header row of the template.
///
/// The identifier comes first and appears once; repeated update columns are dropped.
pub fn template_headers(identifier_column: &str, update_columns: &[String]) -> Vec<String> {
    let mut headers = vec![identifier_column.to_string()];
    for column in update_columns {
        if !headers.contains(column) {
            headers.push(column.clone());
        }
    }
    headers
}

/// Template as xlsx bytes
pub fn build_template(identifier_column: &str, update_columns: &[String]) -> Result<Vec<u8>> {
    let headers = template_headers(identifier_column, update_columns);
    if identifier_column.is_empty() || headers.len() < 2 {
        bail!("Please select an identifier and at least one column to update.");
    }

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(TEMPLATE_SHEET)?;

    let header_format = Format::new().set_bold();

    for (col, header) in headers.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, header, &header_format)?;
        sheet.set_column_width(col, (header.chars().count() + COLUMN_PADDING) as f64)?;
    }

    workbook
        .save_to_buffer()
        .context("Failed to build template workbook")
}

/// Build the template and write it to `path`
pub fn write_template(path: &Path, identifier_column: &str, update_columns: &[String]) -> Result<()> {
    let bytes = build_template(identifier_column, update_columns)?;
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to save template: {}", path.display()))?;
    log::info!("Template written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::upload::inspect_upload;

    #[test]
    fn test_headers_start_with_identifier() {
        let headers = template_headers("master_id", &["email".into(), "phone".into()]);
        assert_eq!(headers, vec!["master_id", "email", "phone"]);
    }

    #[test]
    fn test_template_reads_back_as_empty_upload() {
        let bytes = build_template("master_id", &["email".into()]).unwrap();
        let summary = inspect_upload(&bytes).unwrap();
        assert_eq!(summary.sheet_name, TEMPLATE_SHEET);
        assert_eq!(summary.headers, vec!["master_id", "email"]);
        assert_eq!(summary.row_count, 0);
    }

    #[test]
    fn test_identifier_is_never_repeated() {
        let columns = vec!["master_id".to_string(), "email".into(), "email".into()];
        let bytes = build_template("master_id", &columns).unwrap();
        let summary = inspect_upload(&bytes).unwrap();
        assert_eq!(summary.headers, vec!["master_id", "email"]);
    }

    #[test]
    fn test_identifier_alone_is_not_a_template() {
        assert!(build_template("master_id", &["master_id".into()]).is_err());
    }

    #[test]
    fn test_template_requires_update_columns() {
        assert!(build_template("master_id", &[]).is_err());
        assert!(build_template("", &["email".into()]).is_err());
    }
}

//! Export a bulk update preview (and its outcome) to Excel for audit

use anyhow::{Context, Result};
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};
use serde_json::Value;
use std::path::Path;

use crate::api::{ExecutionReport, PreviewReport, TableId, UpdateRecord};

/// What was reviewed, and what happened
pub struct ReviewExport<'a> {
    pub table: TableId,
    pub identifier_column: &'a str,
    pub preview: &'a PreviewReport,
    pub execution: Option<&'a ExecutionReport>,
}

pub fn export_review(export: &ReviewExport<'_>, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();

    create_summary_sheet(&mut workbook, export)?;
    create_valid_updates_sheet(&mut workbook, &export.preview.valid_updates)?;
    create_invalid_rows_sheet(&mut workbook, export.preview)?;

    workbook
        .save(path)
        .with_context(|| format!("Failed to save Excel file: {}", path.display()))?;

    log::info!("Bulk update report exported to: {}", path.display());
    Ok(())
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x4472C4))
        .set_font_color(Color::White)
}

fn create_summary_sheet(workbook: &mut Workbook, export: &ReviewExport<'_>) -> Result<()> {
    let sheet = workbook.add_worksheet();
    sheet.set_name("Summary")?;

    let title_format = Format::new().set_bold().set_font_size(16);
    let bold_format = Format::new().set_bold();

    sheet.write_string_with_format(
        0,
        0,
        &format!("Bulk Update: {}", export.table.label()),
        &title_format,
    )?;

    let mut row = 2u32;
    let mut metric = |sheet: &mut Worksheet, label: &str, value: &str| -> Result<()> {
        sheet.write_string_with_format(row, 0, label, &bold_format)?;
        sheet.write_string(row, 1, value)?;
        row += 1;
        Ok(())
    };

    metric(sheet, "Table", export.table.as_str())?;
    metric(sheet, "Identifier Column", export.identifier_column)?;
    metric(
        sheet,
        "Valid Records to Update",
        &export.preview.valid_updates.len().to_string(),
    )?;
    metric(
        sheet,
        "Invalid or Missing IDs",
        &export.preview.invalid_rows.len().to_string(),
    )?;

    if let Some(execution) = export.execution {
        metric(sheet, "Records Successfully Updated", &execution.updated_count.to_string())?;
        metric(sheet, "Records Skipped", &execution.skipped_count.to_string())?;
        metric(sheet, "Message", &execution.message)?;
    } else {
        metric(sheet, "Status", "Not executed")?;
    }

    sheet.set_column_width(0, 30)?;
    sheet.set_column_width(1, 40)?;
    Ok(())
}

fn create_valid_updates_sheet(workbook: &mut Workbook, updates: &[UpdateRecord]) -> Result<()> {
    let sheet = workbook.add_worksheet();
    sheet.set_name("Valid Updates")?;

    let flattened: Vec<Vec<(String, String)>> = updates.iter().map(flatten_record).collect();

    // Columns in first-seen order
    let mut columns: Vec<String> = Vec::new();
    for record in &flattened {
        for (key, _) in record {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let header = header_format();
    for (col, name) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name, &header)?;
    }

    for (row_idx, record) in flattened.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        for (key, value) in record {
            if let Some(col) = columns.iter().position(|c| c == key) {
                sheet.write_string(row, col as u16, value)?;
            }
        }
    }

    Ok(())
}

fn create_invalid_rows_sheet(workbook: &mut Workbook, preview: &PreviewReport) -> Result<()> {
    let sheet = workbook.add_worksheet();
    sheet.set_name("Invalid Rows")?;

    let header = header_format();
    sheet.write_string_with_format(0, 0, "Identifier", &header)?;
    sheet.write_string_with_format(0, 1, "Reason", &header)?;

    for (idx, invalid) in preview.invalid_rows.iter().enumerate() {
        let row = (idx + 1) as u32;
        sheet.write_string(row, 0, &invalid.display_id())?;
        if let Some(reason) = &invalid.reason {
            sheet.write_string(row, 1, reason)?;
        }
    }

    sheet.set_column_width(0, 20)?;
    sheet.set_column_width(1, 40)?;
    Ok(())
}

/// Nested objects become dotted keys (`updates.email`)
fn flatten_record(record: &UpdateRecord) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for (key, value) in record {
        flatten_value(key.clone(), value, &mut out);
    }
    out
}

fn flatten_value(key: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (child, v) in map {
                flatten_value(format!("{}.{}", key, child), v, out);
            }
        }
        Value::Null => out.push((key, String::new())),
        Value::String(s) => out.push((key, s.clone())),
        other => out.push((key, other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::InvalidRow;
    use calamine::{Data, Reader, Xlsx, open_workbook};
    use serde_json::json;

    fn preview() -> PreviewReport {
        PreviewReport {
            valid_updates: vec![
                json!({"id": "1", "updates": {"email": "a@b.com"}})
                    .as_object()
                    .cloned()
                    .unwrap(),
                json!({"id": "2", "updates": {"email": "c@d.com", "phone": 98765}})
                    .as_object()
                    .cloned()
                    .unwrap(),
            ],
            invalid_rows: vec![InvalidRow {
                id: json!("X99"),
                reason: Some("Not found in database".into()),
            }],
        }
    }

    #[test]
    fn test_flatten_nested_updates() {
        let flat = flatten_record(&preview().valid_updates[1]);
        assert_eq!(
            flat,
            vec![
                ("id".to_string(), "2".to_string()),
                ("updates.email".to_string(), "c@d.com".to_string()),
                ("updates.phone".to_string(), "98765".to_string()),
            ]
        );
    }

    #[test]
    fn test_export_writes_three_sheets() {
        let path = std::env::temp_dir().join(format!(
            "bulk-update-cli-report-{}.xlsx",
            std::process::id()
        ));
        let preview = preview();
        let execution = ExecutionReport {
            updated_count: 2,
            skipped_count: 0,
            message: "Bulk update completed successfully.".into(),
        };
        export_review(
            &ReviewExport {
                table: TableId::StudentsDetailsMaster,
                identifier_column: "master_id",
                preview: &preview,
                execution: Some(&execution),
            },
            &path,
        )
        .unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(
            workbook.sheet_names(),
            vec!["Summary", "Valid Updates", "Invalid Rows"]
        );

        let updates = workbook.worksheet_range("Valid Updates").unwrap();
        let header: Vec<String> = updates.rows().next().unwrap().iter().map(|c| c.to_string()).collect();
        assert_eq!(header, vec!["id", "updates.email", "updates.phone"]);
        assert_eq!(updates.get_value((2, 2)), Some(&Data::String("98765".into())));

        let invalid = workbook.worksheet_range("Invalid Rows").unwrap();
        assert_eq!(invalid.get_value((1, 0)), Some(&Data::String("X99".into())));

        let _ = std::fs::remove_file(path);
    }
}

//! Terminal rendering of wizard data

use colored::*;

use crate::api::{ExecutionReport, PreviewReport};
use crate::excel::UploadSummary;
use crate::wizard::{WizardError, WizardStep};

pub fn print_step_header(step: WizardStep) {
    println!();
    println!(
        "{}",
        format!("Step {}: {}", step.number(), step.label()).bold().cyan()
    );
}

pub fn print_error(error: &WizardError) {
    eprintln!("{} {}", "error:".red().bold(), error);
}

pub fn print_columns(columns: &[String], identifier: Option<&str>) {
    for column in columns {
        if Some(column.as_str()) == identifier {
            println!("  {} {}", column.bold(), "(identifier)".dimmed());
        } else {
            println!("  {}", column);
        }
    }
}

/// `expected` is the identifier followed by the chosen update columns
pub fn print_upload_summary(name: &str, summary: &UploadSummary, expected: &[&str]) {
    println!("Selected: {}", name.bright_green());
    println!(
        "  {} data rows, columns: {}",
        summary.row_count,
        summary.headers.join(", ")
    );
    let missing = summary.missing_columns(expected);
    if !missing.is_empty() {
        println!(
            "  {} not in this file: {}",
            "warning:".yellow().bold(),
            missing.join(", ")
        );
    }
}

pub fn print_preview(preview: &PreviewReport) {
    let invalid = preview.invalid_rows.len();
    println!(
        "  {} Valid Records to Update",
        preview.valid_updates.len().to_string().green().bold()
    );
    let invalid_count = if invalid > 0 {
        invalid.to_string().red().bold()
    } else {
        invalid.to_string().normal()
    };
    println!("  {} Invalid or Missing IDs", invalid_count);

    if invalid > 0 {
        println!();
        println!("{}", "Invalid IDs Found".yellow().bold());
        println!(
            "The following identifiers from your file were not found in the database and will be skipped:"
        );
        let ids: Vec<String> = preview.invalid_rows.iter().map(|r| r.display_id()).collect();
        println!("  {}", ids.join(", "));
    }
}

pub fn print_execution(report: &ExecutionReport) {
    println!(
        "  {} Records Successfully Updated",
        report.updated_count.to_string().green().bold()
    );
    let skipped = if report.skipped_count > 0 {
        report.skipped_count.to_string().red().bold()
    } else {
        report.skipped_count.to_string().normal()
    };
    println!("  {} Records Skipped", skipped);
    if !report.message.is_empty() {
        println!("{}", report.message);
    }
}

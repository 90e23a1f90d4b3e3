//! `preview` command: upload a filled template and show the server's verdict

use anyhow::{Context, Result};
use colored::*;

use super::{PreviewArgs, drive_to_review};
use crate::api::BulkUpdateClient;
use crate::cli::output::print_preview;
use crate::config::Config;
use crate::excel::{ReviewExport, export_review};
use crate::wizard::WizardRuntime;

pub async fn handle_preview_command(args: PreviewArgs, config: &Config) -> Result<()> {
    let table = args.upload.table.unwrap_or(config.default_table);
    let client = BulkUpdateClient::from_config(config)?;
    let mut runtime = WizardRuntime::new(client, table, config.download_dir.clone());

    drive_to_review(&mut runtime, &args.upload).await?;
    let state = runtime.state();
    let preview = state
        .preview
        .as_ref()
        .context("Preview finished without a report")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(preview)?);
    } else {
        println!("{}", format!("Preview for {}", table.label()).bold());
        print_preview(preview);
    }

    if let Some(path) = &args.report {
        export_review(
            &ReviewExport {
                table,
                identifier_column: &state.identifier_column,
                preview,
                execution: None,
            },
            path,
        )?;
        eprintln!("Report saved to {}", path.display().to_string().bright_green());
    }
    Ok(())
}

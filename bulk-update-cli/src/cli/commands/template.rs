//! `template` command: fetch or build the fill-in spreadsheet

use anyhow::{Result, bail};
use colored::*;

use super::{TemplateArgs, bail_on_error};
use crate::api::BulkUpdateClient;
use crate::config::Config;
use crate::excel::write_template;
use crate::wizard::{Msg, WizardRuntime};

pub async fn handle_template_command(args: TemplateArgs, config: &Config) -> Result<()> {
    let table = args.table.unwrap_or(config.default_table);
    let dir = args.output.clone().unwrap_or_else(|| config.download_dir.clone());

    if args.offline {
        let Some(identifier) = &args.identifier else {
            bail!("--identifier is required with --offline (the schema is not fetched)");
        };
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(table.template_file_name());
        write_template(&path, identifier, &args.columns)?;
        println!("Template saved to {}", path.display().to_string().bright_green());
        return Ok(());
    }

    let client = BulkUpdateClient::from_config(config)?;
    let mut runtime = WizardRuntime::new(client, table, dir);
    runtime.start().await;
    bail_on_error(runtime.state())?;

    if let Some(identifier) = &args.identifier {
        if !runtime.state().columns.contains(identifier) {
            bail!("'{}' is not a column of {}", identifier, table);
        }
        runtime
            .dispatch(Msg::SelectIdentifier(identifier.clone()))
            .await;
    }

    runtime
        .dispatch(Msg::SetUpdateColumns(args.columns.clone()))
        .await;
    let state = runtime.state();
    let ignored: Vec<&String> = args
        .columns
        .iter()
        .filter(|c| !state.is_update_column_selected(c))
        .collect();
    if !ignored.is_empty() {
        eprintln!(
            "{} ignoring columns not updatable on {}: {}",
            "warning:".yellow().bold(),
            table,
            ignored
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    runtime.dispatch(Msg::DownloadTemplate).await;
    bail_on_error(runtime.state())?;

    if let Some(path) = &runtime.state().template_path {
        println!("Template saved to {}", path.display().to_string().bright_green());
    }
    Ok(())
}

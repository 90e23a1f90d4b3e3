//! `execute` command: preview, confirm, then apply the valid updates

use anyhow::{Context, Result, bail};
use colored::*;
use dialoguer::Confirm;
use dialoguer::theme::ColorfulTheme;
use is_terminal::IsTerminal;

use super::{ExecuteArgs, bail_on_error, drive_to_review};
use crate::api::BulkUpdateClient;
use crate::cli::output::{print_execution, print_preview};
use crate::config::Config;
use crate::excel::{ReviewExport, export_review};
use crate::wizard::{Msg, WizardRuntime, WizardStep};

pub async fn handle_execute_command(args: ExecuteArgs, config: &Config) -> Result<()> {
    let table = args.upload.table.unwrap_or(config.default_table);
    let client = BulkUpdateClient::from_config(config)?;
    let mut runtime = WizardRuntime::new(client, table, config.download_dir.clone());

    drive_to_review(&mut runtime, &args.upload).await?;
    {
        let preview = runtime
            .state()
            .preview
            .as_ref()
            .context("Preview finished without a report")?;
        print_preview(preview);
    }

    runtime
        .dispatch(Msg::SetProceedWithErrors(args.proceed_with_errors))
        .await;
    if runtime.state().is_execution_gated() {
        bail!(
            "Some identifiers were not found and would be skipped; re-run with --proceed-with-errors to update the valid records"
        );
    }

    if !args.yes {
        if !std::io::stdin().is_terminal() {
            bail!("Refusing to update without confirmation; pass --yes when not running in a terminal");
        }
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(runtime.state().execute_label())
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Nothing updated.");
            return Ok(());
        }
    }

    runtime.dispatch(Msg::Execute).await;
    bail_on_error(runtime.state())?;
    if runtime.state().step != WizardStep::Done {
        bail!("Execution did not complete");
    }

    let state = runtime.state();
    let execution = state
        .execution
        .as_ref()
        .context("Execution finished without a report")?;
    println!("{}", "Update Complete".bold());
    print_execution(execution);

    if let (Some(path), Some(preview)) = (&args.report, &state.preview) {
        export_review(
            &ReviewExport {
                table,
                identifier_column: &state.identifier_column,
                preview,
                execution: Some(execution),
            },
            path,
        )?;
        eprintln!("Report saved to {}", path.display().to_string().bright_green());
    }
    Ok(())
}

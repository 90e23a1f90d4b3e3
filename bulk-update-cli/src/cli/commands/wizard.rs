//! `wizard` command: the interactive four-step flow
//!
//! Prompts map one-to-one onto wizard messages; all rules (gating, column
//! constraints, error handling) live in the state machine.

use anyhow::{Result, bail};
use colored::*;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, MultiSelect, Select};
use is_terminal::IsTerminal;
use std::path::PathBuf;

use super::WizardArgs;
use crate::api::{BulkUpdateClient, BulkUpdateService, TableId, UploadFile};
use crate::cli::output::{
    print_error, print_execution, print_preview, print_step_header, print_upload_summary,
};
use crate::config::Config;
use crate::excel::{ReviewExport, export_review, inspect_upload};
use crate::wizard::{Msg, WizardRuntime, WizardStep};

enum Flow {
    Continue,
    Quit,
}

#[derive(Clone, Copy)]
enum Action {
    RetrySchema,
    ChangeTable,
    ChangeIdentifier,
    ChooseColumns,
    DownloadTemplate,
    Next,
    ChooseFile,
    Preview,
    Back,
    Acknowledge,
    Execute,
    Export,
    Reset,
    Quit,
}

pub async fn handle_wizard_command(args: WizardArgs, config: &Config) -> Result<()> {
    if !std::io::stdin().is_terminal() {
        bail!("The wizard needs an interactive terminal; use `preview` and `execute` in scripts");
    }

    let table = args.table.unwrap_or(config.default_table);
    let client = BulkUpdateClient::from_config(config)?;
    log::info!("Connecting to {}", client.base_url());
    let mut runtime = WizardRuntime::new(client, table, config.download_dir.clone());
    let theme = ColorfulTheme::default();

    println!("{}", "Bulk Data Update".bold());
    println!("Follow the steps to update multiple records at once using an Excel template.");

    runtime.start().await;
    loop {
        if let Some(error) = runtime.state().error.clone() {
            print_error(&error);
            runtime.dispatch(Msg::DismissError).await;
        }

        let step = runtime.state().step;
        print_step_header(step);
        let flow = match step {
            WizardStep::Configure => configure_step(&mut runtime, &theme).await?,
            WizardStep::Upload => upload_step(&mut runtime, &theme).await?,
            WizardStep::Review => review_step(&mut runtime, &theme, config).await?,
            WizardStep::Done => done_step(&mut runtime, &theme, config).await?,
        };
        if let Flow::Quit = flow {
            break;
        }
    }
    Ok(())
}

fn pick(theme: &ColorfulTheme, prompt: &str, options: &[(Action, String)]) -> Result<Action> {
    let labels: Vec<&str> = options.iter().map(|(_, label)| label.as_str()).collect();
    let idx = Select::with_theme(theme)
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact()?;
    Ok(options[idx].0)
}

async fn configure_step<S: BulkUpdateService>(
    runtime: &mut WizardRuntime<S>,
    theme: &ColorfulTheme,
) -> Result<Flow> {
    let state = runtime.state();

    if state.columns.is_empty() {
        let options = vec![
            (Action::RetrySchema, "Retry loading columns".to_string()),
            (Action::ChangeTable, format!("Change table ({})", state.table.label())),
            (Action::Quit, "Quit".to_string()),
        ];
        let table = state.table;
        return match pick(theme, "No columns loaded", &options)? {
            Action::RetrySchema => {
                runtime.dispatch(Msg::SelectTable(table)).await;
                Ok(Flow::Continue)
            }
            Action::ChangeTable => {
                choose_table(runtime, theme).await?;
                Ok(Flow::Continue)
            }
            _ => Ok(Flow::Quit),
        };
    }

    println!("Table to Update: {}", state.table.label().bold());
    println!("Unique Identifier Column: {}", state.identifier_column.bold());
    if state.update_columns.is_empty() {
        println!("Columns to Update: {}", "none selected".dimmed());
    } else {
        println!("Columns to Update: {}", state.update_columns.join(", "));
    }

    let mut options = vec![
        (Action::ChangeTable, "Change table".to_string()),
        (Action::ChangeIdentifier, "Change identifier column".to_string()),
        (Action::ChooseColumns, "Choose columns to update".to_string()),
    ];
    if state.can_download_template() {
        options.push((Action::DownloadTemplate, state.template_label().to_string()));
    }
    if state.can_proceed_to_upload() {
        options.push((Action::Next, "Next: Upload File →".to_string()));
    }
    options.push((Action::Quit, "Quit".to_string()));

    match pick(theme, "Configure", &options)? {
        Action::ChangeTable => choose_table(runtime, theme).await?,
        Action::ChangeIdentifier => choose_identifier(runtime, theme).await?,
        Action::ChooseColumns => choose_update_columns(runtime, theme).await?,
        Action::DownloadTemplate => {
            runtime.dispatch(Msg::DownloadTemplate).await;
            if runtime.state().error.is_none() {
                if let Some(path) = &runtime.state().template_path {
                    println!(
                        "Template saved to {}",
                        path.display().to_string().bright_green()
                    );
                }
            }
        }
        Action::Next => runtime.dispatch(Msg::Next).await,
        _ => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

async fn choose_table<S: BulkUpdateService>(
    runtime: &mut WizardRuntime<S>,
    theme: &ColorfulTheme,
) -> Result<()> {
    let current = runtime.state().table;
    let labels: Vec<&str> = TableId::ALL.iter().map(|t| t.label()).collect();
    let default = TableId::ALL.iter().position(|t| *t == current).unwrap_or(0);
    let idx = Select::with_theme(theme)
        .with_prompt("Table to Update")
        .items(&labels)
        .default(default)
        .interact()?;
    runtime.dispatch(Msg::SelectTable(TableId::ALL[idx])).await;
    Ok(())
}

async fn choose_identifier<S: BulkUpdateService>(
    runtime: &mut WizardRuntime<S>,
    theme: &ColorfulTheme,
) -> Result<()> {
    let state = runtime.state();
    let default = state
        .columns
        .iter()
        .position(|c| *c == state.identifier_column)
        .unwrap_or(0);
    let idx = Select::with_theme(theme)
        .with_prompt("Unique Identifier Column")
        .items(&state.columns)
        .default(default)
        .interact()?;
    let column = state.columns[idx].clone();
    runtime.dispatch(Msg::SelectIdentifier(column)).await;
    Ok(())
}

async fn choose_update_columns<S: BulkUpdateService>(
    runtime: &mut WizardRuntime<S>,
    theme: &ColorfulTheme,
) -> Result<()> {
    let state = runtime.state();
    let selectable: Vec<String> = state
        .selectable_update_columns()
        .into_iter()
        .map(str::to_string)
        .collect();
    let defaults: Vec<bool> = selectable
        .iter()
        .map(|c| state.is_update_column_selected(c))
        .collect();

    let chosen = MultiSelect::with_theme(theme)
        .with_prompt("Columns to Update (space to toggle)")
        .items(&selectable)
        .defaults(&defaults)
        .interact()?;

    // Toggle only what changed so the existing order is kept
    for (idx, column) in selectable.into_iter().enumerate() {
        if chosen.contains(&idx) != defaults[idx] {
            runtime.dispatch(Msg::ToggleUpdateColumn(column)).await;
        }
    }
    Ok(())
}

async fn upload_step<S: BulkUpdateService>(
    runtime: &mut WizardRuntime<S>,
    theme: &ColorfulTheme,
) -> Result<Flow> {
    let state = runtime.state();
    println!("{}", state.file_label());

    let mut options = vec![(Action::ChooseFile, "Choose file".to_string())];
    if state.can_preview() {
        options.push((Action::Preview, state.preview_label().to_string()));
    }
    options.push((Action::Back, "← Back to Configuration".to_string()));
    options.push((Action::Quit, "Quit".to_string()));

    match pick(theme, "Upload", &options)? {
        Action::ChooseFile => choose_file(runtime, theme).await?,
        Action::Preview => runtime.dispatch(Msg::PreviewChanges).await,
        Action::Back => runtime.dispatch(Msg::Back).await,
        _ => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

async fn choose_file<S: BulkUpdateService>(
    runtime: &mut WizardRuntime<S>,
    theme: &ColorfulTheme,
) -> Result<()> {
    let input: String = Input::with_theme(theme)
        .with_prompt("Path to the completed .xlsx file")
        .interact_text()?;
    let path = PathBuf::from(input.trim());

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!(
                "{} could not read {}: {}",
                "error:".red().bold(),
                path.display(),
                e
            );
            return Ok(());
        }
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.trim().to_string());

    match inspect_upload(&bytes) {
        Ok(summary) => {
            let state = runtime.state();
            let expected: Vec<&str> = std::iter::once(state.identifier_column.as_str())
                .chain(state.update_columns.iter().map(String::as_str))
                .collect();
            print_upload_summary(&name, &summary, &expected);
        }
        Err(e) => {
            println!("Selected: {}", name.bright_green());
            log::warn!("Could not inspect {}: {:#}", path.display(), e);
        }
    }

    runtime
        .dispatch(Msg::FileChosen(UploadFile::new(name, bytes)))
        .await;
    Ok(())
}

async fn review_step<S: BulkUpdateService>(
    runtime: &mut WizardRuntime<S>,
    theme: &ColorfulTheme,
    config: &Config,
) -> Result<Flow> {
    let state = runtime.state();
    let Some(preview) = &state.preview else {
        // Review is only entered with a preview
        runtime.dispatch(Msg::Back).await;
        return Ok(Flow::Continue);
    };
    print_preview(preview);

    let mut options = Vec::new();
    if state.can_execute() {
        options.push((Action::Execute, state.execute_label()));
    }
    if preview.has_invalid_rows() {
        let mark = if state.proceed_with_errors { "[x]" } else { "[ ]" };
        options.push((
            Action::Acknowledge,
            format!(
                "{} I acknowledge the errors and want to proceed with updating the valid records.",
                mark
            ),
        ));
    }
    options.push((Action::Export, "Export review to Excel".to_string()));
    options.push((Action::Back, "← Back to Upload".to_string()));
    options.push((Action::Quit, "Quit".to_string()));

    match pick(theme, "Review", &options)? {
        Action::Execute => {
            let confirmed = Confirm::with_theme(theme)
                .with_prompt(format!("{} in {}?", state.execute_label(), state.table.label()))
                .default(false)
                .interact()?;
            if confirmed {
                runtime.dispatch(Msg::Execute).await;
            }
        }
        Action::Acknowledge => {
            let checked = !state.proceed_with_errors;
            runtime.dispatch(Msg::SetProceedWithErrors(checked)).await;
        }
        Action::Export => export(runtime, theme, config)?,
        Action::Back => runtime.dispatch(Msg::Back).await,
        _ => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

async fn done_step<S: BulkUpdateService>(
    runtime: &mut WizardRuntime<S>,
    theme: &ColorfulTheme,
    config: &Config,
) -> Result<Flow> {
    if let Some(execution) = &runtime.state().execution {
        print_execution(execution);
    }

    let options = vec![
        (Action::Reset, "Start New Bulk Update".to_string()),
        (Action::Export, "Export report to Excel".to_string()),
        (Action::Quit, "Quit".to_string()),
    ];
    match pick(theme, "Done", &options)? {
        Action::Reset => runtime.dispatch(Msg::Reset).await,
        Action::Export => export(runtime, theme, config)?,
        _ => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn export<S: BulkUpdateService>(
    runtime: &WizardRuntime<S>,
    theme: &ColorfulTheme,
    config: &Config,
) -> Result<()> {
    let state = runtime.state();
    let Some(preview) = &state.preview else {
        return Ok(());
    };

    let default = config
        .download_dir
        .join(format!("bulk_update_{}_report.xlsx", state.table.as_str()));
    let input: String = Input::with_theme(theme)
        .with_prompt("Save report to")
        .default(default.display().to_string())
        .interact_text()?;
    let path = PathBuf::from(input.trim());

    let export = ReviewExport {
        table: state.table,
        identifier_column: &state.identifier_column,
        preview,
        execution: state.execution.as_ref(),
    };
    match export_review(&export, &path) {
        Ok(()) => println!("Report saved to {}", path.display().to_string().bright_green()),
        Err(e) => eprintln!("{} {:#}", "error:".red().bold(), e),
    }
    Ok(())
}

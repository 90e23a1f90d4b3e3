//! Subcommands and their arguments

pub mod config;
pub mod execute;
pub mod preview;
pub mod schema;
pub mod template;
pub mod wizard;

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use colored::*;
use std::path::PathBuf;

use crate::api::{BulkUpdateService, TableId, UploadFile};
use crate::config::Config;
use crate::excel::inspect_upload;
use crate::wizard::{Msg, WizardRuntime, WizardState, WizardStep};

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Walk through configure, upload, review and execute interactively
    Wizard(WizardArgs),
    /// List the columns of a table
    Schema(SchemaArgs),
    /// Download (or build offline) a fill-in template
    Template(TemplateArgs),
    /// Upload a filled template and show what would change
    Preview(PreviewArgs),
    /// Upload a filled template and apply the valid updates
    Execute(ExecuteArgs),
    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Debug, Args)]
pub struct WizardArgs {
    /// Table to start with (defaults to the configured table)
    #[arg(long, value_enum)]
    pub table: Option<TableId>,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    #[arg(value_enum)]
    pub table: Option<TableId>,

    /// Print the column list as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct TemplateArgs {
    #[arg(long, value_enum)]
    pub table: Option<TableId>,

    /// Identifier column (defaults to the first schema column)
    #[arg(long)]
    pub identifier: Option<String>,

    /// Columns to update, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    pub columns: Vec<String>,

    /// Build the template locally instead of asking the backend
    #[arg(long)]
    pub offline: bool,

    /// Directory to save into (defaults to the configured download dir)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Arguments shared by `preview` and `execute`
#[derive(Debug, Args)]
pub struct UploadArgs {
    #[arg(long, value_enum)]
    pub table: Option<TableId>,

    /// Column used to match rows to existing records
    #[arg(long)]
    pub identifier: String,

    /// Filled-in template (.xlsx)
    #[arg(long)]
    pub file: PathBuf,

    /// Columns the file updates; defaults to the file's headers minus the identifier
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub upload: UploadArgs,

    /// Print the raw preview JSON
    #[arg(long)]
    pub json: bool,

    /// Also write the preview to an Excel report
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ExecuteArgs {
    #[command(flatten)]
    pub upload: UploadArgs,

    /// Acknowledge that unmatched identifiers will be skipped
    #[arg(long)]
    pub proceed_with_errors: bool,

    /// Skip the final confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Write the preview and outcome to an Excel report
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
}

pub async fn run(command: Commands, config: Config, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        Commands::Wizard(args) => wizard::handle_wizard_command(args, &config).await,
        Commands::Schema(args) => schema::handle_schema_command(args, &config).await,
        Commands::Template(args) => template::handle_template_command(args, &config).await,
        Commands::Preview(args) => preview::handle_preview_command(args, &config).await,
        Commands::Execute(args) => execute::handle_execute_command(args, &config).await,
        Commands::Config(cmd) => config::handle_config_command(cmd, &config, config_path),
    }
}

/// Turn the wizard's error banner into a command failure
pub(crate) fn bail_on_error(state: &WizardState) -> Result<()> {
    if let Some(error) = &state.error {
        bail!("{}", error);
    }
    Ok(())
}

/// Push an upload through configure and upload until the preview is in
pub(crate) async fn drive_to_review<S: BulkUpdateService>(
    runtime: &mut WizardRuntime<S>,
    args: &UploadArgs,
) -> Result<()> {
    runtime.start().await;
    bail_on_error(runtime.state())?;

    if !runtime.state().columns.contains(&args.identifier) {
        bail!(
            "'{}' is not a column of {}",
            args.identifier,
            runtime.state().table
        );
    }
    runtime
        .dispatch(Msg::SelectIdentifier(args.identifier.clone()))
        .await;

    let bytes = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let columns = if args.columns.is_empty() {
        match inspect_upload(&bytes) {
            Ok(summary) => {
                if !summary.has_column(&args.identifier) {
                    eprintln!(
                        "{} identifier column '{}' not found in {}",
                        "warning:".yellow().bold(),
                        args.identifier,
                        args.file.display()
                    );
                }
                summary.headers
            }
            // The server reads the file itself; any selectable column lets it through
            Err(e) => {
                log::warn!("Could not inspect {}: {:#}", args.file.display(), e);
                runtime
                    .state()
                    .selectable_update_columns()
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            }
        }
    } else {
        args.columns.clone()
    };
    runtime.dispatch(Msg::SetUpdateColumns(columns)).await;
    if runtime.state().update_columns.is_empty() {
        bail!(
            "No columns to update: pass --columns or put update columns in the file's header row"
        );
    }
    runtime.dispatch(Msg::Next).await;

    let name = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.xlsx".to_string());
    runtime
        .dispatch(Msg::FileChosen(UploadFile::new(name, bytes)))
        .await;
    runtime.dispatch(Msg::PreviewChanges).await;

    bail_on_error(runtime.state())?;
    if runtime.state().step != WizardStep::Review {
        bail!("Preview did not complete");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ApiError;
    use crate::api::{
        ExecuteRequest, ExecutionReport, PreviewReport, PreviewRequest, TemplateRequest,
    };
    use async_trait::async_trait;
    use rust_xlsxwriter::Workbook;
    use std::sync::Mutex;

    struct RecordingService {
        previews: Mutex<Vec<PreviewRequest>>,
    }

    #[async_trait]
    impl BulkUpdateService for RecordingService {
        async fn table_schema(&self, _table: TableId) -> Result<Vec<String>, ApiError> {
            Ok(vec!["master_id".into(), "name".into(), "email".into()])
        }

        async fn download_template(&self, _request: &TemplateRequest) -> Result<Vec<u8>, ApiError> {
            Ok(Vec::new())
        }

        async fn preview_upload(&self, request: &PreviewRequest) -> Result<PreviewReport, ApiError> {
            self.previews.lock().unwrap().push(request.clone());
            Ok(PreviewReport::default())
        }

        async fn execute(&self, _request: &ExecuteRequest) -> Result<ExecutionReport, ApiError> {
            Ok(ExecutionReport::default())
        }
    }

    fn write_upload(name: &str) -> PathBuf {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "master_id").unwrap();
        sheet.write_string(0, 1, "email").unwrap();
        sheet.write_number(1, 0, 7.0).unwrap();
        sheet.write_string(1, 1, "x@y.org").unwrap();
        let path = std::env::temp_dir().join(format!("{}-{}.xlsx", name, std::process::id()));
        workbook.save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn test_drive_to_review_uses_file_headers() {
        let path = write_upload("bulk-update-cli-drive");
        let service = RecordingService {
            previews: Mutex::new(Vec::new()),
        };
        let mut runtime = WizardRuntime::new(service, TableId::StudentsDetailsMaster, ".");
        let args = UploadArgs {
            table: None,
            identifier: "master_id".into(),
            file: path.clone(),
            columns: Vec::new(),
        };

        drive_to_review(&mut runtime, &args).await.unwrap();

        assert_eq!(runtime.state().step, WizardStep::Review);
        assert_eq!(runtime.state().update_columns, vec!["email"]);
        let previews = runtime.service().previews.lock().unwrap();
        assert_eq!(previews.len(), 1);
        assert_eq!(previews[0].identifier_column, "master_id");
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_drive_to_review_sends_files_it_cannot_read() {
        let path = std::env::temp_dir().join(format!(
            "bulk-update-cli-legacy-{}.xls",
            std::process::id()
        ));
        std::fs::write(&path, b"legacy workbook bytes").unwrap();
        let service = RecordingService {
            previews: Mutex::new(Vec::new()),
        };
        let mut runtime = WizardRuntime::new(service, TableId::StudentsDetailsMaster, ".");
        let args = UploadArgs {
            table: None,
            identifier: "master_id".into(),
            file: path.clone(),
            columns: Vec::new(),
        };

        drive_to_review(&mut runtime, &args).await.unwrap();

        assert_eq!(runtime.state().step, WizardStep::Review);
        let previews = runtime.service().previews.lock().unwrap();
        assert_eq!(previews.len(), 1);
        assert_eq!(previews[0].file.bytes, b"legacy workbook bytes".to_vec());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_drive_to_review_rejects_unknown_identifier() {
        let service = RecordingService {
            previews: Mutex::new(Vec::new()),
        };
        let mut runtime = WizardRuntime::new(service, TableId::StudentsDetailsMaster, ".");
        let args = UploadArgs {
            table: None,
            identifier: "roll_no".into(),
            file: PathBuf::from("unused.xlsx"),
            columns: Vec::new(),
        };

        let err = drive_to_review(&mut runtime, &args).await.unwrap_err();
        assert!(err.to_string().contains("'roll_no' is not a column"));
    }
}

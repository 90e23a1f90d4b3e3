//! Bulk update wizard transitions
//!
//! Elm-style: [`update`] mutates the state for one message and returns the
//! [`Command`] the runtime should perform. Request outcomes come back as
//! messages, so every transition is testable without a server.

use log::{debug, info, warn};

use crate::api::{ExecuteRequest, PreviewRequest, TableId, TemplateRequest};

use super::command::Command;
use super::msg::Msg;
use super::state::WizardState;
use super::types::{ErrorKind, WizardError, WizardStep};

const MISSING_COLUMNS: &str = "Please select an identifier and at least one column to update.";
const MISSING_FILE: &str = "Please select a file to upload.";

/// Fresh wizard for `table`; the schema fetch starts immediately
pub fn init(table: TableId) -> (WizardState, Command) {
    let mut state = WizardState::new(table);
    let cmd = begin_schema_fetch(&mut state);
    (state, cmd)
}

pub fn update(state: &mut WizardState, msg: Msg) -> Command {
    match msg {
        // === Step 1: Configure ===
        Msg::SelectTable(table) => {
            if !accepts_action(state, WizardStep::Configure, "SelectTable") {
                return Command::None;
            }
            info!("Table changed to {}", table);
            state.table = table;
            state.file = None;
            state.preview = None;
            state.proceed_with_errors = false;
            begin_schema_fetch(state)
        }
        Msg::SchemaLoaded(table, result) => {
            if table != state.table {
                debug!("Dropping schema for {} (current table is {})", table, state.table);
                return Command::None;
            }
            state.loading = false;
            match result {
                Ok(columns) => {
                    debug!("Loaded {} columns for {}", columns.len(), table);
                    state.identifier_column = columns.first().cloned().unwrap_or_default();
                    state.update_columns.clear();
                    state.columns = columns;
                }
                Err(e) => {
                    warn!("Schema fetch for {} failed: {}", table, e);
                    state.error = Some(WizardError::new(ErrorKind::SchemaFetch, e));
                }
            }
            Command::None
        }
        Msg::SelectIdentifier(column) => {
            if !accepts_action(state, WizardStep::Configure, "SelectIdentifier") {
                return Command::None;
            }
            if !state.columns.contains(&column) {
                debug!("Ignoring unknown identifier column '{}'", column);
                return Command::None;
            }
            state.update_columns.retain(|c| *c != column);
            state.identifier_column = column;
            Command::None
        }
        Msg::ToggleUpdateColumn(column) => {
            if !accepts_action(state, WizardStep::Configure, "ToggleUpdateColumn") {
                return Command::None;
            }
            if column == state.identifier_column || !state.columns.contains(&column) {
                return Command::None;
            }
            if state.is_update_column_selected(&column) {
                state.update_columns.retain(|c| *c != column);
            } else {
                state.update_columns.push(column);
            }
            Command::None
        }
        Msg::SetUpdateColumns(columns) => {
            if !accepts_action(state, WizardStep::Configure, "SetUpdateColumns") {
                return Command::None;
            }
            let mut selected: Vec<String> = Vec::new();
            for column in columns {
                if column != state.identifier_column
                    && state.columns.contains(&column)
                    && !selected.contains(&column)
                {
                    selected.push(column);
                }
            }
            state.update_columns = selected;
            Command::None
        }
        Msg::DownloadTemplate => {
            if !accepts_action(state, WizardStep::Configure, "DownloadTemplate") {
                return Command::None;
            }
            if state.identifier_column.is_empty() || state.update_columns.is_empty() {
                state.error = Some(WizardError::new(ErrorKind::Validation, MISSING_COLUMNS));
                return Command::None;
            }
            state.error = None;
            state.loading = true;
            Command::DownloadTemplate(TemplateRequest {
                table: state.table,
                identifier_column: state.identifier_column.clone(),
                update_columns: state.update_columns.clone(),
            })
        }
        Msg::TemplateDownloaded(result) => {
            state.loading = false;
            match result {
                Ok(path) => {
                    info!("Template saved to {}", path.display());
                    state.template_path = Some(path);
                }
                Err(e) => {
                    warn!("Template download failed: {}", e);
                    state.error = Some(WizardError::new(ErrorKind::TemplateGen, e));
                }
            }
            Command::None
        }

        // === Navigation ===
        Msg::Next => {
            if accepts_action(state, WizardStep::Configure, "Next") && state.can_proceed_to_upload()
            {
                state.step = WizardStep::Upload;
            }
            Command::None
        }
        Msg::Back => {
            if state.loading {
                return Command::None;
            }
            if let Some(prev) = state.step.prev() {
                state.step = prev;
            }
            Command::None
        }

        // === Step 2: Upload ===
        Msg::FileChosen(file) => {
            if !accepts_action(state, WizardStep::Upload, "FileChosen") {
                return Command::None;
            }
            debug!("File chosen: {} ({} bytes)", file.name, file.bytes.len());
            state.file = Some(file);
            state.preview = None;
            state.proceed_with_errors = false;
            Command::None
        }
        Msg::PreviewChanges => {
            if !accepts_action(state, WizardStep::Upload, "PreviewChanges") {
                return Command::None;
            }
            let Some(file) = state.file.clone() else {
                state.error = Some(WizardError::new(ErrorKind::Validation, MISSING_FILE));
                return Command::None;
            };
            state.error = None;
            state.loading = true;
            Command::PreviewUpload(PreviewRequest {
                table: state.table,
                identifier_column: state.identifier_column.clone(),
                file,
            })
        }
        Msg::PreviewLoaded(result) => {
            state.loading = false;
            match result {
                Ok(report) => {
                    info!(
                        "Preview: {} valid updates, {} invalid rows",
                        report.valid_updates.len(),
                        report.invalid_rows.len()
                    );
                    state.preview = Some(report);
                    state.proceed_with_errors = false;
                    state.step = WizardStep::Review;
                }
                Err(e) => {
                    warn!("Preview upload failed: {}", e);
                    state.error = Some(WizardError::new(ErrorKind::PreviewUpload, e));
                }
            }
            Command::None
        }

        // === Step 3: Review ===
        Msg::SetProceedWithErrors(checked) => {
            if accepts_action(state, WizardStep::Review, "SetProceedWithErrors") {
                state.proceed_with_errors = checked;
            }
            Command::None
        }
        Msg::Execute => {
            if !accepts_action(state, WizardStep::Review, "Execute") {
                return Command::None;
            }
            if state.is_execution_gated() {
                debug!("Execute ignored: unmatched rows not acknowledged");
                return Command::None;
            }
            let Some(preview) = &state.preview else {
                return Command::None;
            };
            let request = ExecuteRequest {
                table_name: state.table,
                identifier_column: state.identifier_column.clone(),
                updates: preview.valid_updates.clone(),
            };
            state.error = None;
            state.loading = true;
            Command::Execute(request)
        }
        Msg::ExecutionFinished(result) => {
            state.loading = false;
            match result {
                Ok(report) => {
                    info!(
                        "Bulk update finished: {} updated, {} skipped",
                        report.updated_count, report.skipped_count
                    );
                    state.execution = Some(report);
                    state.step = WizardStep::Done;
                }
                Err(e) => {
                    warn!("Bulk update failed: {}", e);
                    state.error = Some(WizardError::new(ErrorKind::Execution, e));
                }
            }
            Command::None
        }

        // === Step 4: Done ===
        Msg::Reset => {
            if !accepts_action(state, WizardStep::Done, "Reset") {
                return Command::None;
            }
            state.step = WizardStep::Configure;
            state.file = None;
            state.preview = None;
            state.execution = None;
            state.proceed_with_errors = false;
            state.template_path = None;
            begin_schema_fetch(state)
        }

        Msg::DismissError => {
            state.error = None;
            Command::None
        }
    }
}

/// Operator actions only apply on their own step and never while a request is in flight
fn accepts_action(state: &WizardState, step: WizardStep, action: &str) -> bool {
    if state.loading {
        debug!("{} ignored while a request is in flight", action);
        return false;
    }
    if state.step != step {
        debug!("{} ignored on step {}", action, state.step.number());
        return false;
    }
    true
}

/// Drop column selections for the current table and ask for its schema
fn begin_schema_fetch(state: &mut WizardState) -> Command {
    state.columns.clear();
    state.identifier_column.clear();
    state.update_columns.clear();
    state.error = None;
    state.loading = true;
    Command::FetchSchema(state.table)
}

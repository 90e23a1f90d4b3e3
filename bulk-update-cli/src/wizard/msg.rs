//! Events the wizard reacts to: operator actions and request outcomes

use std::path::PathBuf;

use crate::api::{ExecutionReport, PreviewReport, TableId, UploadFile};

#[derive(Debug, Clone)]
pub enum Msg {
    // === Step 1: Configure ===
    /// Table selector changed
    SelectTable(TableId),
    /// Schema request finished for the given table
    SchemaLoaded(TableId, Result<Vec<String>, String>),
    /// Identifier selector changed
    SelectIdentifier(String),
    /// Checkbox in the "columns to update" list toggled
    ToggleUpdateColumn(String),
    /// Replace the whole update column selection
    SetUpdateColumns(Vec<String>),
    DownloadTemplate,
    /// Template bytes saved (or not) to disk
    TemplateDownloaded(Result<PathBuf, String>),

    // === Navigation ===
    Next,
    Back,

    // === Step 2: Upload ===
    FileChosen(UploadFile),
    PreviewChanges,
    PreviewLoaded(Result<PreviewReport, String>),

    // === Step 3: Review ===
    /// Acknowledgment checkbox for unmatched identifiers
    SetProceedWithErrors(bool),
    Execute,
    ExecutionFinished(Result<ExecutionReport, String>),

    // === Step 4: Done ===
    /// Start a new bulk update
    Reset,

    // === General ===
    DismissError,
}

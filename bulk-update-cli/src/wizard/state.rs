//! Wizard state
//!
//! One record holds everything the four steps display. It is created fresh
//! when the wizard starts and rebuilt on reset; nothing here is persisted.

use std::path::PathBuf;

use crate::api::{ExecutionReport, PreviewReport, TableId, UploadFile};

use super::types::{WizardError, WizardStep};

#[derive(Debug, Clone, Default)]
pub struct WizardState {
    /// Stage currently displayed
    pub step: WizardStep,

    /// Table being updated
    pub table: TableId,

    /// Column names of `table`, empty until a schema fetch succeeds
    pub columns: Vec<String>,

    /// Column used to match uploaded rows to records
    pub identifier_column: String,

    /// Columns the operator wants to overwrite, in selection order.
    /// Never contains `identifier_column`.
    pub update_columns: Vec<String>,

    /// Spreadsheet chosen in the upload step
    pub file: Option<UploadFile>,

    /// Validator response for the current upload
    pub preview: Option<PreviewReport>,

    /// Execution engine response
    pub execution: Option<ExecutionReport>,

    /// Operator acknowledged that unmatched identifiers will be skipped
    pub proceed_with_errors: bool,

    pub error: Option<WizardError>,

    /// A request is in flight
    pub loading: bool,

    /// Where the last template was saved
    pub template_path: Option<PathBuf>,
}

impl WizardState {
    pub fn new(table: TableId) -> Self {
        Self {
            table,
            ..Default::default()
        }
    }

    /// Columns offered in the "columns to update" checklist
    pub fn selectable_update_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| **c != self.identifier_column)
            .map(String::as_str)
            .collect()
    }

    pub fn is_update_column_selected(&self, column: &str) -> bool {
        self.update_columns.iter().any(|c| c == column)
    }

    pub fn can_download_template(&self) -> bool {
        !self.loading && !self.identifier_column.is_empty() && !self.update_columns.is_empty()
    }

    /// "Next: Upload File" is clickable
    pub fn can_proceed_to_upload(&self) -> bool {
        !self.update_columns.is_empty()
    }

    pub fn can_preview(&self) -> bool {
        !self.loading && self.file.is_some()
    }

    /// Execution waits on the operator's acknowledgment of unmatched rows
    pub fn is_execution_gated(&self) -> bool {
        self.preview
            .as_ref()
            .map(|p| p.has_invalid_rows() && !self.proceed_with_errors)
            .unwrap_or(false)
    }

    pub fn can_execute(&self) -> bool {
        !self.loading && self.preview.is_some() && !self.is_execution_gated()
    }

    /// Number of rows the execute button will send
    pub fn pending_update_count(&self) -> usize {
        self.preview
            .as_ref()
            .map(|p| p.valid_updates.len())
            .unwrap_or(0)
    }

    pub fn execute_label(&self) -> String {
        if self.loading {
            "Updating...".to_string()
        } else {
            format!("Update {} Records", self.pending_update_count())
        }
    }

    pub fn template_label(&self) -> &'static str {
        if self.loading {
            "Generating..."
        } else {
            "Download Template"
        }
    }

    pub fn preview_label(&self) -> &'static str {
        if self.loading {
            "Processing..."
        } else {
            "Preview Changes"
        }
    }

    /// Text of the file drop zone
    pub fn file_label(&self) -> String {
        match &self.file {
            Some(file) => format!("Selected: {}", file.name),
            None => "No file selected".to_string(),
        }
    }
}

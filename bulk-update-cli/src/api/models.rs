//! Wire types for the bulk update endpoints

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Tables the bulk update pipeline accepts
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum TableId {
    #[default]
    #[value(name = "students_details_master")]
    StudentsDetailsMaster,
    #[value(name = "student_fee_transactions")]
    StudentFeeTransactions,
}

impl TableId {
    pub const ALL: [TableId; 2] = [Self::StudentsDetailsMaster, Self::StudentFeeTransactions];

    /// Table name as the backend knows it
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StudentsDetailsMaster => "students_details_master",
            Self::StudentFeeTransactions => "student_fee_transactions",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::StudentsDetailsMaster => "Student Details",
            Self::StudentFeeTransactions => "Fee Transactions",
        }
    }

    /// File name the downloaded template is saved under
    pub fn template_file_name(&self) -> String {
        format!("bulk_update_{}_template.xlsx", self.as_str())
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row the server matched against an existing record.
///
/// The client never looks inside; it is counted, rendered and sent back verbatim.
pub type UpdateRecord = Map<String, Value>;

/// Identifier from the uploaded file that matched no record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidRow {
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl InvalidRow {
    /// Identifier as plain text (strings without quotes, numbers as written)
    pub fn display_id(&self) -> String {
        match &self.id {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Partition of the uploaded rows computed by the preview endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PreviewReport {
    #[serde(default)]
    pub valid_updates: Vec<UpdateRecord>,
    #[serde(default)]
    pub invalid_rows: Vec<InvalidRow>,
}

impl PreviewReport {
    pub fn has_invalid_rows(&self) -> bool {
        !self.invalid_rows.is_empty()
    }
}

/// Final counts returned by the execute endpoint
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub updated_count: u64,
    pub skipped_count: u64,
    #[serde(default)]
    pub message: String,
}

/// Query parameters for the template download
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateRequest {
    pub table: TableId,
    pub identifier_column: String,
    pub update_columns: Vec<String>,
}

impl TemplateRequest {
    /// Query pairs in the order the backend documents them.
    ///
    /// `update_columns` travels as a JSON array string.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let columns = serde_json::to_string(&self.update_columns).unwrap_or_else(|_| "[]".into());
        vec![
            ("table_name", self.table.as_str().to_string()),
            ("identifier_column", self.identifier_column.clone()),
            ("update_columns", columns),
        ]
    }
}

/// A spreadsheet picked by the operator
#[derive(Clone, PartialEq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Multipart fields for the preview endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRequest {
    pub table: TableId,
    pub identifier_column: String,
    pub file: UploadFile,
}

/// JSON body for the execute endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecuteRequest {
    pub table_name: TableId,
    pub identifier_column: String,
    pub updates: Vec<UpdateRecord>,
}

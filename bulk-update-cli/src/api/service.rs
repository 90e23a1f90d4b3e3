//! Seam between the wizard and the backend

use async_trait::async_trait;

use super::error::ApiError;
use super::models::{
    ExecuteRequest, ExecutionReport, PreviewReport, PreviewRequest, TableId, TemplateRequest,
};

/// The four server collaborators of the bulk update flow
#[async_trait]
pub trait BulkUpdateService: Send + Sync {
    /// Column names of `table`, in schema order
    async fn table_schema(&self, table: TableId) -> Result<Vec<String>, ApiError>;

    /// Spreadsheet scaffold with the identifier and update columns as headers
    async fn download_template(&self, request: &TemplateRequest) -> Result<Vec<u8>, ApiError>;

    /// Match uploaded rows against existing records
    async fn preview_upload(&self, request: &PreviewRequest) -> Result<PreviewReport, ApiError>;

    /// Apply the matched updates
    async fn execute(&self, request: &ExecuteRequest) -> Result<ExecutionReport, ApiError>;
}

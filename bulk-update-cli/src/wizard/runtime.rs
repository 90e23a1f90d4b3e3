//! Drives the wizard against a [`BulkUpdateService`]
//!
//! Each dispatched message runs through [`update`]; the returned command is
//! awaited and its outcome fed back as the next message. Only one request is
//! ever in flight.

use log::debug;
use std::path::{Path, PathBuf};

use crate::api::error::ApiError;
use crate::api::{BulkUpdateService, TableId, TemplateRequest};

use super::app::{init, update};
use super::command::Command;
use super::msg::Msg;
use super::state::WizardState;

pub struct WizardRuntime<S> {
    state: WizardState,
    pending: Command,
    service: S,
    download_dir: PathBuf,
}

impl<S: BulkUpdateService> WizardRuntime<S> {
    /// Build a runtime for `table`. Nothing is requested until [`start`](Self::start).
    pub fn new(service: S, table: TableId, download_dir: impl Into<PathBuf>) -> Self {
        let (state, pending) = init(table);
        Self {
            state,
            pending,
            service,
            download_dir: download_dir.into(),
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    #[cfg(test)]
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Run the initial schema fetch
    pub async fn start(&mut self) {
        let command = std::mem::replace(&mut self.pending, Command::None);
        self.run(command).await;
    }

    /// Apply an operator action and everything it triggers
    pub async fn dispatch(&mut self, msg: Msg) {
        let command = update(&mut self.state, msg);
        self.run(command).await;
    }

    async fn run(&mut self, mut command: Command) {
        while let Some(result) = self.perform(command).await {
            command = update(&mut self.state, result);
        }
    }

    /// Carry out one command, returning the message describing its outcome
    async fn perform(&self, command: Command) -> Option<Msg> {
        let msg = match command {
            Command::None => return None,
            Command::FetchSchema(table) => {
                let result = self.service.table_schema(table).await;
                Msg::SchemaLoaded(table, result.map_err(describe))
            }
            Command::DownloadTemplate(request) => {
                Msg::TemplateDownloaded(self.download_template(&request).await)
            }
            Command::PreviewUpload(request) => {
                let result = self.service.preview_upload(&request).await;
                Msg::PreviewLoaded(result.map_err(describe))
            }
            Command::Execute(request) => {
                debug!("Executing {} updates on {}", request.updates.len(), request.table_name);
                let result = self.service.execute(&request).await;
                Msg::ExecutionFinished(result.map_err(describe))
            }
        };
        Some(msg)
    }

    async fn download_template(&self, request: &TemplateRequest) -> Result<PathBuf, String> {
        let bytes = self
            .service
            .download_template(request)
            .await
            .map_err(describe)?;
        save_template(&self.download_dir, request.table, &bytes).await
    }
}

/// Message the wizard shows for a failed request
fn describe(error: ApiError) -> String {
    match error.status() {
        Some(status) => debug!("Backend answered {}: {}", status, error),
        None => debug!("Request did not complete: {}", error),
    }
    error.to_string()
}

/// Write template bytes as `bulk_update_{table}_template.xlsx` inside `dir`
pub async fn save_template(dir: &Path, table: TableId, bytes: &[u8]) -> Result<PathBuf, String> {
    let path = dir.join(table.template_file_name());
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| format!("Could not create {}: {}", dir.display(), e))?;
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| format!("Could not save {}: {}", path.display(), e))?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::InvalidRow;
    use crate::api::{ExecuteRequest, ExecutionReport, PreviewReport, PreviewRequest, UploadFile};
    use crate::wizard::types::{ErrorKind, WizardStep};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory backend recording every call
    #[derive(Default)]
    pub struct FakeService {
        pub schemas: HashMap<TableId, Vec<String>>,
        pub preview: Option<PreviewReport>,
        pub execution: Option<ExecutionReport>,
        pub fail_preview: Option<String>,
        pub fail_execute: Option<String>,
        pub calls: Mutex<Vec<String>>,
        pub executed: Mutex<Vec<ExecuteRequest>>,
    }

    impl FakeService {
        fn log(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn http_error(message: &str) -> ApiError {
        ApiError::Http {
            status: 500,
            message: message.to_string(),
        }
    }

    #[async_trait]
    impl BulkUpdateService for FakeService {
        async fn table_schema(&self, table: TableId) -> Result<Vec<String>, ApiError> {
            self.log(format!("schema:{}", table));
            self.schemas
                .get(&table)
                .cloned()
                .ok_or_else(|| http_error("Could not fetch table schema."))
        }

        async fn download_template(&self, request: &TemplateRequest) -> Result<Vec<u8>, ApiError> {
            self.log(format!("template:{}", request.update_columns.join(",")));
            Ok(b"PK-template".to_vec())
        }

        async fn preview_upload(&self, request: &PreviewRequest) -> Result<PreviewReport, ApiError> {
            self.log(format!("preview:{}", request.file.name));
            if let Some(message) = &self.fail_preview {
                return Err(http_error(message));
            }
            Ok(self.preview.clone().unwrap_or_default())
        }

        async fn execute(&self, request: &ExecuteRequest) -> Result<ExecutionReport, ApiError> {
            self.log(format!("execute:{}", request.updates.len()));
            self.executed.lock().unwrap().push(request.clone());
            if let Some(message) = &self.fail_execute {
                return Err(http_error(message));
            }
            Ok(self.execution.clone().unwrap_or_default())
        }
    }

    fn students_service() -> FakeService {
        let mut service = FakeService::default();
        service.schemas.insert(
            TableId::StudentsDetailsMaster,
            vec!["master_id".into(), "name".into(), "email".into()],
        );
        service.preview = Some(PreviewReport {
            valid_updates: vec![
                json!({"id": "1", "updates": {"email": "a@b.com"}})
                    .as_object()
                    .cloned()
                    .unwrap(),
                json!({"id": "2", "updates": {"email": "c@d.com"}})
                    .as_object()
                    .cloned()
                    .unwrap(),
            ],
            invalid_rows: vec![InvalidRow {
                id: json!("X99"),
                reason: Some("Not found in database".into()),
            }],
        });
        service.execution = Some(ExecutionReport {
            updated_count: 2,
            skipped_count: 1,
            message: "Done".into(),
        });
        service
    }

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("bulk-update-cli-{}-{}", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_full_flow_against_fake_service() {
        let dir = temp_dir("flow");
        let mut runtime =
            WizardRuntime::new(students_service(), TableId::StudentsDetailsMaster, &dir);
        runtime.start().await;
        assert_eq!(runtime.state().identifier_column, "master_id");
        assert!(!runtime.state().loading);

        runtime.dispatch(Msg::ToggleUpdateColumn("email".into())).await;
        runtime.dispatch(Msg::DownloadTemplate).await;
        let template = runtime.state().template_path.clone().unwrap();
        assert_eq!(
            template.file_name().unwrap(),
            "bulk_update_students_details_master_template.xlsx"
        );
        assert_eq!(std::fs::read(&template).unwrap(), b"PK-template");

        runtime.dispatch(Msg::Next).await;
        runtime
            .dispatch(Msg::FileChosen(UploadFile::new("filled.xlsx", vec![0u8; 4])))
            .await;
        runtime.dispatch(Msg::PreviewChanges).await;
        assert_eq!(runtime.state().step, WizardStep::Review);

        runtime.dispatch(Msg::Execute).await;
        assert_eq!(runtime.state().step, WizardStep::Review);
        assert!(runtime.service().executed.lock().unwrap().is_empty());

        runtime.dispatch(Msg::SetProceedWithErrors(true)).await;
        runtime.dispatch(Msg::Execute).await;
        assert_eq!(runtime.state().step, WizardStep::Done);
        assert_eq!(runtime.state().execution.as_ref().unwrap().updated_count, 2);

        let executed = runtime.service().executed.lock().unwrap().clone();
        assert_eq!(executed.len(), 1);
        assert_eq!(executed[0].updates, runtime.state().preview.as_ref().unwrap().valid_updates);

        runtime.dispatch(Msg::Reset).await;
        assert_eq!(runtime.state().step, WizardStep::Configure);
        assert_eq!(runtime.state().columns.len(), 3);

        assert_eq!(
            runtime.service().calls(),
            vec![
                "schema:students_details_master",
                "template:email",
                "preview:filled.xlsx",
                "execute:2",
                "schema:students_details_master",
            ]
        );
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_schema_failure_surfaces_error() {
        let mut runtime = WizardRuntime::new(
            students_service(),
            TableId::StudentFeeTransactions,
            temp_dir("schema"),
        );
        runtime.start().await;

        let state = runtime.state();
        assert!(state.columns.is_empty());
        assert!(!state.loading);
        assert_eq!(state.error.as_ref().unwrap().kind, ErrorKind::SchemaFetch);
    }

    #[tokio::test]
    async fn test_preview_failure_stays_on_upload() {
        let mut service = students_service();
        service.fail_preview = Some("Error processing file: bad zip".into());
        let mut runtime =
            WizardRuntime::new(service, TableId::StudentsDetailsMaster, temp_dir("preview"));
        runtime.start().await;
        runtime.dispatch(Msg::ToggleUpdateColumn("name".into())).await;
        runtime.dispatch(Msg::Next).await;
        runtime
            .dispatch(Msg::FileChosen(UploadFile::new("broken.xlsx", vec![])))
            .await;
        runtime.dispatch(Msg::PreviewChanges).await;

        let state = runtime.state();
        assert_eq!(state.step, WizardStep::Upload);
        assert_eq!(
            state.error.as_ref().unwrap().to_string(),
            "Upload failed: Error processing file: bad zip"
        );
    }

    #[tokio::test]
    async fn test_execute_failure_allows_manual_retry() {
        let mut service = students_service();
        service.fail_execute = Some("Database error during update".into());
        let mut runtime =
            WizardRuntime::new(service, TableId::StudentsDetailsMaster, temp_dir("execute"));
        runtime.start().await;
        runtime.dispatch(Msg::ToggleUpdateColumn("email".into())).await;
        runtime.dispatch(Msg::Next).await;
        runtime
            .dispatch(Msg::FileChosen(UploadFile::new("filled.xlsx", vec![])))
            .await;
        runtime.dispatch(Msg::PreviewChanges).await;
        runtime.dispatch(Msg::SetProceedWithErrors(true)).await;
        runtime.dispatch(Msg::Execute).await;

        assert_eq!(runtime.state().step, WizardStep::Review);
        assert_eq!(runtime.state().error.as_ref().unwrap().kind, ErrorKind::Execution);
        // No automatic retry
        assert_eq!(runtime.service().executed.lock().unwrap().len(), 1);

        runtime.dispatch(Msg::Execute).await;
        assert_eq!(runtime.service().executed.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_save_template_names_file_after_table() {
        let dir = temp_dir("save");
        let path = save_template(&dir, TableId::StudentFeeTransactions, b"xlsx")
            .await
            .unwrap();
        assert_eq!(path, dir.join("bulk_update_student_fee_transactions_template.xlsx"));
        let _ = std::fs::remove_dir_all(dir);
    }
}

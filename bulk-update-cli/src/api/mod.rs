//! Bulk update REST API
//!
//! Wire types, the service trait the wizard talks to, and the reqwest-backed
//! client implementing it against the analytics backend.

pub mod client;
pub mod error;
pub mod models;
pub mod service;

pub use client::BulkUpdateClient;
pub use models::{
    ExecuteRequest, ExecutionReport, PreviewReport, PreviewRequest, TableId,
    TemplateRequest, UpdateRecord, UploadFile,
};
pub use service::BulkUpdateService;

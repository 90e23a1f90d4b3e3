//! Spreadsheet helpers for the bulk update flow

pub mod report;
pub mod template;
pub mod upload;

pub use report::{ReviewExport, export_review};
pub use template::write_template;
pub use upload::{UploadSummary, inspect_upload};

//! Side effects requested by a transition

use crate::api::{ExecuteRequest, PreviewRequest, TableId, TemplateRequest};

/// Work the runtime performs after [`update`](super::app::update) returns.
///
/// At most one request is issued per transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    None,
    FetchSchema(TableId),
    /// Fetch the template and save it to disk
    DownloadTemplate(TemplateRequest),
    PreviewUpload(PreviewRequest),
    Execute(ExecuteRequest),
}

#[cfg(test)]
impl Command {
    pub fn is_none(&self) -> bool {
        matches!(self, Command::None)
    }
}

//! Step and error types for the bulk update wizard

use std::fmt;

/// The four stages of the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WizardStep {
    #[default]
    Configure,
    Upload,
    Review,
    Done,
}

impl WizardStep {
    pub fn number(&self) -> u8 {
        match self {
            Self::Configure => 1,
            Self::Upload => 2,
            Self::Review => 3,
            Self::Done => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Configure => "Configure and Download Template",
            Self::Upload => "Upload Completed File",
            Self::Review => "Review and Confirm Changes",
            Self::Done => "Update Complete",
        }
    }

    /// Step reached by the Back button, if any
    pub fn prev(&self) -> Option<Self> {
        match self {
            Self::Configure => None,
            Self::Upload => Some(Self::Configure),
            Self::Review => Some(Self::Upload),
            // Only a reset leaves Done
            Self::Done => None,
        }
    }
}

/// Which request a [`WizardError`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SchemaFetch,
    TemplateGen,
    PreviewUpload,
    Execution,
    /// Action attempted while its precondition does not hold
    Validation,
}

impl ErrorKind {
    fn prefix(&self) -> &'static str {
        match self {
            Self::SchemaFetch => "Failed to fetch schema: ",
            Self::TemplateGen => "Failed to download template: ",
            Self::PreviewUpload => "Upload failed: ",
            Self::Execution => "Execution failed: ",
            Self::Validation => "",
        }
    }
}

/// Dismissable error banner content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardError {
    pub kind: ErrorKind,
    pub message: String,
}

impl WizardError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for WizardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.message)
    }
}

impl std::error::Error for WizardError {}

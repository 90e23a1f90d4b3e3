//! Bulk Update Wizard
//!
//! Walks an operator through updating many records of one table at once:
//!
//! 1. Configure - pick the table, identifier column and columns to update,
//!    optionally download a fill-in template
//! 2. Upload - choose the completed spreadsheet
//! 3. Review - inspect the server's valid/invalid partition; unmatched
//!    identifiers must be acknowledged before execution
//! 4. Done - final updated/skipped counts
//!
//! Every step's data comes from the server; the wizard itself persists nothing.

pub mod app;
pub mod command;
pub mod msg;
pub mod runtime;
pub mod state;
pub mod types;

pub use msg::Msg;
pub use runtime::WizardRuntime;
pub use state::WizardState;
pub use types::{WizardError, WizardStep};

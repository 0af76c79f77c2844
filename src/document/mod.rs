pub mod document;
pub mod validation;

pub use crate::types::identifiers::{DocId, UserId};
pub use document::{Document, ValidationStage, ValidationState};
pub use validation::demote_on_delete;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::carrier::CarrierRef;
use crate::types::identifiers::{DocId, NoteId};

pub type CoreResult<T> = Result<T, CoreError>;

/// Every failure the core can surface. None of them is retried by the core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Invalid span: {0}")]
    InvalidSpan(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Unknown note {0}")]
    UnknownNote(NoteId),

    #[error("Note {note} is already attached to {carrier}; update the set instead")]
    DuplicateAttachment { carrier: CarrierRef, note: NoteId },

    #[error("Malformed content: {0}")]
    MalformedContent(String),

    #[error("Access forbidden: {0}")]
    Forbidden(String),

    #[error("No reference transcription for {0}")]
    ReferenceNotFound(DocId),

    #[error("Target not found: {0}")]
    TargetNotFound(String),

    #[error("Document {0} is closed")]
    DocumentClosed(DocId),

    #[error("Unknown document {0}")]
    UnknownDocument(DocId),

    /// Storage-level failure while committing a unit of work.
    #[error("Conflict: {0}")]
    Conflict(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidSpan,
    InvalidGeometry,
    UnknownNote,
    DuplicateAttachment,
    MalformedContent,
    Forbidden,
    ReferenceNotFound,
    TargetNotFound,
    DocumentClosed,
    UnknownDocument,
    ConflictError,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidSpan(_) => ErrorKind::InvalidSpan,
            CoreError::InvalidGeometry(_) => ErrorKind::InvalidGeometry,
            CoreError::UnknownNote(_) => ErrorKind::UnknownNote,
            CoreError::DuplicateAttachment { .. } => ErrorKind::DuplicateAttachment,
            CoreError::MalformedContent(_) => ErrorKind::MalformedContent,
            CoreError::Forbidden(_) => ErrorKind::Forbidden,
            CoreError::ReferenceNotFound(_) => ErrorKind::ReferenceNotFound,
            CoreError::TargetNotFound(_) => ErrorKind::TargetNotFound,
            CoreError::DocumentClosed(_) => ErrorKind::DocumentClosed,
            CoreError::UnknownDocument(_) => ErrorKind::UnknownDocument,
            CoreError::Conflict(_) => ErrorKind::ConflictError,
        }
    }

    pub(crate) fn forbidden(details: impl Into<String>) -> Self {
        CoreError::Forbidden(details.into())
    }

    pub(crate) fn target_not_found(what: impl Into<String>) -> Self {
        CoreError::TargetNotFound(what.into())
    }
}

/// Structured `{kind, message}` error handed to the response-formatting layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&CoreError> for ErrorPayload {
    fn from(err: &CoreError) -> Self {
        ErrorPayload {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for ErrorPayload {
    fn from(err: CoreError) -> Self {
        ErrorPayload::from(&err)
    }
}

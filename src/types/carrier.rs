use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::identifiers::{TranscriptionId, TranslationId};

/// Every kind of artifact that can reference a note.
///
/// Note liveness is computed over `CarrierKind::ALL`; a new carrier kind must be listed here
/// and handled in `Tables::note_references` and `Tables::reference_counts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarrierKind {
    Transcription,
    Translation,
    Discourse,
}

impl CarrierKind {
    pub const ALL: [CarrierKind; 3] = [
        CarrierKind::Transcription,
        CarrierKind::Translation,
        CarrierKind::Discourse,
    ];
}

/// The two text bodies a user can write for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    Transcription,
    Translation,
}

impl TextKind {
    pub fn carrier_kind(self) -> CarrierKind {
        match self {
            TextKind::Transcription => CarrierKind::Transcription,
            TextKind::Translation => CarrierKind::Translation,
        }
    }
}

impl fmt::Display for TextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextKind::Transcription => f.write_str("transcription"),
            TextKind::Translation => f.write_str("translation"),
        }
    }
}

/// A text carrier that notes attach to through an attachment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CarrierRef {
    Transcription(TranscriptionId),
    Translation(TranslationId),
}

impl CarrierRef {
    pub fn kind(self) -> CarrierKind {
        match self {
            CarrierRef::Transcription(_) => CarrierKind::Transcription,
            CarrierRef::Translation(_) => CarrierKind::Translation,
        }
    }
}

impl fmt::Display for CarrierRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CarrierRef::Transcription(id) => id.fmt(f),
            CarrierRef::Translation(id) => id.fmt(f),
        }
    }
}

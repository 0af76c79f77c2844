use serde::{Deserialize, Serialize};

use crate::geometry::ImageRef;
use crate::span::Span;
use crate::types::identifiers::{
    DocId, NoteId, TextVersion, TranscriptionId, TranslationId, UserId, ZoneId,
};

/// A user's transcription or translation of a document. One per `(doc_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text<I> {
    pub id: I,
    pub doc_id: DocId,
    pub user_id: UserId,
    pub content: String,
    pub version: TextVersion,
}

pub type Transcription = Text<TranscriptionId>;
pub type Translation = Text<TranslationId>;

impl<I> Text<I> {
    pub(crate) fn new(id: I, doc_id: DocId, user_id: UserId, content: String) -> Self {
        let version = TextVersion::from_content(content.as_bytes());
        Self {
            id,
            doc_id,
            user_id,
            content,
            version,
        }
    }

    pub(crate) fn set_content(&mut self, content: String) {
        self.version = TextVersion::from_content(content.as_bytes());
        self.content = content;
    }

    /// Length in characters, the unit spans are expressed in.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub user_id: UserId,
    pub type_id: u32,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationEdge {
    pub transcription_id: TranscriptionId,
    pub translation_id: TranslationId,
    pub transcription_span: Span,
    pub translation_span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscourseEdge {
    pub transcription_id: TranscriptionId,
    pub user_id: UserId,
    pub speech_part_type: u32,
    pub span: Span,
    pub note_id: Option<NoteId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEdge {
    pub transcription_id: TranscriptionId,
    pub user_id: UserId,
    pub image: ImageRef,
    pub zone_id: ZoneId,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneType {
    /// Zone bound to a transcription segment through an image alignment.
    Transcription,
    /// Free annotation carrying its own inline note.
    Annotation,
}

/// Scope in which zone ids are allocated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneScope {
    pub image: ImageRef,
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageZone {
    pub image: ImageRef,
    pub zone_id: ZoneId,
    pub user_id: UserId,
    pub zone_type: ZoneType,
    pub coords: Vec<i64>,
    pub note: Option<String>,
}

impl ImageZone {
    pub fn scope(&self) -> ZoneScope {
        ZoneScope {
            image: self.image.clone(),
            user_id: self.user_id,
        }
    }
}

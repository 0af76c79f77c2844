//! Reference readings: the author's carriers, once validated.
//!
//! Discourse and image alignments carry no validation flag of their own; they are reference
//! material because they hang off the reference transcription and its author.

use crate::access::UserDirectory;
use crate::alignment::Editions;
use crate::document::DocId;
use crate::notes::{notes_of, AttachedNote};
use crate::store::{
    DiscourseEdge, ImageEdge, Tables, Text, TextId, Transcription, Translation, TranslationEdge,
};
use crate::types::carrier::TextKind;
use crate::types::errors::CoreResult;
use crate::types::identifiers::{TranscriptionId, TranslationId};

/// The author's reading of `I`, if the document's stage has reached its threshold.
pub(crate) fn reference_text<I: TextId>(tables: &Tables, doc_id: DocId) -> CoreResult<Option<&Text<I>>> {
    let doc = tables.document(doc_id)?;
    if !doc.stage.is_validated(I::KIND) {
        return Ok(None);
    }
    Ok(tables.text_of::<I>(doc_id, doc.owner))
}

fn reference_notes_of<I: TextId>(tables: &Tables, doc_id: DocId) -> CoreResult<Vec<AttachedNote>> {
    Ok(reference_text::<I>(tables, doc_id)?
        .map(|text| notes_of(tables, text.id.carrier()))
        .unwrap_or_default())
}

impl<U: UserDirectory> Editions<U> {
    pub fn reference_transcription(&self, doc: DocId) -> CoreResult<Option<Transcription>> {
        self.store
            .read(|tables| Ok(reference_text::<TranscriptionId>(tables, doc)?.cloned()))
    }

    pub fn reference_translation(&self, doc: DocId) -> CoreResult<Option<Translation>> {
        self.store
            .read(|tables| Ok(reference_text::<TranslationId>(tables, doc)?.cloned()))
    }

    /// Edges between the reference transcription and the reference translation.
    pub fn reference_translation_alignment(&self, doc: DocId) -> CoreResult<Vec<TranslationEdge>> {
        self.store.read(|tables| {
            let source = reference_text::<TranscriptionId>(tables, doc)?;
            let target = reference_text::<TranslationId>(tables, doc)?;
            let (Some(source), Some(target)) = (source, target) else {
                return Ok(Vec::new());
            };
            Ok(tables
                .translation_edges
                .iter()
                .filter(|e| e.transcription_id == source.id && e.translation_id == target.id)
                .cloned()
                .collect())
        })
    }

    pub fn reference_discourse_alignment(&self, doc: DocId) -> CoreResult<Vec<DiscourseEdge>> {
        self.store.read(|tables| {
            let Some(source) = reference_text::<TranscriptionId>(tables, doc)? else {
                return Ok(Vec::new());
            };
            Ok(tables
                .discourse_edges
                .iter()
                .filter(|e| e.transcription_id == source.id && e.user_id == source.user_id)
                .cloned()
                .collect())
        })
    }

    pub fn reference_image_alignment(&self, doc: DocId) -> CoreResult<Vec<ImageEdge>> {
        self.store.read(|tables| {
            let Some(source) = reference_text::<TranscriptionId>(tables, doc)? else {
                return Ok(Vec::new());
            };
            Ok(tables
                .image_edges
                .iter()
                .filter(|e| e.transcription_id == source.id && e.user_id == source.user_id)
                .cloned()
                .collect())
        })
    }

    /// Notes of the reference reading of `kind`; empty while it is not validated.
    pub fn reference_notes(&self, doc: DocId, kind: TextKind) -> CoreResult<Vec<AttachedNote>> {
        self.store.read(|tables| match kind {
            TextKind::Transcription => reference_notes_of::<TranscriptionId>(tables, doc),
            TextKind::Translation => reference_notes_of::<TranslationId>(tables, doc),
        })
    }
}

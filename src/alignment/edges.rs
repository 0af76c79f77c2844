use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::access::{check_stage_gate, TargetUser, UserDirectory};
use crate::alignment::reference::reference_text;
use crate::alignment::{open_document, Editions};
use crate::document::DocId;
use crate::geometry::ImageRef;
use crate::notes::{NoteRef, NoteRegistry};
use crate::span::Span;
use crate::store::{DiscourseEdge, ImageEdge, Tables, TranslationEdge, ZoneScope};
use crate::types::actor::Actor;
use crate::types::carrier::TextKind;
use crate::types::errors::{CoreError, CoreResult};
use crate::types::identifiers::{NoteId, TranscriptionId, TranslationId, ZoneId};

/// One segment of a discourse alignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechPartInput {
    pub type_id: u32,
    #[serde(rename = "ptr_start")]
    pub start: i64,
    #[serde(rename = "ptr_end")]
    pub end: i64,
    #[serde(default)]
    pub note: Option<NoteRef>,
}

impl SpeechPartInput {
    pub fn new(type_id: u32, start: i64, end: i64) -> Self {
        Self {
            type_id,
            start,
            end,
            note: None,
        }
    }

    pub fn with_note(mut self, note: NoteRef) -> Self {
        self.note = Some(note);
        self
    }
}

/// Reference transcription of a document, with its length in characters.
fn reference_source(tables: &Tables, doc_id: DocId) -> CoreResult<(TranscriptionId, usize)> {
    reference_text::<TranscriptionId>(tables, doc_id)?
        .map(|t| (t.id, t.char_len()))
        .ok_or(CoreError::ReferenceNotFound(doc_id))
}

fn checked_span(start: i64, end: i64, len: usize) -> CoreResult<Span> {
    let span = Span::new(start, end)?;
    span.check_within(len)?;
    Ok(span)
}

impl<U: UserDirectory> Editions<U> {
    /// Replaces the alignment between the reference transcription and the target's translation.
    ///
    /// Each edge is `(transcription start, transcription end, translation start, translation end)`.
    pub fn align_transcription_translation(
        &self,
        doc_id: DocId,
        actor: &Actor,
        target: &TargetUser,
        edges: &[(i64, i64, i64, i64)],
    ) -> CoreResult<Vec<TranslationEdge>> {
        let user = self.target(actor, target)?;
        let now = Utc::now();

        let written = self.store.write(|tables| {
            check_stage_gate(actor, open_document(tables, doc_id, now)?, TextKind::Translation)?;
            let (source, source_len) = reference_source(tables, doc_id)?;
            let (translation, translation_len) = tables
                .text_of::<TranslationId>(doc_id, user)
                .map(|t| (t.id, t.char_len()))
                .ok_or_else(|| {
                    CoreError::target_not_found(format!("translation of {user} on {doc_id}"))
                })?;

            tables
                .translation_edges
                .retain(|e| !(e.transcription_id == source && e.translation_id == translation));

            let mut written = Vec::with_capacity(edges.len());
            for &(src_start, src_end, dst_start, dst_end) in edges {
                let edge = TranslationEdge {
                    transcription_id: source,
                    translation_id: translation,
                    transcription_span: checked_span(src_start, src_end, source_len)?,
                    translation_span: checked_span(dst_start, dst_end, translation_len)?,
                };
                tables.translation_edges.push(edge.clone());
                written.push(edge);
            }
            Ok(written)
        })?;

        info!(doc = %doc_id, %user, edges = written.len(), "translation alignment replaced");
        Ok(written)
    }

    /// Replaces the target's discourse segmentation of the reference transcription.
    ///
    /// Notes held by the previous segments are released once the new set is in place.
    pub fn align_discourse(
        &self,
        doc_id: DocId,
        actor: &Actor,
        target: &TargetUser,
        parts: Vec<SpeechPartInput>,
    ) -> CoreResult<Vec<DiscourseEdge>> {
        let user = self.target(actor, target)?;
        let now = Utc::now();
        let allowed = &self.config.speech_part_types;

        let written = self.store.write(|tables| {
            open_document(tables, doc_id, now)?;
            let (source, source_len) = reference_source(tables, doc_id)?;

            let mut released: Vec<NoteId> = Vec::new();
            tables.discourse_edges.retain(|e| {
                if e.transcription_id == source && e.user_id == user {
                    released.extend(e.note_id);
                    return false;
                }
                true
            });

            let mut written = Vec::with_capacity(parts.len());
            for part in &parts {
                if !allowed.is_empty() && !allowed.contains(&part.type_id) {
                    return Err(CoreError::target_not_found(format!(
                        "speech part type {}",
                        part.type_id
                    )));
                }
                let span = checked_span(part.start, part.end, source_len)?;
                let note_id = match &part.note {
                    Some(note) => Some(NoteRegistry::new(tables, &self.config).create_or_reuse(note, user)?),
                    None => None,
                };
                let edge = DiscourseEdge {
                    transcription_id: source,
                    user_id: user,
                    speech_part_type: part.type_id,
                    span,
                    note_id,
                };
                tables.discourse_edges.push(edge.clone());
                written.push(edge);
            }

            let mut registry = NoteRegistry::new(tables, &self.config);
            let swept = released
                .into_iter()
                .filter(|note| registry.delete_if_unused(*note))
                .count();
            debug!(swept, "discourse notes released");
            Ok(written)
        })?;

        info!(doc = %doc_id, %user, parts = written.len(), "discourse alignment replaced");
        Ok(written)
    }

    /// Replaces the target's alignment between the reference transcription and zones of `image`.
    ///
    /// Each item is `(zone id, start, end)`; the zone must exist among the target's zones.
    pub fn align_image(
        &self,
        doc_id: DocId,
        actor: &Actor,
        target: &TargetUser,
        image: &ImageRef,
        items: &[(ZoneId, i64, i64)],
    ) -> CoreResult<Vec<ImageEdge>> {
        let user = self.target(actor, target)?;
        let now = Utc::now();
        let scope = ZoneScope {
            image: image.clone(),
            user_id: user,
        };

        let written = self.store.write(|tables| {
            open_document(tables, doc_id, now)?;
            let (source, source_len) = reference_source(tables, doc_id)?;

            tables.image_edges.retain(|e| {
                !(e.transcription_id == source && e.user_id == user && e.image == *image)
            });

            let mut written = Vec::with_capacity(items.len());
            for &(zone_id, start, end) in items {
                if tables.zone(&scope, zone_id).is_none() {
                    return Err(CoreError::target_not_found(format!(
                        "{zone_id} of {user} on {}",
                        image.manifest_url
                    )));
                }
                let edge = ImageEdge {
                    transcription_id: source,
                    user_id: user,
                    image: image.clone(),
                    zone_id,
                    span: checked_span(start, end, source_len)?,
                };
                tables.image_edges.push(edge.clone());
                written.push(edge);
            }
            Ok(written)
        })?;

        info!(doc = %doc_id, %user, items = written.len(), "image alignment replaced");
        Ok(written)
    }

    /// The target's translation alignment against the reference transcription.
    ///
    /// Empty while there is no reference transcription or no translation.
    pub fn translation_alignment(
        &self,
        doc_id: DocId,
        actor: &Actor,
        target: &TargetUser,
    ) -> CoreResult<Vec<TranslationEdge>> {
        let user = self.target(actor, target)?;
        self.store.read(|tables| {
            let source = reference_text::<TranscriptionId>(tables, doc_id)?;
            let translation = tables.text_of::<TranslationId>(doc_id, user);
            let (Some(source), Some(translation)) = (source, translation) else {
                return Ok(Vec::new());
            };
            Ok(tables
                .translation_edges
                .iter()
                .filter(|e| e.transcription_id == source.id && e.translation_id == translation.id)
                .cloned()
                .collect())
        })
    }

    pub fn discourse_alignment(
        &self,
        doc_id: DocId,
        actor: &Actor,
        target: &TargetUser,
    ) -> CoreResult<Vec<DiscourseEdge>> {
        let user = self.target(actor, target)?;
        self.store.read(|tables| {
            let Some(source) = reference_text::<TranscriptionId>(tables, doc_id)? else {
                return Ok(Vec::new());
            };
            Ok(tables
                .discourse_edges
                .iter()
                .filter(|e| e.transcription_id == source.id && e.user_id == user)
                .cloned()
                .collect())
        })
    }

    pub fn image_alignment(
        &self,
        doc_id: DocId,
        actor: &Actor,
        target: &TargetUser,
        image: &ImageRef,
    ) -> CoreResult<Vec<ImageEdge>> {
        let user = self.target(actor, target)?;
        self.store.read(|tables| {
            let Some(source) = reference_text::<TranscriptionId>(tables, doc_id)? else {
                return Ok(Vec::new());
            };
            Ok(tables
                .image_edges
                .iter()
                .filter(|e| e.transcription_id == source.id && e.user_id == user && e.image == *image)
                .cloned()
                .collect())
        })
    }
}

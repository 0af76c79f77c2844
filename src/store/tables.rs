use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::document::Document;
use crate::span::Span;
use crate::store::records::{
    DiscourseEdge, ImageEdge, ImageZone, Note, Text, TranslationEdge, ZoneScope,
};
use crate::types::carrier::{CarrierKind, CarrierRef, TextKind};
use crate::types::errors::{CoreError, CoreResult};
use crate::types::identifiers::{DocId, NoteId, TranscriptionId, TranslationId, UserId, ZoneId};

#[derive(Debug, Clone, Default)]
pub(crate) struct Sequences {
    transcription: u64,
    translation: u64,
    note: u64,
}

/// Every record the core owns. Mutated only through `Store::write`.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub(crate) documents: BTreeMap<DocId, Document>,
    pub(crate) transcriptions: BTreeMap<TranscriptionId, Text<TranscriptionId>>,
    pub(crate) translations: BTreeMap<TranslationId, Text<TranslationId>>,
    pub(crate) notes: BTreeMap<NoteId, Note>,
    pub(crate) attachments: BTreeMap<(CarrierRef, NoteId), Span>,
    pub(crate) translation_edges: Vec<TranslationEdge>,
    pub(crate) discourse_edges: Vec<DiscourseEdge>,
    pub(crate) image_edges: Vec<ImageEdge>,
    pub(crate) zones: BTreeMap<(ZoneScope, ZoneId), ImageZone>,
    /// Highest zone id ever handed out per scope, so deleted ids are not reused.
    pub(crate) zone_high_water: BTreeMap<ZoneScope, ZoneId>,
    pub(crate) sequences: Sequences,
}

/// Id type of a text table; lets transcription and translation share one code path.
pub trait TextId: Copy + Ord + fmt::Display + fmt::Debug {
    const KIND: TextKind;

    fn carrier(self) -> CarrierRef;
    fn table(tables: &Tables) -> &BTreeMap<Self, Text<Self>>;
    fn table_mut(tables: &mut Tables) -> &mut BTreeMap<Self, Text<Self>>;
    fn allocate(tables: &mut Tables) -> Self;
}

impl TextId for TranscriptionId {
    const KIND: TextKind = TextKind::Transcription;

    fn carrier(self) -> CarrierRef {
        CarrierRef::Transcription(self)
    }

    fn table(tables: &Tables) -> &BTreeMap<Self, Text<Self>> {
        &tables.transcriptions
    }

    fn table_mut(tables: &mut Tables) -> &mut BTreeMap<Self, Text<Self>> {
        &mut tables.transcriptions
    }

    fn allocate(tables: &mut Tables) -> Self {
        tables.sequences.transcription += 1;
        TranscriptionId(tables.sequences.transcription)
    }
}

impl TextId for TranslationId {
    const KIND: TextKind = TextKind::Translation;

    fn carrier(self) -> CarrierRef {
        CarrierRef::Translation(self)
    }

    fn table(tables: &Tables) -> &BTreeMap<Self, Text<Self>> {
        &tables.translations
    }

    fn table_mut(tables: &mut Tables) -> &mut BTreeMap<Self, Text<Self>> {
        &mut tables.translations
    }

    fn allocate(tables: &mut Tables) -> Self {
        tables.sequences.translation += 1;
        TranslationId(tables.sequences.translation)
    }
}

impl Tables {
    pub fn document(&self, id: DocId) -> CoreResult<&Document> {
        self.documents.get(&id).ok_or(CoreError::UnknownDocument(id))
    }

    pub(crate) fn document_mut(&mut self, id: DocId) -> CoreResult<&mut Document> {
        self.documents.get_mut(&id).ok_or(CoreError::UnknownDocument(id))
    }

    /// The reading of `kind` a user wrote for a document, if any.
    pub fn text_of<I: TextId>(&self, doc: DocId, user: UserId) -> Option<&Text<I>> {
        I::table(self)
            .values()
            .find(|text| text.doc_id == doc && text.user_id == user)
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.notes.get(&id)
    }

    pub(crate) fn next_note_id(&mut self) -> NoteId {
        self.sequences.note += 1;
        NoteId(self.sequences.note)
    }

    /// Attachments of one carrier, in note id order.
    pub fn attachments_of(&self, carrier: CarrierRef) -> Vec<(NoteId, Span)> {
        self.attachments
            .iter()
            .filter(|((c, _), _)| *c == carrier)
            .map(|((_, note), span)| (*note, *span))
            .collect()
    }

    /// Number of references to a note, over every carrier kind.
    pub fn note_references(&self, note: NoteId) -> usize {
        CarrierKind::ALL
            .iter()
            .map(|kind| match kind {
                CarrierKind::Transcription | CarrierKind::Translation => self
                    .attachments
                    .keys()
                    .filter(|(c, n)| *n == note && c.kind() == *kind)
                    .count(),
                CarrierKind::Discourse => self
                    .discourse_edges
                    .iter()
                    .filter(|edge| edge.note_id == Some(note))
                    .count(),
            })
            .sum()
    }

    /// References per note, over every carrier kind, without a scan per note.
    pub(crate) fn reference_counts(&self) -> BTreeMap<NoteId, usize> {
        let mut counts = BTreeMap::new();
        for kind in CarrierKind::ALL {
            match kind {
                CarrierKind::Transcription | CarrierKind::Translation => {
                    for (carrier, note) in self.attachments.keys() {
                        if carrier.kind() == kind {
                            *counts.entry(*note).or_insert(0) += 1;
                        }
                    }
                }
                CarrierKind::Discourse => {
                    for note in self.discourse_edges.iter().filter_map(|edge| edge.note_id) {
                        *counts.entry(note).or_insert(0) += 1;
                    }
                }
            }
        }
        counts
    }

    pub fn zones_in<'a>(&'a self, scope: &'a ZoneScope) -> impl Iterator<Item = &'a ImageZone> + 'a {
        self.zones
            .iter()
            .filter(move |((s, _), _)| s == scope)
            .map(|(_, zone)| zone)
    }

    pub fn zone(&self, scope: &ZoneScope, zone_id: ZoneId) -> Option<&ImageZone> {
        self.zones.get(&(scope.clone(), zone_id))
    }

    /// `max(existing, previously allocated) + 1`, starting at 1.
    pub(crate) fn next_zone_id(&mut self, scope: &ZoneScope) -> CoreResult<ZoneId> {
        let existing = self.zones_in(scope).map(|z| z.zone_id).max();
        let high_water = self.zone_high_water.get(scope).copied();
        let next = match existing.max(high_water) {
            None => ZoneId(1),
            Some(last) => last.next().ok_or_else(|| {
                CoreError::Conflict(format!(
                    "no zone id left after {last} on {} for {}",
                    scope.image.manifest_url, scope.user_id
                ))
            })?,
        };
        self.bump_zone_high_water(scope, next);
        Ok(next)
    }

    pub(crate) fn bump_zone_high_water(&mut self, scope: &ZoneScope, zone_id: ZoneId) {
        let entry = self.zone_high_water.entry(scope.clone()).or_insert(zone_id);
        if *entry < zone_id {
            *entry = zone_id;
        }
    }

    /// Removes every alignment edge keyed on `carrier`.
    ///
    /// Returns the notes the removed discourse edges referenced; the caller sweeps them.
    pub(crate) fn drop_edges_of(&mut self, carrier: CarrierRef) -> Vec<NoteId> {
        match carrier {
            CarrierRef::Transcription(id) => {
                self.translation_edges.retain(|e| e.transcription_id != id);
                self.image_edges.retain(|e| e.transcription_id != id);
                let mut released = Vec::new();
                self.discourse_edges.retain(|e| {
                    if e.transcription_id != id {
                        return true;
                    }
                    released.extend(e.note_id);
                    false
                });
                released
            }
            CarrierRef::Translation(id) => {
                self.translation_edges.retain(|e| e.translation_id != id);
                Vec::new()
            }
        }
    }

    /// Drops image edges whose zone no longer exists.
    pub(crate) fn drop_dangling_image_edges(&mut self) -> usize {
        let before = self.image_edges.len();
        let zones = &self.zones;
        self.image_edges.retain(|e| {
            let scope = ZoneScope {
                image: e.image.clone(),
                user_id: e.user_id,
            };
            zones.contains_key(&(scope, e.zone_id))
        });
        before - self.image_edges.len()
    }

    /// Referential checks run before a unit of work is committed.
    pub(crate) fn check_integrity(&self) -> Result<(), String> {
        for text in self.transcriptions.values() {
            if !self.documents.contains_key(&text.doc_id) {
                return Err(format!("{} belongs to unknown {}", text.id, text.doc_id));
            }
        }
        for text in self.translations.values() {
            if !self.documents.contains_key(&text.doc_id) {
                return Err(format!("{} belongs to unknown {}", text.id, text.doc_id));
            }
        }

        for (carrier, note) in self.attachments.keys() {
            if !self.notes.contains_key(note) {
                return Err(format!("attachment on {carrier} points to missing {note}"));
            }
            let carrier_exists = match carrier {
                CarrierRef::Transcription(id) => self.transcriptions.contains_key(id),
                CarrierRef::Translation(id) => self.translations.contains_key(id),
            };
            if !carrier_exists {
                return Err(format!("{note} is attached to missing {carrier}"));
            }
        }

        let references = self.reference_counts();
        for note in self.notes.keys() {
            if !references.contains_key(note) {
                return Err(format!("{note} has no remaining attachment"));
            }
        }

        for edge in &self.translation_edges {
            if !self.transcriptions.contains_key(&edge.transcription_id)
                || !self.translations.contains_key(&edge.translation_id)
            {
                return Err(format!(
                    "alignment between {} and {} has a missing side",
                    edge.transcription_id, edge.translation_id
                ));
            }
        }

        for edge in &self.discourse_edges {
            if !self.transcriptions.contains_key(&edge.transcription_id) {
                return Err(format!("discourse edge on missing {}", edge.transcription_id));
            }
            if let Some(note) = edge.note_id {
                if !self.notes.contains_key(&note) {
                    return Err(format!("discourse edge points to missing {note}"));
                }
            }
        }

        let mut seen = BTreeSet::new();
        for edge in &self.image_edges {
            if !self.transcriptions.contains_key(&edge.transcription_id) {
                return Err(format!("image edge on missing {}", edge.transcription_id));
            }
            let scope = ZoneScope {
                image: edge.image.clone(),
                user_id: edge.user_id,
            };
            if self.zone(&scope, edge.zone_id).is_none() {
                return Err(format!("image edge points to missing {}", edge.zone_id));
            }
            if !seen.insert((edge.transcription_id, scope, edge.zone_id, edge.span)) {
                return Err(format!("duplicate image edge on {}", edge.zone_id));
            }
        }

        Ok(())
    }
}

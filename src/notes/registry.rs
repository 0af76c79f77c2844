use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CoreConfig;
use crate::notes::content::check_content;
use crate::span::Span;
use crate::store::records::Note;
use crate::store::tables::Tables;
use crate::types::carrier::CarrierRef;
use crate::types::errors::{CoreError, CoreResult};
use crate::types::identifiers::{NoteId, UserId};

/// How a write designates its note: an existing one to share, or new content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteRef {
    ById(NoteId),
    Inline { type_id: u32, content: String },
}

/// One note of a carrier's note set, as sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteItem {
    #[serde(default)]
    pub id: Option<NoteId>,
    #[serde(default)]
    pub type_id: Option<u32>,
    pub content: String,
    #[serde(flatten)]
    pub span: Span,
}

impl NoteItem {
    pub fn new(content: impl Into<String>, span: Span) -> Self {
        Self {
            id: None,
            type_id: None,
            content: content.into(),
            span,
        }
    }

    pub fn with_id(mut self, id: NoteId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_type(mut self, type_id: u32) -> Self {
        self.type_id = Some(type_id);
        self
    }

    pub fn note_ref(&self, default_type: u32) -> NoteRef {
        match self.id {
            Some(id) => NoteRef::ById(id),
            None => NoteRef::Inline {
                type_id: self.type_id.unwrap_or(default_type),
                content: self.content.clone(),
            },
        }
    }
}

/// A note as seen through one of its attachments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedNote {
    #[serde(flatten)]
    pub note: Note,
    #[serde(flatten)]
    pub span: Span,
}

/// Notes of a carrier, ordered by span then note id.
pub fn notes_of(tables: &Tables, carrier: CarrierRef) -> Vec<AttachedNote> {
    let mut notes: Vec<AttachedNote> = tables
        .attachments_of(carrier)
        .into_iter()
        .filter_map(|(id, span)| {
            tables.note(id).map(|note| AttachedNote {
                note: note.clone(),
                span,
            })
        })
        .collect();
    notes.sort_by(|a, b| a.span.cmp(&b.span).then(a.note.id.cmp(&b.note.id)));
    notes
}

/// Reference-counted note lifecycle over a staged set of tables.
///
/// A note lives as long as at least one carrier of any kind references it.
pub struct NoteRegistry<'a> {
    tables: &'a mut Tables,
    config: &'a CoreConfig,
}

impl<'a> NoteRegistry<'a> {
    pub fn new(tables: &'a mut Tables, config: &'a CoreConfig) -> Self {
        Self { tables, config }
    }

    /// Resolves a `NoteRef`: fetches a shared note or creates a note owned by `owner`.
    pub fn create_or_reuse(&mut self, note_ref: &NoteRef, owner: UserId) -> CoreResult<NoteId> {
        match note_ref {
            NoteRef::ById(id) => {
                if self.tables.note(*id).is_none() {
                    return Err(CoreError::UnknownNote(*id));
                }
                Ok(*id)
            }
            NoteRef::Inline { type_id, content } => {
                check_content(content, self.config)?;
                let id = self.tables.next_note_id();
                self.tables.notes.insert(
                    id,
                    Note {
                        id,
                        user_id: owner,
                        type_id: *type_id,
                        content: content.clone(),
                    },
                );
                debug!(note = %id, %owner, "note created");
                Ok(id)
            }
        }
    }

    pub fn attach(&mut self, carrier: CarrierRef, note: NoteId, span: Span) -> CoreResult<()> {
        if self.tables.note(note).is_none() {
            return Err(CoreError::UnknownNote(note));
        }
        let key = (carrier, note);
        if self.tables.attachments.contains_key(&key) {
            return Err(CoreError::DuplicateAttachment { carrier, note });
        }
        self.tables.attachments.insert(key, span);
        Ok(())
    }

    /// Removes one attachment, then deletes the note if nothing references it anymore.
    ///
    /// Returns whether the note was deleted.
    pub fn detach(&mut self, carrier: CarrierRef, note: NoteId) -> CoreResult<bool> {
        if self.tables.attachments.remove(&(carrier, note)).is_none() {
            return Err(CoreError::target_not_found(format!(
                "attachment of {note} on {carrier}"
            )));
        }
        Ok(self.delete_if_unused(note))
    }

    pub fn delete_if_unused(&mut self, note: NoteId) -> bool {
        if self.tables.note_references(note) > 0 {
            return false;
        }
        let deleted = self.tables.notes.remove(&note).is_some();
        if deleted {
            debug!(%note, "last reference gone, note deleted");
        }
        deleted
    }

    /// Detaches every note of a carrier. Returns how many notes were deleted.
    pub fn detach_all(&mut self, carrier: CarrierRef) -> usize {
        let released: Vec<NoteId> = self
            .tables
            .attachments_of(carrier)
            .into_iter()
            .map(|(note, _)| note)
            .collect();
        for note in &released {
            self.tables.attachments.remove(&(carrier, *note));
        }
        released
            .into_iter()
            .filter(|note| self.delete_if_unused(*note))
            .count()
    }

    /// Makes the carrier's note set equal to `items`.
    ///
    /// Attachments are matched by `(note id, span)`. Unmatched attachments are removed,
    /// unmatched items are attached (sharing the note they name, or creating one), and
    /// notes named by id take the supplied content. Unused notes are swept at the end,
    /// so moving a note to another span keeps it alive.
    pub fn replace_attachment_set(
        &mut self,
        carrier: CarrierRef,
        owner: UserId,
        items: &[NoteItem],
    ) -> CoreResult<Vec<AttachedNote>> {
        self.check_items(carrier, items)?;

        let wanted: BTreeSet<(NoteId, Span)> = items
            .iter()
            .filter_map(|item| item.id.map(|id| (id, item.span)))
            .collect();

        let mut released = Vec::new();
        for (note, span) in self.tables.attachments_of(carrier) {
            if !wanted.contains(&(note, span)) {
                self.tables.attachments.remove(&(carrier, note));
                released.push(note);
            }
        }

        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            let kept = item
                .id
                .filter(|id| self.tables.attachments.get(&(carrier, *id)) == Some(&item.span));
            let id = match kept {
                Some(id) => id,
                None => {
                    let id = self.create_or_reuse(&item.note_ref(self.config.default_note_type), owner)?;
                    self.attach(carrier, id, item.span)?;
                    id
                }
            };
            if item.id.is_some() {
                self.rewrite(id, item)?;
            }
            ids.push(id);
        }

        let swept = released
            .into_iter()
            .filter(|note| self.delete_if_unused(*note))
            .count();
        debug!(%carrier, items = ids.len(), swept, "note set replaced");

        Ok(self.collect(carrier, &ids))
    }

    /// Adds `items` to the carrier's note set, leaving existing attachments alone.
    ///
    /// A note named by id that is already on this carrier fails with `DuplicateAttachment`.
    pub fn append(
        &mut self,
        carrier: CarrierRef,
        owner: UserId,
        items: &[NoteItem],
    ) -> CoreResult<Vec<AttachedNote>> {
        self.check_items(carrier, items)?;

        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            let id = self.create_or_reuse(&item.note_ref(self.config.default_note_type), owner)?;
            self.attach(carrier, id, item.span)?;
            ids.push(id);
        }
        Ok(self.collect(carrier, &ids))
    }

    /// Gives `to` a fresh copy of every note of `from`, owned by `owner`, at the same spans.
    pub fn copy_attachments(
        &mut self,
        from: CarrierRef,
        to: CarrierRef,
        owner: UserId,
    ) -> CoreResult<usize> {
        let sources: Vec<(Note, Span)> = self
            .tables
            .attachments_of(from)
            .into_iter()
            .filter_map(|(id, span)| self.tables.note(id).map(|note| (note.clone(), span)))
            .collect();

        for (note, span) in &sources {
            let copy = self.create_or_reuse(
                &NoteRef::Inline {
                    type_id: note.type_id,
                    content: note.content.clone(),
                },
                owner,
            )?;
            self.attach(to, copy, *span)?;
        }
        Ok(sources.len())
    }

    fn check_items(&self, carrier: CarrierRef, items: &[NoteItem]) -> CoreResult<()> {
        let mut ids = BTreeSet::new();
        for item in items {
            check_content(&item.content, self.config)?;
            if let Some(id) = item.id {
                if !ids.insert(id) {
                    return Err(CoreError::DuplicateAttachment { carrier, note: id });
                }
            }
        }
        Ok(())
    }

    fn rewrite(&mut self, id: NoteId, item: &NoteItem) -> CoreResult<()> {
        let note = self.tables.notes.get_mut(&id).ok_or(CoreError::UnknownNote(id))?;
        note.content = item.content.clone();
        if let Some(type_id) = item.type_id {
            note.type_id = type_id;
        }
        Ok(())
    }

    fn collect(&self, carrier: CarrierRef, ids: &[NoteId]) -> Vec<AttachedNote> {
        ids.iter()
            .filter_map(|id| {
                let span = self.tables.attachments.get(&(carrier, *id))?;
                let note = self.tables.note(*id)?;
                Some(AttachedNote {
                    note: note.clone(),
                    span: *span,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::store::records::Text;
    use crate::store::tables::TextId;
    use crate::types::identifiers::{DocId, TranscriptionId, TranslationId};

    struct Fixture {
        tables: Tables,
        config: CoreConfig,
        transcription: CarrierRef,
        translation: CarrierRef,
    }

    fn fixture() -> Fixture {
        let mut tables = Tables::default();
        tables.documents.insert(DocId(1), Document::new(DocId(1), UserId(1)));
        let t = TranscriptionId::allocate(&mut tables);
        tables
            .transcriptions
            .insert(t, Text::new(t, DocId(1), UserId(1), "in principio erat verbum".into()));
        let r = TranslationId::allocate(&mut tables);
        tables
            .translations
            .insert(r, Text::new(r, DocId(1), UserId(1), "au commencement était le verbe".into()));
        Fixture {
            tables,
            config: CoreConfig::v0(),
            transcription: t.carrier(),
            translation: r.carrier(),
        }
    }

    fn span(start: i64, end: i64) -> Span {
        Span::new(start, end).unwrap()
    }

    #[test]
    fn shared_note_survives_until_its_last_carrier_lets_go() {
        let mut f = fixture();
        let mut registry = NoteRegistry::new(&mut f.tables, &f.config);
        let note = registry
            .create_or_reuse(&NoteRef::Inline { type_id: 1, content: "verbum".into() }, UserId(1))
            .unwrap();
        registry.attach(f.transcription, note, span(19, 25)).unwrap();
        registry.attach(f.translation, note, span(24, 30)).unwrap();

        assert!(!registry.detach(f.transcription, note).unwrap());
        assert!(f.tables.note(note).is_some());
        assert!(f.tables.check_integrity().is_ok());

        let mut registry = NoteRegistry::new(&mut f.tables, &f.config);
        assert!(registry.detach(f.translation, note).unwrap());
        assert!(f.tables.note(note).is_none());
    }

    #[test]
    fn discourse_edges_keep_notes_alive() {
        let mut f = fixture();
        let mut registry = NoteRegistry::new(&mut f.tables, &f.config);
        let note = registry
            .create_or_reuse(&NoteRef::Inline { type_id: 1, content: "incipit".into() }, UserId(1))
            .unwrap();
        registry.attach(f.transcription, note, span(0, 2)).unwrap();
        f.tables.discourse_edges.push(crate::store::records::DiscourseEdge {
            transcription_id: TranscriptionId(1),
            user_id: UserId(1),
            speech_part_type: 3,
            span: span(0, 12),
            note_id: Some(note),
        });

        let mut registry = NoteRegistry::new(&mut f.tables, &f.config);
        assert!(!registry.detach(f.transcription, note).unwrap());
        assert_eq!(f.tables.note_references(note), 1);
    }

    #[test]
    fn reference_counts_agree_with_single_note_counts() {
        let mut f = fixture();
        let mut registry = NoteRegistry::new(&mut f.tables, &f.config);
        let shared = registry
            .create_or_reuse(&NoteRef::Inline { type_id: 1, content: "verbum".into() }, UserId(1))
            .unwrap();
        let single = registry
            .create_or_reuse(&NoteRef::Inline { type_id: 1, content: "erat".into() }, UserId(1))
            .unwrap();
        registry.attach(f.transcription, shared, span(19, 25)).unwrap();
        registry.attach(f.translation, shared, span(24, 30)).unwrap();
        registry.attach(f.transcription, single, span(13, 17)).unwrap();
        f.tables.discourse_edges.push(crate::store::records::DiscourseEdge {
            transcription_id: TranscriptionId(1),
            user_id: UserId(1),
            speech_part_type: 3,
            span: span(13, 25),
            note_id: Some(shared),
        });

        let counts = f.tables.reference_counts();
        assert_eq!(counts.get(&shared), Some(&3));
        assert_eq!(counts.get(&single), Some(&1));
        for note in [shared, single] {
            assert_eq!(counts[&note], f.tables.note_references(note));
        }
        assert!(f.tables.check_integrity().is_ok());

        f.tables.attachments.remove(&(f.transcription, single));
        let err = f.tables.check_integrity().unwrap_err();
        assert!(err.contains(&single.to_string()));
    }

    #[test]
    fn attaching_twice_to_one_carrier_is_refused() {
        let mut f = fixture();
        let mut registry = NoteRegistry::new(&mut f.tables, &f.config);
        let note = registry
            .create_or_reuse(&NoteRef::Inline { type_id: 1, content: "x".into() }, UserId(1))
            .unwrap();
        registry.attach(f.transcription, note, span(0, 2)).unwrap();
        assert_eq!(
            registry.attach(f.transcription, note, span(3, 5)),
            Err(CoreError::DuplicateAttachment { carrier: f.transcription, note })
        );
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut f = fixture();
        let mut registry = NoteRegistry::new(&mut f.tables, &f.config);
        assert_eq!(
            registry.create_or_reuse(&NoteRef::ById(NoteId(42)), UserId(1)),
            Err(CoreError::UnknownNote(NoteId(42)))
        );
        assert!(matches!(
            registry.detach(f.transcription, NoteId(42)),
            Err(CoreError::TargetNotFound(_))
        ));
    }

    #[test]
    fn moving_a_note_to_another_span_keeps_it() {
        let mut f = fixture();
        let mut registry = NoteRegistry::new(&mut f.tables, &f.config);
        let first = registry
            .replace_attachment_set(f.transcription, UserId(1), &[NoteItem::new("gloss", span(0, 2))])
            .unwrap();
        let id = first[0].note.id;

        let moved = registry
            .replace_attachment_set(
                f.transcription,
                UserId(1),
                &[NoteItem::new("gloss, revised", span(3, 12)).with_id(id)],
            )
            .unwrap();

        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].note.id, id);
        assert_eq!(moved[0].note.content, "gloss, revised");
        assert_eq!(moved[0].span, span(3, 12));
        assert!(f.tables.check_integrity().is_ok());
    }

    #[test]
    fn replacing_with_an_empty_set_deletes_unshared_notes() {
        let mut f = fixture();
        let mut registry = NoteRegistry::new(&mut f.tables, &f.config);
        let notes = registry
            .replace_attachment_set(
                f.transcription,
                UserId(1),
                &[NoteItem::new("a", span(0, 1)), NoteItem::new("b", span(1, 2))],
            )
            .unwrap();
        registry.replace_attachment_set(f.transcription, UserId(1), &[]).unwrap();

        for attached in notes {
            assert!(f.tables.note(attached.note.id).is_none());
        }
        assert!(f.tables.notes.is_empty());
    }

    #[test]
    fn note_ids_are_never_reused() {
        let mut f = fixture();
        let mut registry = NoteRegistry::new(&mut f.tables, &f.config);
        let first = registry
            .append(f.transcription, UserId(1), &[NoteItem::new("a", span(0, 1))])
            .unwrap()[0]
            .note
            .id;
        registry.detach(f.transcription, first).unwrap();
        let second = registry
            .append(f.transcription, UserId(1), &[NoteItem::new("b", span(0, 1))])
            .unwrap()[0]
            .note
            .id;
        assert!(second > first);
    }

    #[test]
    fn copies_get_fresh_notes_at_the_same_spans() {
        let mut f = fixture();
        let mut registry = NoteRegistry::new(&mut f.tables, &f.config);
        let source = registry
            .append(f.transcription, UserId(1), &[NoteItem::new("a", span(0, 2)).with_type(4)])
            .unwrap();
        assert_eq!(registry.copy_attachments(f.transcription, f.translation, UserId(2)).unwrap(), 1);

        let copied = notes_of(&f.tables, f.translation);
        assert_eq!(copied.len(), 1);
        assert_ne!(copied[0].note.id, source[0].note.id);
        assert_eq!(copied[0].note.user_id, UserId(2));
        assert_eq!(copied[0].note.type_id, 4);
        assert_eq!(copied[0].span, source[0].span);
    }
}

use chrono::Utc;
use tracing::info;

use crate::access::{check_stage_gate, require_privileged, TargetUser, UserDirectory};
use crate::alignment::{open_document, Editions};
use crate::document::{demote_on_delete, DocId, ValidationState};
use crate::notes::{check_content, notes_of, AttachedNote, NoteItem, NoteRegistry};
use crate::store::{Tables, Text, TextId, Transcription, Translation};
use crate::types::actor::Actor;
use crate::types::carrier::TextKind;
use crate::types::errors::{CoreError, CoreResult};
use crate::types::identifiers::{TranscriptionId, TranslationId, UserId};

/// Every note of a text must still fall inside its content.
fn check_attachments_fit<I: TextId>(tables: &Tables, id: I) -> CoreResult<()> {
    let Some(text) = I::table(tables).get(&id) else {
        return Ok(());
    };
    let len = text.char_len();
    tables
        .attachments_of(id.carrier())
        .iter()
        .try_for_each(|(_, span)| span.check_within(len))
}

fn existing_text<I: TextId>(tables: &Tables, doc_id: DocId, user: UserId) -> CoreResult<I> {
    tables
        .text_of::<I>(doc_id, user)
        .map(|t| t.id)
        .ok_or_else(|| CoreError::target_not_found(format!("{} of {user} on {doc_id}", I::KIND)))
}

fn stored<I: TextId>(tables: &Tables, id: I) -> CoreResult<Text<I>> {
    I::table(tables)
        .get(&id)
        .cloned()
        .ok_or_else(|| CoreError::target_not_found(id.to_string()))
}

impl<U: UserDirectory> Editions<U> {
    /// Creates or overwrites the target's transcription.
    ///
    /// When `notes` is given it becomes the transcription's whole note set.
    pub fn save_transcription(
        &self,
        doc: DocId,
        actor: &Actor,
        target: &TargetUser,
        content: impl Into<String>,
        notes: Option<Vec<NoteItem>>,
    ) -> CoreResult<Transcription> {
        self.save_text::<TranscriptionId>(doc, actor, target, content.into(), notes)
    }

    pub fn save_translation(
        &self,
        doc: DocId,
        actor: &Actor,
        target: &TargetUser,
        content: impl Into<String>,
        notes: Option<Vec<NoteItem>>,
    ) -> CoreResult<Translation> {
        self.save_text::<TranslationId>(doc, actor, target, content.into(), notes)
    }

    pub fn transcription(
        &self,
        doc: DocId,
        actor: &Actor,
        target: &TargetUser,
    ) -> CoreResult<Option<Transcription>> {
        let user = self.target(actor, target)?;
        self.store.read(|tables| {
            tables.document(doc)?;
            Ok(tables.text_of::<TranscriptionId>(doc, user).cloned())
        })
    }

    pub fn translation(
        &self,
        doc: DocId,
        actor: &Actor,
        target: &TargetUser,
    ) -> CoreResult<Option<Translation>> {
        let user = self.target(actor, target)?;
        self.store.read(|tables| {
            tables.document(doc)?;
            Ok(tables.text_of::<TranslationId>(doc, user).cloned())
        })
    }

    /// Deletes the target's transcription, its notes and every alignment keyed on it.
    ///
    /// Deleting the author's transcription sends the document back to `None`.
    pub fn delete_transcription(
        &self,
        doc: DocId,
        actor: &Actor,
        target: &TargetUser,
    ) -> CoreResult<ValidationState> {
        self.delete_text::<TranscriptionId>(doc, actor, target)
    }

    pub fn delete_translation(
        &self,
        doc: DocId,
        actor: &Actor,
        target: &TargetUser,
    ) -> CoreResult<ValidationState> {
        self.delete_text::<TranslationId>(doc, actor, target)
    }

    /// Copies `from`'s transcription, notes included, into the actor's own.
    pub fn clone_transcription(
        &self,
        doc: DocId,
        actor: &Actor,
        from: &TargetUser,
    ) -> CoreResult<Transcription> {
        self.clone_text::<TranscriptionId>(doc, actor, from)
    }

    pub fn clone_translation(
        &self,
        doc: DocId,
        actor: &Actor,
        from: &TargetUser,
    ) -> CoreResult<Translation> {
        self.clone_text::<TranslationId>(doc, actor, from)
    }

    /// Replaces the note set of the target's reading of `kind`.
    pub fn upsert_note_set(
        &self,
        doc: DocId,
        kind: TextKind,
        actor: &Actor,
        target: &TargetUser,
        items: Vec<NoteItem>,
    ) -> CoreResult<Vec<AttachedNote>> {
        match kind {
            TextKind::Transcription => self.write_notes::<TranscriptionId>(doc, actor, target, items, true),
            TextKind::Translation => self.write_notes::<TranslationId>(doc, actor, target, items, true),
        }
    }

    /// Adds notes to the target's reading of `kind`.
    pub fn append_notes(
        &self,
        doc: DocId,
        kind: TextKind,
        actor: &Actor,
        target: &TargetUser,
        items: Vec<NoteItem>,
    ) -> CoreResult<Vec<AttachedNote>> {
        match kind {
            TextKind::Transcription => self.write_notes::<TranscriptionId>(doc, actor, target, items, false),
            TextKind::Translation => self.write_notes::<TranslationId>(doc, actor, target, items, false),
        }
    }

    pub fn notes(
        &self,
        doc: DocId,
        kind: TextKind,
        actor: &Actor,
        target: &TargetUser,
    ) -> CoreResult<Vec<AttachedNote>> {
        let user = self.target(actor, target)?;
        self.store.read(|tables| {
            let carrier = match kind {
                TextKind::Transcription => existing_text::<TranscriptionId>(tables, doc, user)?.carrier(),
                TextKind::Translation => existing_text::<TranslationId>(tables, doc, user)?.carrier(),
            };
            Ok(notes_of(tables, carrier))
        })
    }

    fn save_text<I: TextId>(
        &self,
        doc_id: DocId,
        actor: &Actor,
        target: &TargetUser,
        content: String,
        notes: Option<Vec<NoteItem>>,
    ) -> CoreResult<Text<I>> {
        let user = self.target(actor, target)?;
        check_content(&content, &self.config)?;
        let now = Utc::now();

        let text = self.store.write(|tables| {
            check_stage_gate(actor, open_document(tables, doc_id, now)?, I::KIND)?;

            let id = match tables.text_of::<I>(doc_id, user).map(|t| t.id) {
                Some(id) => {
                    if let Some(text) = I::table_mut(tables).get_mut(&id) {
                        text.set_content(content);
                    }
                    id
                }
                None => {
                    let id = I::allocate(tables);
                    I::table_mut(tables).insert(id, Text::new(id, doc_id, user, content));
                    id
                }
            };

            if let Some(items) = &notes {
                NoteRegistry::new(tables, &self.config).replace_attachment_set(id.carrier(), user, items)?;
            }
            check_attachments_fit(tables, id)?;
            stored(tables, id)
        })?;

        info!(doc = %doc_id, %user, kind = %I::KIND, version = text.version.as_str(), "reading saved");
        Ok(text)
    }

    fn delete_text<I: TextId>(
        &self,
        doc_id: DocId,
        actor: &Actor,
        target: &TargetUser,
    ) -> CoreResult<ValidationState> {
        let user = self.target(actor, target)?;
        let now = Utc::now();

        let (state, demoted) = self.store.write(|tables| {
            check_stage_gate(actor, open_document(tables, doc_id, now)?, I::KIND)?;
            let id = existing_text::<I>(tables, doc_id, user)?;

            let released = tables.drop_edges_of(id.carrier());
            let mut registry = NoteRegistry::new(tables, &self.config);
            registry.detach_all(id.carrier());
            for note in released {
                registry.delete_if_unused(note);
            }
            I::table_mut(tables).remove(&id);

            let doc = tables.document_mut(doc_id)?;
            let demoted = demote_on_delete(doc, I::KIND, user);
            Ok((doc.validation_state(now), demoted))
        })?;

        info!(doc = %doc_id, %user, kind = %I::KIND, demoted, stage = ?state.stage, "reading deleted");
        Ok(state)
    }

    fn clone_text<I: TextId>(&self, doc_id: DocId, actor: &Actor, from: &TargetUser) -> CoreResult<Text<I>> {
        let me = require_privileged(actor)?;
        let source_user = self.target(actor, from)?;
        if source_user == me {
            return Err(CoreError::forbidden(format!("{me} cannot clone their own {}", I::KIND)));
        }
        let now = Utc::now();

        let text = self.store.write(|tables| {
            let doc = open_document(tables, doc_id, now)?;
            if doc.stage.is_validated(I::KIND) {
                return Err(CoreError::forbidden(format!(
                    "the {} of {doc_id} is validated and can no longer be cloned",
                    I::KIND
                )));
            }
            let source_id = existing_text::<I>(tables, doc_id, source_user)?;
            let content = stored(tables, source_id)?.content;

            let id = match tables.text_of::<I>(doc_id, me).map(|t| t.id) {
                Some(id) => {
                    NoteRegistry::new(tables, &self.config).detach_all(id.carrier());
                    if let Some(text) = I::table_mut(tables).get_mut(&id) {
                        text.set_content(content);
                    }
                    id
                }
                None => {
                    let id = I::allocate(tables);
                    I::table_mut(tables).insert(id, Text::new(id, doc_id, me, content));
                    id
                }
            };

            NoteRegistry::new(tables, &self.config).copy_attachments(
                source_id.carrier(),
                id.carrier(),
                me,
            )?;
            stored(tables, id)
        })?;

        info!(doc = %doc_id, from = %source_user, to = %me, kind = %I::KIND, "reading cloned");
        Ok(text)
    }

    fn write_notes<I: TextId>(
        &self,
        doc_id: DocId,
        actor: &Actor,
        target: &TargetUser,
        items: Vec<NoteItem>,
        replace: bool,
    ) -> CoreResult<Vec<AttachedNote>> {
        let user = self.target(actor, target)?;
        let now = Utc::now();

        let notes = self.store.write(|tables| {
            check_stage_gate(actor, open_document(tables, doc_id, now)?, I::KIND)?;
            let id = existing_text::<I>(tables, doc_id, user)?;
            let len = stored(tables, id)?.char_len();
            for item in &items {
                item.span.check_within(len)?;
            }

            let mut registry = NoteRegistry::new(tables, &self.config);
            if replace {
                registry.replace_attachment_set(id.carrier(), user, &items)
            } else {
                registry.append(id.carrier(), user, &items)
            }
        })?;

        info!(doc = %doc_id, %user, kind = %I::KIND, notes = notes.len(), replace, "note set written");
        Ok(notes)
    }
}

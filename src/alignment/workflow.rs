use chrono::{DateTime, Utc};
use tracing::info;

use crate::access::{require_document_manager, UserDirectory};
use crate::alignment::Editions;
use crate::document::{DocId, Document, ValidationState};
use crate::store::{Tables, TextId};
use crate::types::actor::Actor;
use crate::types::carrier::TextKind;
use crate::types::errors::{CoreError, CoreResult};
use crate::types::identifiers::{TranscriptionId, TranslationId};

impl<U: UserDirectory> Editions<U> {
    pub fn validation_state(&self, doc: DocId) -> CoreResult<ValidationState> {
        let now = Utc::now();
        self.store
            .read(|tables| tables.document(doc).map(|d| d.validation_state(now)))
    }

    /// Makes the author's transcription the reference.
    pub fn validate_transcription(&self, doc: DocId, actor: &Actor) -> CoreResult<ValidationState> {
        self.validate::<TranscriptionId>(doc, actor)
    }

    /// Makes the author's translation the reference. The transcription must be validated first.
    pub fn validate_translation(&self, doc: DocId, actor: &Actor) -> CoreResult<ValidationState> {
        self.validate::<TranslationId>(doc, actor)
    }

    pub fn unvalidate_transcription(&self, doc: DocId, actor: &Actor) -> CoreResult<ValidationState> {
        self.unvalidate(doc, actor, TextKind::Transcription)
    }

    pub fn unvalidate_translation(&self, doc: DocId, actor: &Actor) -> CoreResult<ValidationState> {
        self.unvalidate(doc, actor, TextKind::Translation)
    }

    pub fn close_document(&self, doc: DocId, actor: &Actor) -> CoreResult<ValidationState> {
        self.manage(doc, actor, "closed", |d, _| d.closed = true)
    }

    /// Clears the closed flag, and the closing date too when it has already passed.
    pub fn reopen_document(&self, doc: DocId, actor: &Actor) -> CoreResult<ValidationState> {
        self.manage(doc, actor, "reopened", |d, now| {
            d.closed = false;
            if d.closing_date.is_some_and(|date| date <= now) {
                d.closing_date = None;
            }
        })
    }

    pub fn set_closing_date(
        &self,
        doc: DocId,
        actor: &Actor,
        closing_date: Option<DateTime<Utc>>,
    ) -> CoreResult<ValidationState> {
        self.manage(doc, actor, "closing date set", |d, _| d.closing_date = closing_date)
    }

    fn validate<I: TextId>(&self, doc_id: DocId, actor: &Actor) -> CoreResult<ValidationState> {
        let now = Utc::now();
        let state = self.store.write(|tables| {
            let doc = tables.document(doc_id)?;
            require_document_manager(actor, doc)?;
            if I::KIND == TextKind::Translation && !doc.stage.is_validated(TextKind::Transcription) {
                return Err(CoreError::forbidden(format!(
                    "the transcription of {doc_id} must be validated first"
                )));
            }
            if tables.text_of::<I>(doc_id, doc.owner).is_none() {
                return Err(CoreError::target_not_found(format!(
                    "{} of {} on {doc_id}",
                    I::KIND,
                    doc.owner
                )));
            }
            let doc = tables.document_mut(doc_id)?;
            doc.stage = doc.stage.validated(I::KIND);
            Ok(doc.validation_state(now))
        })?;
        info!(doc = %doc_id, kind = %I::KIND, stage = ?state.stage, "reading validated");
        Ok(state)
    }

    fn unvalidate(&self, doc_id: DocId, actor: &Actor, kind: TextKind) -> CoreResult<ValidationState> {
        self.manage(doc_id, actor, "reading unvalidated", |d, _| {
            d.stage = d.stage.unvalidated(kind)
        })
    }

    fn manage(
        &self,
        doc_id: DocId,
        actor: &Actor,
        what: &'static str,
        change: impl FnOnce(&mut Document, DateTime<Utc>),
    ) -> CoreResult<ValidationState> {
        let now = Utc::now();
        let state = self.store.write(|tables: &mut Tables| {
            require_document_manager(actor, tables.document(doc_id)?)?;
            let doc = tables.document_mut(doc_id)?;
            change(doc, now);
            Ok(doc.validation_state(now))
        })?;
        info!(doc = %doc_id, stage = ?state.stage, closed = state.closed, "{what}");
        Ok(state)
    }
}

//! Validation workflow of a document.
//!
//! ```text
//! None --validate transcription--> TranscriptionValidated --validate translation--> TranslationValidated
//!
//! any stage              --delete/unvalidate transcription--> None
//! TranslationValidated   --delete/unvalidate translation-->   TranscriptionValidated
//! ```
//!
//! Promotion only happens through an explicit validation by the document's teacher or an
//! admin. Deleting one of the author's readings demotes the stage in the same unit of work.

use crate::document::document::{Document, ValidationStage};
use crate::types::carrier::TextKind;
use crate::types::identifiers::UserId;

impl ValidationStage {
    /// Stage from which the author's reading of `kind` is the reference.
    pub fn threshold(kind: TextKind) -> ValidationStage {
        match kind {
            TextKind::Transcription => ValidationStage::TranscriptionValidated,
            TextKind::Translation => ValidationStage::TranslationValidated,
        }
    }

    pub fn is_validated(self, kind: TextKind) -> bool {
        self >= ValidationStage::threshold(kind)
    }

    /// Stage after validating the author's reading of `kind`. Never lowers the stage.
    pub fn validated(self, kind: TextKind) -> ValidationStage {
        self.max(ValidationStage::threshold(kind))
    }

    /// Stage after the author's reading of `kind` stops being the reference.
    ///
    /// Invalidating the transcription takes the translation down with it.
    pub fn unvalidated(self, kind: TextKind) -> ValidationStage {
        match kind {
            TextKind::Transcription => ValidationStage::None,
            TextKind::Translation => self.min(ValidationStage::TranscriptionValidated),
        }
    }
}

/// Cascade run after a `kind` reading owned by `owner` has been deleted.
///
/// Returns whether the stage changed. Readings of other users never affect the stage.
pub fn demote_on_delete(doc: &mut Document, kind: TextKind, owner: UserId) -> bool {
    if owner != doc.owner {
        return false;
    }
    let demoted = doc.stage.unvalidated(kind);
    let changed = demoted != doc.stage;
    doc.stage = demoted;
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::identifiers::DocId;

    #[test]
    fn validation_never_lowers_the_stage() {
        let stage = ValidationStage::TranslationValidated;
        assert_eq!(stage.validated(TextKind::Transcription), ValidationStage::TranslationValidated);
        assert_eq!(
            ValidationStage::None.validated(TextKind::Transcription),
            ValidationStage::TranscriptionValidated
        );
    }

    #[test]
    fn deleting_a_student_reading_keeps_the_stage() {
        let mut doc = Document::new(DocId(1), UserId(10)).with_stage(ValidationStage::TranslationValidated);
        assert!(!demote_on_delete(&mut doc, TextKind::Transcription, UserId(11)));
        assert_eq!(doc.stage, ValidationStage::TranslationValidated);
    }

    #[test]
    fn deleting_the_author_translation_keeps_the_transcription_validated() {
        let mut doc = Document::new(DocId(1), UserId(10)).with_stage(ValidationStage::TranslationValidated);
        assert!(demote_on_delete(&mut doc, TextKind::Translation, UserId(10)));
        assert_eq!(doc.stage, ValidationStage::TranscriptionValidated);

        let mut doc = Document::new(DocId(1), UserId(10));
        assert!(!demote_on_delete(&mut doc, TextKind::Translation, UserId(10)));
        assert_eq!(doc.stage, ValidationStage::None);
    }
}

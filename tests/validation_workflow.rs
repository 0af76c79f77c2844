use std::collections::BTreeMap;

use edition_core::types::{DocId, TextKind, UserId};
use edition_core::{
    Actor, CoreError, Document, Editions, NoteItem, SpeechPartInput, Span, TargetUser, ValidationStage,
};

type Core = Editions<BTreeMap<String, UserId>>;

const DOC: DocId = DocId(7);
const TEACHER: u64 = 10;
const ADA: u64 = 1;

const LATIN: &str = "In principio erat Verbum";
const FRENCH: &str = "Au commencement était le Verbe";

fn editions() -> Core {
    let directory = [("teacher".to_string(), UserId(TEACHER)), ("ada".to_string(), UserId(ADA))]
        .into_iter()
        .collect();
    let core = Editions::new(directory);
    core.register_document(Document::new(DOC, UserId(TEACHER))).unwrap();
    core
}

/// Both author readings written and validated.
fn fully_validated() -> Core {
    let core = editions();
    let teacher = Actor::teacher(TEACHER);
    core.save_transcription(DOC, &teacher, &TargetUser::Actor, LATIN, None).unwrap();
    core.save_translation(DOC, &teacher, &TargetUser::Actor, FRENCH, None).unwrap();
    core.validate_transcription(DOC, &teacher).unwrap();
    core.validate_translation(DOC, &teacher).unwrap();
    core
}

#[test]
fn scenario_deleting_the_author_transcription_resets_the_stage() {
    let core = fully_validated();
    assert_eq!(
        core.validation_state(DOC).unwrap().stage,
        ValidationStage::TranslationValidated
    );
    assert!(core.reference_translation(DOC).unwrap().is_some());

    let state = core
        .delete_transcription(DOC, &Actor::teacher(TEACHER), &TargetUser::Actor)
        .unwrap();
    assert_eq!(state.stage, ValidationStage::None);
    assert!(core.reference_transcription(DOC).unwrap().is_none());
    assert!(core.reference_translation(DOC).unwrap().is_none());
}

#[test]
fn scenario_deleting_the_author_translation_keeps_the_transcription() {
    let core = fully_validated();
    let state = core
        .delete_translation(DOC, &Actor::teacher(TEACHER), &TargetUser::Actor)
        .unwrap();
    assert_eq!(state.stage, ValidationStage::TranscriptionValidated);
    assert!(core.reference_transcription(DOC).unwrap().is_some());
    assert!(core.reference_translation(DOC).unwrap().is_none());
}

#[test]
fn invariant_student_readings_never_move_the_stage() {
    let core = editions();
    let teacher = Actor::teacher(TEACHER);
    let ada = Actor::student(ADA);
    core.save_transcription(DOC, &teacher, &TargetUser::Actor, LATIN, None).unwrap();
    core.save_transcription(DOC, &ada, &TargetUser::Actor, LATIN, None).unwrap();
    core.validate_transcription(DOC, &teacher).unwrap();

    let state = core.delete_transcription(DOC, &teacher, &"ada".into()).unwrap();
    assert_eq!(state.stage, ValidationStage::TranscriptionValidated);
}

#[test]
fn invariant_translation_is_validated_after_the_transcription() {
    let core = editions();
    let teacher = Actor::teacher(TEACHER);
    core.save_transcription(DOC, &teacher, &TargetUser::Actor, LATIN, None).unwrap();
    core.save_translation(DOC, &teacher, &TargetUser::Actor, FRENCH, None).unwrap();

    assert!(matches!(
        core.validate_translation(DOC, &teacher),
        Err(CoreError::Forbidden(_))
    ));
    core.validate_transcription(DOC, &teacher).unwrap();
    let state = core.validate_translation(DOC, &teacher).unwrap();
    assert_eq!(state.stage, ValidationStage::TranslationValidated);

    // Validating again never lowers the stage.
    let state = core.validate_transcription(DOC, &teacher).unwrap();
    assert_eq!(state.stage, ValidationStage::TranslationValidated);
}

#[test]
fn invariant_validation_needs_the_author_reading() {
    let core = editions();
    let ada = Actor::student(ADA);
    core.save_transcription(DOC, &ada, &TargetUser::Actor, LATIN, None).unwrap();

    assert!(matches!(
        core.validate_transcription(DOC, &Actor::teacher(TEACHER)),
        Err(CoreError::TargetNotFound(_))
    ));
    assert!(matches!(
        core.validate_transcription(DOC, &ada),
        Err(CoreError::Forbidden(_))
    ));
    assert_eq!(core.validation_state(DOC).unwrap().stage, ValidationStage::None);
}

#[test]
fn invariant_validated_readings_are_frozen_for_students() {
    let core = fully_validated();
    let ada = Actor::student(ADA);

    assert!(matches!(
        core.save_transcription(DOC, &ada, &TargetUser::Actor, "x", None),
        Err(CoreError::Forbidden(_))
    ));
    assert!(matches!(
        core.save_translation(DOC, &ada, &TargetUser::Actor, "x", None),
        Err(CoreError::Forbidden(_))
    ));
    assert!(core
        .save_transcription(DOC, &Actor::teacher(TEACHER), &TargetUser::Actor, LATIN, None)
        .is_ok());
}

#[test]
fn scenario_unvalidating_cascades_like_a_delete() {
    let core = fully_validated();
    let teacher = Actor::teacher(TEACHER);

    let state = core.unvalidate_translation(DOC, &teacher).unwrap();
    assert_eq!(state.stage, ValidationStage::TranscriptionValidated);

    core.validate_translation(DOC, &teacher).unwrap();
    let state = core.unvalidate_transcription(DOC, &teacher).unwrap();
    assert_eq!(state.stage, ValidationStage::None);
    assert!(core.reference_transcription(DOC).unwrap().is_none());
}

#[test]
fn scenario_reference_material_hangs_off_the_author_transcription() {
    let core = editions();
    let teacher = Actor::teacher(TEACHER);
    let ada = Actor::student(ADA);
    let notes = vec![NoteItem::new("incipit", Span::new(0, 2).unwrap())];
    core.save_transcription(DOC, &teacher, &TargetUser::Actor, LATIN, Some(notes)).unwrap();
    assert!(core.reference_notes(DOC, TextKind::Transcription).unwrap().is_empty());

    core.validate_transcription(DOC, &teacher).unwrap();
    core.align_discourse(DOC, &teacher, &TargetUser::Actor, vec![SpeechPartInput::new(1, 0, 24)])
        .unwrap();
    core.align_discourse(DOC, &ada, &TargetUser::Actor, vec![SpeechPartInput::new(2, 0, 12)])
        .unwrap();

    let discourse = core.reference_discourse_alignment(DOC).unwrap();
    assert_eq!(discourse.len(), 1);
    assert_eq!(discourse[0].user_id, UserId(TEACHER));

    let notes = core.reference_notes(DOC, TextKind::Transcription).unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].note.content, "incipit");
    assert!(core.reference_notes(DOC, TextKind::Translation).unwrap().is_empty());
}

#[test]
fn scenario_reference_translation_alignment() {
    let core = fully_validated();
    let teacher = Actor::teacher(TEACHER);
    core.align_transcription_translation(DOC, &teacher, &TargetUser::Actor, &[(0, 24, 0, 30)])
        .unwrap();

    let edges = core.reference_translation_alignment(DOC).unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].translation_span, Span::new(0, 30).unwrap());
}

#[test]
fn scenario_teacher_clones_a_student_reading() {
    let core = editions();
    let teacher = Actor::teacher(TEACHER);
    let ada = Actor::student(ADA);
    let notes = vec![NoteItem::new("gloss", Span::new(3, 12).unwrap()).with_type(2)];
    core.save_transcription(DOC, &ada, &TargetUser::Actor, LATIN, Some(notes)).unwrap();

    assert!(matches!(
        core.clone_transcription(DOC, &ada, &TargetUser::Actor),
        Err(CoreError::Forbidden(_))
    ));

    let copy = core.clone_transcription(DOC, &teacher, &"ada".into()).unwrap();
    assert_eq!(copy.user_id, UserId(TEACHER));
    assert_eq!(copy.content, LATIN);

    let theirs = core.notes(DOC, TextKind::Transcription, &ada, &TargetUser::Actor).unwrap();
    let mine = core.notes(DOC, TextKind::Transcription, &teacher, &TargetUser::Actor).unwrap();
    assert_eq!(mine.len(), 1);
    assert_ne!(mine[0].note.id, theirs[0].note.id);
    assert_eq!(mine[0].note.user_id, UserId(TEACHER));
    assert_eq!((mine[0].span, mine[0].note.type_id), (theirs[0].span, 2));

    core.validate_transcription(DOC, &teacher).unwrap();
    assert!(matches!(
        core.clone_transcription(DOC, &teacher, &"ada".into()),
        Err(CoreError::Forbidden(_))
    ));
}

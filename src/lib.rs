//! Alignment, annotation and validation core of a collaborative philological edition.
//!
//! Several users write parallel readings of the same source document: transcriptions,
//! translations, discourse segmentations and image annotations. `edition-core` relates
//! spans of those readings to one another and to image zones, shares annotation notes
//! between carriers with reference-counted deletion, computes the image fragments zones
//! cut out, and runs the per-document validation workflow that decides which readings
//! are the reference.
//!
//! Every mutating call on [`Editions`] is one atomic unit of work: either all of its
//! edges, attachments and notes are committed, or none are.

pub mod access;
pub mod alignment;
pub mod config;
pub mod document;
pub mod geometry;
pub mod notes;
pub mod span;
pub mod store;
pub mod types;

pub use access::{TargetUser, UserDirectory};
pub use alignment::{Editions, Fragment, SpeechPartInput, ZoneInput};
pub use config::CoreConfig;
pub use document::{Document, ValidationStage, ValidationState};
pub use geometry::{bounding_box, BoundingBox, ImageInfo, ImageRef, ImageService};
pub use notes::{AttachedNote, NoteItem, NoteRef};
pub use span::Span;
pub use types::{Actor, CoreError, CoreResult, ErrorKind, ErrorPayload};

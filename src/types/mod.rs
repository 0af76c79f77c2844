pub mod actor;
pub mod carrier;
pub mod errors;
pub mod identifiers;

pub use actor::{Actor, Role};
pub use carrier::{CarrierKind, CarrierRef, TextKind};
pub use errors::{CoreError, CoreResult, ErrorKind, ErrorPayload};
pub use identifiers::{DocId, NoteId, TextVersion, TranscriptionId, TranslationId, UserId, ZoneId};

pub mod content;
pub mod registry;

pub use content::check_content;
pub use registry::{notes_of, AttachedNote, NoteItem, NoteRef, NoteRegistry};

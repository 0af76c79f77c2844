pub mod records;
pub mod store;
pub mod tables;

pub use records::{
    DiscourseEdge, ImageEdge, ImageZone, Note, Text, Transcription, Translation, TranslationEdge,
    ZoneScope, ZoneType,
};
pub use store::Store;
pub use tables::{Tables, TextId};

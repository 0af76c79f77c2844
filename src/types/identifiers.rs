use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

numeric_id!(
    /// Source document under edition.
    DocId, "doc"
);
numeric_id!(UserId, "user");
numeric_id!(
    /// Annotation note, shared between carriers.
    NoteId, "note"
);
numeric_id!(TranscriptionId, "transcription");
numeric_id!(TranslationId, "translation");

/// Zone identifier, scoped per image and user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub u32);

impl ZoneId {
    pub fn get(self) -> u32 {
        self.0
    }

    /// `None` once the id space is used up.
    pub fn next(self) -> Option<ZoneId> {
        self.0.checked_add(1).map(ZoneId)
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone#{}", self.0)
    }
}

/// Content hash of a transcription or translation body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextVersion(String);

impl TextVersion {
    pub fn from_content(content: &[u8]) -> Self {
        TextVersion(format!("sha256:{}", hex::encode(Sha256::digest(content))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Settings of the editing core. `v0()` holds the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub version: String,
    /// Note type used when an item does not name one.
    pub default_note_type: u32,
    /// Accepted speech-part types for discourse alignment. Empty accepts any type.
    pub speech_part_types: BTreeSet<u32>,
    /// Elements rejected in note, zone and text content.
    pub forbidden_tags: BTreeSet<String>,
    /// Leave out fragments whose clamped origin is still negative.
    pub skip_negative_fragments: bool,
}

impl CoreConfig {
    pub fn v0() -> Self {
        Self {
            version: "1".into(),
            default_note_type: 0,
            speech_part_types: BTreeSet::new(),
            forbidden_tags: ["script", "style", "iframe", "object", "embed"]
                .into_iter()
                .map(String::from)
                .collect(),
            skip_negative_fragments: true,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::v0()
    }
}

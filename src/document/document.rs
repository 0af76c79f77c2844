use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::errors::{CoreError, CoreResult};
use crate::types::identifiers::{DocId, UserId};

/// How far the document's author readings have been validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStage {
    #[default]
    None = 0,
    TranscriptionValidated = 1,
    TranslationValidated = 2,
}

impl ValidationStage {
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(ValidationStage::None),
            1 => Some(ValidationStage::TranscriptionValidated),
            2 => Some(ValidationStage::TranslationValidated),
            _ => None,
        }
    }
}

/// The edited source document, as far as the core is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    /// The author: the user whose readings become the reference once validated.
    pub owner: UserId,
    pub stage: ValidationStage,
    pub closed: bool,
    pub closing_date: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(id: DocId, owner: UserId) -> Self {
        Self {
            id,
            owner,
            stage: ValidationStage::None,
            closed: false,
            closing_date: None,
        }
    }

    pub fn with_stage(mut self, stage: ValidationStage) -> Self {
        self.stage = stage;
        self
    }

    pub fn with_closing_date(mut self, closing_date: DateTime<Utc>) -> Self {
        self.closing_date = Some(closing_date);
        self
    }

    /// Closed explicitly, or past its closing date.
    pub fn is_closed_at(&self, now: DateTime<Utc>) -> bool {
        self.closed || self.closing_date.map_or(false, |date| date <= now)
    }

    pub fn ensure_open(&self, now: DateTime<Utc>) -> CoreResult<()> {
        if self.is_closed_at(now) {
            return Err(CoreError::DocumentClosed(self.id));
        }
        Ok(())
    }

    pub fn validation_state(&self, now: DateTime<Utc>) -> ValidationState {
        ValidationState {
            stage: self.stage,
            closed: self.is_closed_at(now),
            closing_date: self.closing_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationState {
    pub stage: ValidationStage,
    pub closed: bool,
    pub closing_date: Option<DateTime<Utc>>,
}

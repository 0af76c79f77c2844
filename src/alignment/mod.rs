//! The editing core as seen by a request layer.
//!
//! `Editions` owns the store and runs every mutating call as one unit of work: resolve the
//! target user, check the document is open, resolve the reference transcription and the
//! target side, then replace the keyed set. A failure anywhere leaves the previous state.

pub mod edges;
pub mod reference;
pub mod texts;
pub mod workflow;
pub mod zones;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::access::{resolve_target, TargetUser, UserDirectory};
use crate::config::CoreConfig;
use crate::document::{DocId, Document};
use crate::store::{Store, Tables};
use crate::types::actor::Actor;
use crate::types::errors::{CoreError, CoreResult};
use crate::types::identifiers::UserId;

pub use edges::SpeechPartInput;
pub use zones::{Fragment, ZoneInput};

pub struct Editions<U> {
    store: Store,
    directory: U,
    config: CoreConfig,
}

impl<U: UserDirectory> Editions<U> {
    pub fn new(directory: U) -> Self {
        Self::with_config(directory, CoreConfig::v0())
    }

    pub fn with_config(directory: U, config: CoreConfig) -> Self {
        Self {
            store: Store::new(),
            directory,
            config,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Read-only access to the committed tables.
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn register_document(&self, doc: Document) -> CoreResult<()> {
        let id = doc.id;
        let owner = doc.owner;
        self.store.write(|tables| {
            if tables.documents.contains_key(&id) {
                return Err(CoreError::Conflict(format!("{id} is already registered")));
            }
            tables.documents.insert(id, doc);
            Ok(())
        })?;
        info!(doc = %id, %owner, "document registered");
        Ok(())
    }

    pub fn document(&self, id: DocId) -> CoreResult<Document> {
        self.store.read(|tables| tables.document(id).cloned())
    }

    fn target(&self, actor: &Actor, target: &TargetUser) -> CoreResult<UserId> {
        resolve_target(actor, target, &self.directory)
    }
}

/// The document, if it still accepts content changes at `now`.
pub(crate) fn open_document(tables: &Tables, id: DocId, now: DateTime<Utc>) -> CoreResult<&Document> {
    let doc = tables.document(id)?;
    doc.ensure_open(now)?;
    Ok(doc)
}

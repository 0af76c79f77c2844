// Units of work run against a staged copy of the tables;
// the copy replaces the live tables only when the closure succeeds
// and the integrity check passes. Readers never see a partial write.

use parking_lot::RwLock;
use tracing::warn;

use crate::store::tables::Tables;
use crate::types::errors::{CoreError, CoreResult};

#[derive(Debug, Default)]
pub struct Store {
    tables: RwLock<Tables>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        let tables = self.tables.read();
        f(&tables)
    }

    /// Runs `f` as one atomic unit of work.
    ///
    /// Writers are serialized by the lock; two writes on the same key resolve as
    /// last-writer-wins. Any error from `f` discards every change it made. A failed
    /// integrity check surfaces as `CoreError::Conflict`.
    pub fn write<R>(&self, f: impl FnOnce(&mut Tables) -> CoreResult<R>) -> CoreResult<R> {
        let mut live = self.tables.write();
        let mut staged = live.clone();

        let out = match f(&mut staged) {
            Ok(out) => out,
            Err(err) => {
                warn!(error = %err, "unit of work rolled back");
                return Err(err);
            }
        };

        if let Err(cause) = staged.check_integrity() {
            warn!(%cause, "commit rejected by integrity check");
            return Err(CoreError::Conflict(cause));
        }

        *live = staged;
        Ok(out)
    }
}

//! Log recycler: converts a retired log file back into a reservation, or
//! deletes it when recycling offers no benefit.
//!
//! A rotated-out crash log already owns allocated disk blocks. Renaming it
//! into a dirty placeholder and zero-filling in place hands those blocks
//! straight to the reservation pool, skipping a free-then-reallocate round
//! trip through the filesystem — exactly the allocation that might fail on
//! a nearly full volume.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::diag::{DiagRecord, DiagSink, Severity, VaultOp};
use crate::vault::placeholder::PlaceholderPool;

/// Recycle-or-delete policy for retired log files.
#[derive(Clone)]
pub struct LogRecycler {
    pool: PlaceholderPool,
    sink: Arc<dyn DiagSink>,
}

impl LogRecycler {
    #[allow(missing_docs)]
    #[must_use]
    pub fn new(pool: PlaceholderPool, sink: Arc<dyn DiagSink>) -> Self {
        Self { pool, sink }
    }

    /// Dispose of a retired log file.
    ///
    /// Plain deletion when the pool is disabled, the directory is gone, or
    /// the clean pool is already at target (growing it further has no
    /// benefit). Otherwise the file is renamed into a dirty placeholder and
    /// cleaned synchronously; a failed rename falls back to deletion.
    /// Returns whether the file was successfully disposed of.
    pub fn recycle(&self, log: &Path) -> bool {
        if !self.pool.enabled() || !self.pool.dir().is_dir() {
            return delete(log);
        }

        if self.pool.clean_count() >= self.pool.target_count() {
            return delete(log);
        }

        let dirty = self.pool.fresh_dirty_path();
        if let Err(err) = fs::rename(log, &dirty) {
            self.sink.record(
                DiagRecord::new(VaultOp::Recycle, Severity::Warning)
                    .with_path(log.to_string_lossy())
                    .with_details(format!("rename to dirty failed: {err}")),
            );
            return delete(log);
        }

        self.pool.clean(&dirty).is_ok()
    }
}

fn delete(path: &Path) -> bool {
    fs::remove_file(path).is_ok()
}

//! Retention policy: tombstone rotation and the combined maintenance pass.
//!
//! Each log kind has an independent cap. Excess files are evicted oldest
//! first — names sort chronologically by construction — and eviction goes
//! through the recycler, so reclaimed blocks feed the reservation pool
//! instead of being returned to the filesystem.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::diag::{DiagRecord, DiagSink, Severity, VaultOp};
use crate::vault::naming::LogKind;
use crate::vault::placeholder::PlaceholderPool;
use crate::vault::recycle::LogRecycler;
use crate::vault::scan;

/// Runs one full maintenance pass: rotation for both kinds, then
/// placeholder refill/trim. Cheap to clone; the scheduler hands a clone to
/// the background thread.
#[derive(Clone)]
pub struct Maintainer {
    dir: PathBuf,
    max_panic_logs: usize,
    max_native_logs: usize,
    pool: PlaceholderPool,
    recycler: LogRecycler,
    sink: Arc<dyn DiagSink>,
}

impl Maintainer {
    #[allow(missing_docs)]
    #[must_use]
    pub fn new(
        dir: PathBuf,
        max_panic_logs: usize,
        max_native_logs: usize,
        pool: PlaceholderPool,
        recycler: LogRecycler,
        sink: Arc<dyn DiagSink>,
    ) -> Self {
        Self {
            dir,
            max_panic_logs,
            max_native_logs,
            pool,
            recycler,
            sink,
        }
    }

    /// One maintenance pass. Stage failures are isolated: a rotation
    /// problem never prevents the placeholder stage from running, and no
    /// failure escapes this method.
    pub fn run(&self) {
        if let Err(err) = scan::ensure_dir(&self.dir) {
            self.sink.record(
                DiagRecord::new(VaultOp::Maintain, Severity::Warning).with_error(&err),
            );
            return;
        }

        let recycled_panic = self.rotate(LogKind::Panic, self.max_panic_logs);
        let recycled_native = self.rotate(LogKind::Native, self.max_native_logs);
        let refill = self.pool.refill_and_trim();

        self.sink.record(
            DiagRecord::new(VaultOp::Maintain, Severity::Info).with_details(format!(
                "recycled {} panic + {} native logs, cleaned {}, created {}, trimmed {}, \
                 deleted {} dirty",
                recycled_panic,
                recycled_native,
                refill.cleaned_from_dirty,
                refill.created_fresh,
                refill.trimmed_clean,
                refill.deleted_dirty,
            )),
        );
    }

    /// Evict excess logs of one kind, oldest first. Returns how many were
    /// routed through the recycler.
    fn rotate(&self, kind: LogKind, max: usize) -> usize {
        let files = scan::list_category(&self.dir, kind.category());
        if files.len() < max {
            return 0;
        }

        let excess = files.len() - max;
        let mut recycled = 0;
        for path in &files[..excess] {
            if self.recycler.recycle(path) {
                recycled += 1;
            } else {
                self.sink.record(
                    DiagRecord::new(VaultOp::Rotate, Severity::Warning)
                        .with_path(path.to_string_lossy())
                        .with_details("eviction failed"),
                );
            }
        }
        recycled
    }

    /// Directory this maintainer operates on.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::MemorySink;
    use crate::vault::naming::{FileCategory, IdGenerator};
    use std::fs;

    fn maintainer(dir: &Path, max_each: usize, target: usize, size_kb: u64) -> Maintainer {
        let sink: Arc<MemorySink> = Arc::new(MemorySink::new());
        let pool = PlaceholderPool::new(
            dir.to_path_buf(),
            target,
            size_kb,
            Arc::new(IdGenerator::new()),
            sink.clone(),
        );
        let recycler = LogRecycler::new(pool.clone(), sink.clone());
        Maintainer::new(dir.to_path_buf(), max_each, max_each, pool, recycler, sink)
    }

    fn write_logs(dir: &Path, kind: LogKind, names: &[&str]) {
        for name in names {
            fs::write(dir.join(format!("tombstone_{name}{}", kind.suffix())), b"x").unwrap();
        }
    }

    #[test]
    fn rotation_evicts_exactly_the_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let maintainer = maintainer(dir.path(), 3, 0, 1);
        write_logs(dir.path(), LogKind::Native, &["01", "02", "03", "04", "05"]);

        maintainer.run();

        let remaining: Vec<String> = scan::list_category(dir.path(), FileCategory::NativeLog)
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            remaining,
            vec![
                "tombstone_03.native.crashlog",
                "tombstone_04.native.crashlog",
                "tombstone_05.native.crashlog"
            ]
        );
    }

    #[test]
    fn kinds_rotate_independently() {
        let dir = tempfile::tempdir().unwrap();
        let maintainer = maintainer(dir.path(), 2, 0, 1);
        write_logs(dir.path(), LogKind::Panic, &["01", "02", "03"]);
        write_logs(dir.path(), LogKind::Native, &["01"]);

        maintainer.run();

        assert_eq!(scan::list_category(dir.path(), FileCategory::PanicLog).len(), 2);
        assert_eq!(
            scan::list_category(dir.path(), FileCategory::NativeLog).len(),
            1
        );
    }

    #[test]
    fn eviction_feeds_the_placeholder_pool() {
        let dir = tempfile::tempdir().unwrap();
        let maintainer = maintainer(dir.path(), 1, 5, 1);
        write_logs(dir.path(), LogKind::Panic, &["01", "02", "03"]);

        maintainer.run();

        // Two evicted logs became placeholders; refill tops up to 5.
        assert_eq!(scan::list_category(dir.path(), FileCategory::PanicLog).len(), 1);
        assert_eq!(
            scan::list_category(dir.path(), FileCategory::CleanPlaceholder).len(),
            5
        );
        assert_eq!(
            scan::list_category(dir.path(), FileCategory::DirtyPlaceholder).len(),
            0
        );
    }

    #[test]
    fn maintenance_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let maintainer = maintainer(dir.path(), 2, 3, 1);
        write_logs(dir.path(), LogKind::Panic, &["01", "02", "03", "04"]);

        maintainer.run();
        let after_first = crate::vault::scan::DirSnapshot::scan(dir.path());

        maintainer.run();
        let after_second = crate::vault::scan::DirSnapshot::scan(dir.path());

        assert_eq!(after_first.panic_logs.len(), after_second.panic_logs.len());
        assert_eq!(after_first.clean_count(), after_second.clean_count());
        assert_eq!(after_second.clean_count(), 3);
        assert_eq!(after_second.dirty_count(), 0);
    }

    #[test]
    fn at_exactly_max_nothing_is_evicted() {
        let dir = tempfile::tempdir().unwrap();
        let maintainer = maintainer(dir.path(), 3, 0, 1);
        write_logs(dir.path(), LogKind::Native, &["01", "02", "03"]);

        maintainer.run();
        assert_eq!(
            scan::list_category(dir.path(), FileCategory::NativeLog).len(),
            3
        );
    }
}

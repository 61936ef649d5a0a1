//! Placeholder allocator: creates, zero-fills, and atomically promotes
//! reservation files; refills and trims the clean pool.
//!
//! Atomic `rename()` is the only coordination primitive, in-process and
//! across processes sharing the directory. A placeholder is promoted to
//! Clean by renaming it under a fresh identifier after its content has been
//! zeroed and synced, so an observer either sees a fully-prepared Clean
//! file or no file at all: any failure mid-clean deletes the Dirty file
//! outright. Consuming a reservation is a rename too — exactly one of the
//! racing consumers wins, and losers delete their orphaned candidate and
//! move on.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::errors::{Result, VaultError};
use crate::diag::{DiagRecord, DiagSink, Severity, VaultOp};
use crate::vault::naming::{FileCategory, IdGenerator, PlaceholderState};
use crate::vault::scan::{self, DirSnapshot};

/// Zero blocks are written in this unit; the last block is truncated to the
/// remaining byte count when the target size is not block-aligned.
const BLOCK_SIZE: u64 = 1024;

/// Outcome of one refill/trim pass.
#[derive(Debug, Default)]
#[allow(missing_docs)]
pub struct RefillReport {
    pub cleaned_from_dirty: usize,
    pub created_fresh: usize,
    pub trimmed_clean: usize,
    pub deleted_dirty: usize,
    pub attempts: usize,
    pub errors: Vec<String>,
}

/// The reservation pool over one log directory.
#[derive(Clone)]
pub struct PlaceholderPool {
    dir: PathBuf,
    target_count: usize,
    size_kb: u64,
    ids: Arc<IdGenerator>,
    sink: Arc<dyn DiagSink>,
}

impl PlaceholderPool {
    /// Pool over `dir` with the given clean-count target and per-file size.
    #[must_use]
    pub fn new(
        dir: PathBuf,
        target_count: usize,
        size_kb: u64,
        ids: Arc<IdGenerator>,
        sink: Arc<dyn DiagSink>,
    ) -> Self {
        Self {
            dir,
            target_count,
            size_kb,
            ids,
            sink,
        }
    }

    /// Target number of clean placeholders. 0 means the pool is disabled.
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.target_count
    }

    /// Whether the reservation feature is enabled.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.target_count > 0
    }

    /// The log directory this pool operates on.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Destination path for a retired log file being converted into a dirty
    /// placeholder (fresh identifier, dirty suffix).
    #[must_use]
    pub fn fresh_dirty_path(&self) -> PathBuf {
        self.dir
            .join(self.ids.placeholder_name(PlaceholderState::Dirty))
    }

    /// Current number of clean placeholders on disk.
    #[must_use]
    pub fn clean_count(&self) -> usize {
        scan::list_category(&self.dir, FileCategory::CleanPlaceholder).len()
    }

    /// Zero-fill a dirty placeholder and promote it to Clean.
    ///
    /// The file is overwritten with `max(target, ceil(current/1024))` blocks
    /// of zeros — an oversized placeholder keeps its size, a small one grows
    /// to target — synced, then renamed under a fresh Clean identifier. Any
    /// failure abandons the placeholder: the dirty file is deleted and the
    /// error returned.
    pub fn clean(&self, dirty: &Path) -> Result<PathBuf> {
        let result = self.zero_fill_and_promote(dirty);
        if let Err(err) = &result {
            let _ = fs::remove_file(dirty);
            self.sink.record(
                DiagRecord::new(VaultOp::Clean, Severity::Warning)
                    .with_path(dirty.to_string_lossy())
                    .with_error(err),
            );
        }
        result
    }

    fn zero_fill_and_promote(&self, dirty: &Path) -> Result<PathBuf> {
        let current_size = fs::metadata(dirty)
            .map_err(|e| VaultError::io(dirty, e))?
            .len();
        let target_bytes = (self.size_kb * BLOCK_SIZE).max(current_size);

        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(dirty)
            .map_err(|e| VaultError::io(dirty, e))?;

        let block = [0u8; BLOCK_SIZE as usize];
        let full_blocks = target_bytes / BLOCK_SIZE;
        let tail = (target_bytes % BLOCK_SIZE) as usize;
        for _ in 0..full_blocks {
            file.write_all(&block).map_err(|e| VaultError::io(dirty, e))?;
        }
        if tail > 0 {
            file.write_all(&block[..tail])
                .map_err(|e| VaultError::io(dirty, e))?;
        }
        file.sync_all().map_err(|e| VaultError::io(dirty, e))?;
        drop(file);

        let clean_path = self
            .dir
            .join(self.ids.placeholder_name(PlaceholderState::Clean));
        fs::rename(dirty, &clean_path).map_err(|e| VaultError::io(dirty, e))?;
        Ok(clean_path)
    }

    /// Bring the clean pool to target, then trim the excess.
    ///
    /// While below target: prefer promoting the most recently named dirty
    /// file, else create a fresh empty dirty file and promote that. Attempts
    /// are bounded at twice the target so a read-only filesystem cannot spin
    /// this loop forever. Afterwards, the oldest clean files beyond target
    /// are deleted, and every remaining dirty file — a stray reservation
    /// attempt nobody consumed — is deleted unconditionally.
    pub fn refill_and_trim(&self) -> RefillReport {
        let mut report = RefillReport::default();
        let snapshot = DirSnapshot::scan(&self.dir);
        let mut clean_count = snapshot.clean_count();
        // Ascending by name; pop() takes the most recently created first.
        let mut dirty_backlog = snapshot.dirty;

        while clean_count < self.target_count && report.attempts < self.target_count * 2 {
            report.attempts += 1;
            if let Some(dirty) = dirty_backlog.pop() {
                match self.clean(&dirty) {
                    Ok(_) => {
                        clean_count += 1;
                        report.cleaned_from_dirty += 1;
                    }
                    Err(err) => report.errors.push(err.to_string()),
                }
            } else {
                match self
                    .create_fresh_dirty()
                    .and_then(|path| self.clean(&path))
                {
                    Ok(_) => {
                        clean_count += 1;
                        report.created_fresh += 1;
                    }
                    Err(err) => report.errors.push(err.to_string()),
                }
            }
        }

        let (clean_files, dirty_files) = if report.attempts > 0 {
            let rescan = DirSnapshot::scan(&self.dir);
            (rescan.clean, rescan.dirty)
        } else {
            (snapshot.clean, dirty_backlog)
        };

        if clean_files.len() > self.target_count {
            let excess = clean_files.len() - self.target_count;
            for path in &clean_files[..excess] {
                if fs::remove_file(path).is_ok() {
                    report.trimmed_clean += 1;
                }
            }
        }

        for path in &dirty_files {
            if fs::remove_file(path).is_ok() {
                report.deleted_dirty += 1;
            }
        }

        if !report.errors.is_empty() {
            self.sink.record(
                DiagRecord::new(VaultOp::Refill, Severity::Warning)
                    .with_details(report.errors.join("; ")),
            );
        }
        report
    }

    /// Take one clean placeholder by renaming it to `dest`, newest first.
    ///
    /// A candidate that fails to rename was raced away by another actor (or
    /// vanished); it is deleted and the next candidate tried. `None` means
    /// the pool is exhausted and the caller should create a file the
    /// ordinary way.
    pub fn consume_one(&self, dest: &Path) -> Option<PathBuf> {
        let mut candidates = scan::list_category(&self.dir, FileCategory::CleanPlaceholder);
        while let Some(candidate) = candidates.pop() {
            match fs::rename(&candidate, dest) {
                Ok(()) => return Some(dest.to_path_buf()),
                Err(_) => {
                    self.sink.record(
                        DiagRecord::new(VaultOp::Consume, Severity::Info).with_error(
                            &VaultError::RaceLost {
                                path: candidate.clone(),
                            },
                        ),
                    );
                    let _ = fs::remove_file(&candidate);
                }
            }
        }
        None
    }

    /// Create a brand-new empty dirty placeholder. `create_new` keeps a
    /// cross-process identifier collision from clobbering an existing file.
    pub fn create_fresh_dirty(&self) -> Result<PathBuf> {
        let path = self
            .dir
            .join(self.ids.placeholder_name(PlaceholderState::Dirty));
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| VaultError::io(&path, e))?;
        Ok(path)
    }
}

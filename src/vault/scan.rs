//! Directory scanner: typed, point-in-time snapshots of the log directory.
//!
//! `read_dir` guarantees no ordering, so every listing here is explicitly
//! sorted ascending by file name; by construction of the naming scheme that
//! is chronological order.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::errors::{Result, VaultError};
use crate::vault::naming::FileCategory;

/// Create the log directory if needed. The one failure in this crate that
/// gets its own error: with no directory there is nothing to reserve.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|_| VaultError::DirUnavailable {
        path: dir.to_path_buf(),
    })
}

/// List regular files in `dir` matching `category`, sorted ascending by
/// name (oldest first). An absent or unreadable directory yields an empty
/// list, not an error.
#[must_use]
pub fn list_category(dir: &Path, category: FileCategory) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| category.matches(name))
        })
        .map(|entry| entry.path())
        .collect();

    paths.sort_unstable_by(|a, b| a.file_name().cmp(&b.file_name()));
    paths
}

/// Point-in-time enumeration of the directory, one list per category.
/// Never persisted; recomputed on each scan.
#[derive(Debug, Default)]
#[allow(missing_docs)]
pub struct DirSnapshot {
    pub panic_logs: Vec<PathBuf>,
    pub native_logs: Vec<PathBuf>,
    pub clean: Vec<PathBuf>,
    pub dirty: Vec<PathBuf>,
}

#[allow(missing_docs)]
impl DirSnapshot {
    /// Scan `dir` once, classifying every entry. Files matching no category
    /// are ignored entirely.
    #[must_use]
    pub fn scan(dir: &Path) -> Self {
        let mut snapshot = Self::default();
        let Ok(entries) = fs::read_dir(dir) else {
            return snapshot;
        };

        for entry in entries.flatten() {
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            match crate::vault::naming::classify(name) {
                Some(FileCategory::PanicLog) => snapshot.panic_logs.push(entry.path()),
                Some(FileCategory::NativeLog) => snapshot.native_logs.push(entry.path()),
                Some(FileCategory::CleanPlaceholder) => snapshot.clean.push(entry.path()),
                Some(FileCategory::DirtyPlaceholder) => snapshot.dirty.push(entry.path()),
                None => {}
            }
        }

        for list in [
            &mut snapshot.panic_logs,
            &mut snapshot.native_logs,
            &mut snapshot.clean,
            &mut snapshot.dirty,
        ] {
            list.sort_unstable_by(|a, b| a.file_name().cmp(&b.file_name()));
        }
        snapshot
    }

    pub fn clean_count(&self) -> usize {
        self.clean.len()
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }
}

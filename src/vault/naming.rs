//! File naming and classification: the four disjoint file categories and
//! the monotone placeholder identifier generator.
//!
//! Everything in the log directory that matches none of the four
//! (prefix, suffix) pairs is invisible to this crate — never counted,
//! never deleted.

use std::sync::atomic::{AtomicU32, Ordering};

/// Prefix shared by both crash-log kinds.
pub const LOG_PREFIX: &str = "tombstone";
/// Prefix shared by both placeholder states.
pub const PLACEHOLDER_PREFIX: &str = "placeholder";

const PANIC_LOG_SUFFIX: &str = ".panic.crashlog";
const NATIVE_LOG_SUFFIX: &str = ".native.crashlog";
const CLEAN_SUFFIX: &str = ".clean.crashlog";
const DIRTY_SUFFIX: &str = ".dirty.crashlog";

/// The two crash-log kinds, each with an independent retention cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    /// Reports from the language runtime (panic hook).
    Panic,
    /// Reports from the native signal handler.
    Native,
}

impl LogKind {
    /// Filename suffix distinguishing this kind.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Panic => PANIC_LOG_SUFFIX,
            Self::Native => NATIVE_LOG_SUFFIX,
        }
    }

    /// Directory category holding logs of this kind.
    #[must_use]
    pub const fn category(self) -> FileCategory {
        match self {
            Self::Panic => FileCategory::PanicLog,
            Self::Native => FileCategory::NativeLog,
        }
    }
}

/// The two placeholder states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderState {
    /// Zero-filled, ready to become a log file.
    Clean,
    /// Being prepared or pending cleanup; content and size unspecified.
    Dirty,
}

impl PlaceholderState {
    #[must_use]
    const fn suffix(self) -> &'static str {
        match self {
            Self::Clean => CLEAN_SUFFIX,
            Self::Dirty => DIRTY_SUFFIX,
        }
    }
}

/// The four file categories this crate recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum FileCategory {
    PanicLog,
    NativeLog,
    CleanPlaceholder,
    DirtyPlaceholder,
}

impl FileCategory {
    /// All categories, for exhaustive scans.
    pub const ALL: [Self; 4] = [
        Self::PanicLog,
        Self::NativeLog,
        Self::CleanPlaceholder,
        Self::DirtyPlaceholder,
    ];

    /// Filename prefix for this category (includes the `_` separator).
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::PanicLog | Self::NativeLog => "tombstone_",
            Self::CleanPlaceholder | Self::DirtyPlaceholder => "placeholder_",
        }
    }

    /// Filename suffix for this category.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::PanicLog => PANIC_LOG_SUFFIX,
            Self::NativeLog => NATIVE_LOG_SUFFIX,
            Self::CleanPlaceholder => CLEAN_SUFFIX,
            Self::DirtyPlaceholder => DIRTY_SUFFIX,
        }
    }

    /// Pure prefix/suffix membership test.
    #[must_use]
    pub fn matches(self, name: &str) -> bool {
        name.starts_with(self.prefix()) && name.ends_with(self.suffix())
    }
}

/// Classify a filename into at most one category.
///
/// The (prefix, suffix) pairs are disjoint by construction, so no name can
/// match two categories.
#[must_use]
pub fn classify(name: &str) -> Option<FileCategory> {
    FileCategory::ALL.into_iter().find(|c| c.matches(name))
}

/// Generator of unique, monotonically-sortable placeholder identifiers.
///
/// An identifier is `now_ms * 1000 + seq`, where `seq` is a per-process
/// counter wrapping in `[0, 999)`. Rendered zero-padded to 20 digits,
/// lexicographic order equals creation order, including across processes
/// (modulo clock skew). Cross-process identifier collisions are tolerated
/// upstream: a failed `create_new` is an ordinary abandoned attempt.
#[derive(Debug, Default)]
pub struct IdGenerator {
    seq: AtomicU32,
}

impl IdGenerator {
    /// Generator starting at sequence 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next identifier. Strictly increasing within a process as long as the
    /// wall clock does not step backwards.
    pub fn next_id(&self) -> u64 {
        let seq = self
            .seq
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                Some(if v + 1 >= 999 { 0 } else { v + 1 })
            })
            .unwrap_or(0);
        let now_ms = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        now_ms * 1000 + u64::from(seq)
    }

    /// Filename for a fresh placeholder in the given state.
    #[must_use]
    pub fn placeholder_name(&self, state: PlaceholderState) -> String {
        format!(
            "{PLACEHOLDER_PREFIX}_{:020}{}",
            self.next_id(),
            state.suffix()
        )
    }
}

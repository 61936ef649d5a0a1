#![forbid(unsafe_code)]

//! crashlog_vault — on-disk retention and disk-space reservation for crash
//! reports.
//!
//! The problem: at the moment a process crashes, the volume holding its log
//! directory may be full, and a crash report that cannot be written is a
//! crash that never happened. The fix: keep a small pool of pre-allocated,
//! zero-filled **placeholder** files on disk at all times. Writing a report
//! then consumes a placeholder via `rename()` — space that was already
//! confirmed writable — instead of asking the filesystem for new blocks.
//!
//! Three cooperating mechanisms:
//! 1. **Placeholder pool** — dirty files are zero-filled and atomically
//!    promoted to clean reservations; the pool is refilled and trimmed to a
//!    configured target during maintenance
//! 2. **Tombstone rotation** — excess crash logs beyond a per-kind cap are
//!    evicted oldest-first, with their disk blocks recycled back into the
//!    pool instead of freed
//! 3. **Append writer** — report text is appended into the zero-filled
//!    region of a consumed placeholder without ever shrinking its physical
//!    size
//!
//! Multiple processes may share one log directory; coordination relies
//! entirely on the atomicity of `rename()`. There are no lock files.
//!
//! # Library usage
//!
//! ```rust,no_run
//! use crashlog_vault::prelude::*;
//! use std::sync::Arc;
//!
//! let config = VaultConfig {
//!     log_dir: "/var/log/myapp/crashes".into(),
//!     placeholder_count: 2,
//!     ..VaultConfig::default()
//! };
//! let vault = LogVault::new(config, Arc::new(StderrSink));
//! vault.start_maintenance();
//! ```

pub mod prelude;

pub mod core;
pub mod diag;
pub mod vault;

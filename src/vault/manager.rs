//! `LogVault`: the operations surface the crash reporter calls into.
//!
//! One vault per log directory, configured once. No error crosses this
//! boundary: every operation degrades to `bool`/`Option` after reporting
//! through the diagnostic sink, because the callers here are crash handlers
//! that must keep going no matter what.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::core::config::VaultConfig;
use crate::core::errors::VaultError;
use crate::diag::{DiagRecord, DiagSink, Severity, VaultOp};
use crate::vault::append;
use crate::vault::maintenance::{
    InitialCounts, MaintenancePlan, ScheduledTask, classify_startup, schedule_once,
};
use crate::vault::naming::IdGenerator;
use crate::vault::placeholder::PlaceholderPool;
use crate::vault::recycle::LogRecycler;
use crate::vault::retention::Maintainer;
use crate::vault::scan::{self, DirSnapshot};

/// Externally observable scheduler state, for callers that want to know
/// whether maintenance is still owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceStatus {
    /// Nothing scheduled and nothing owed.
    Satisfied,
    /// A pass is owed; `start_maintenance` will dispatch it after this
    /// delay.
    Pending(Duration),
    /// The one allowed pass has been dispatched.
    Dispatched,
}

enum SchedulerState {
    Pending(Duration),
    Dispatched(ScheduledTask),
    Satisfied,
}

/// The retention and reservation manager for one log directory.
pub struct LogVault {
    config: VaultConfig,
    pool: PlaceholderPool,
    recycler: LogRecycler,
    maintainer: Maintainer,
    sink: Arc<dyn DiagSink>,
    scheduler: Mutex<SchedulerState>,
}

impl LogVault {
    /// Set up the vault: scan the directory once, classify counts, and
    /// decide maintenance urgency. Runs maintenance inline only when the
    /// directory is far over budget; otherwise this returns after the one
    /// directory listing. Never fails — an unusable directory just leaves
    /// every later operation degraded.
    #[must_use]
    pub fn new(config: VaultConfig, sink: Arc<dyn DiagSink>) -> Self {
        let config = config.sanitized();
        let ids = Arc::new(IdGenerator::new());
        let pool = PlaceholderPool::new(
            config.log_dir.clone(),
            config.placeholder_count,
            config.placeholder_size_kb,
            ids,
            sink.clone(),
        );
        let recycler = LogRecycler::new(pool.clone(), sink.clone());
        let maintainer = Maintainer::new(
            config.log_dir.clone(),
            config.max_panic_logs,
            config.max_native_logs,
            pool.clone(),
            recycler.clone(),
            sink.clone(),
        );

        let snapshot = DirSnapshot::scan(&config.log_dir);
        let counts = InitialCounts {
            panic_logs: snapshot.panic_logs.len(),
            native_logs: snapshot.native_logs.len(),
            clean: snapshot.clean_count(),
            dirty: snapshot.dirty_count(),
        };

        let state = match classify_startup(counts, &config) {
            MaintenancePlan::Satisfied => SchedulerState::Satisfied,
            MaintenancePlan::RunNow => {
                maintainer.run();
                SchedulerState::Satisfied
            }
            MaintenancePlan::Schedule(delay) => SchedulerState::Pending(delay),
        };

        sink.record(
            DiagRecord::new(VaultOp::Initialize, Severity::Info).with_details(format!(
                "panic={} native={} clean={} dirty={}",
                counts.panic_logs, counts.native_logs, counts.clean, counts.dirty
            )),
        );

        Self {
            config,
            pool,
            recycler,
            maintainer,
            sink,
            scheduler: Mutex::new(state),
        }
    }

    /// Fire-and-forget: dispatch the owed maintenance pass, if any, onto a
    /// background thread. Safe to call any number of times; a no-op after
    /// the first dispatch and when nothing is owed.
    pub fn start_maintenance(&self) {
        let mut state = self.scheduler.lock();
        let SchedulerState::Pending(delay) = &*state else {
            return;
        };
        let delay = *delay;

        let maintainer = self.maintainer.clone();
        match schedule_once(delay, move || maintainer.run()) {
            Ok(task) => *state = SchedulerState::Dispatched(task),
            Err(err) => {
                // Still pending; a later call may succeed.
                self.sink.record(
                    DiagRecord::new(VaultOp::Maintain, Severity::Warning).with_error(&err),
                );
            }
        }
    }

    /// Produce a writable file at `path` for a new crash report, preferably
    /// by consuming a clean placeholder (space already confirmed writable),
    /// falling back to ordinary creation. `None` when the directory is
    /// unusable or the path already exists.
    pub fn request_new_log_file(&self, path: &Path) -> Option<PathBuf> {
        if let Err(err) = scan::ensure_dir(&self.config.log_dir) {
            self.sink.record(
                DiagRecord::new(VaultOp::CreateLog, Severity::Warning).with_error(&err),
            );
            return None;
        }

        if let Some(reserved) = self.pool.consume_one(path) {
            return Some(reserved);
        }

        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(_) => Some(path.to_path_buf()),
            Err(e) => {
                self.sink.record(
                    DiagRecord::new(VaultOp::CreateLog, Severity::Warning)
                        .with_error(&VaultError::io(path, e)),
                );
                None
            }
        }
    }

    /// Append report text at the end of the file's logical content. See
    /// [`append::append_text`] for the zero-tail semantics.
    pub fn append_text(&self, path: &Path, text: &str) -> bool {
        match append::append_text(path, text) {
            Ok(()) => true,
            Err(err) => {
                self.sink.record(
                    DiagRecord::new(VaultOp::Append, Severity::Warning)
                        .with_path(path.to_string_lossy())
                        .with_error(&err),
                );
                false
            }
        }
    }

    /// Release a finished log file: recycled into the reservation pool when
    /// that helps, deleted otherwise.
    pub fn release_log_file(&self, path: &Path) -> bool {
        self.recycler.recycle(path)
    }

    /// Run a full maintenance pass synchronously on the calling thread.
    pub fn do_maintain(&self) {
        self.maintainer.run();
    }

    /// Current scheduler state.
    pub fn maintenance_status(&self) -> MaintenanceStatus {
        match &*self.scheduler.lock() {
            SchedulerState::Pending(delay) => MaintenanceStatus::Pending(*delay),
            SchedulerState::Dispatched(_) => MaintenanceStatus::Dispatched,
            SchedulerState::Satisfied => MaintenanceStatus::Satisfied,
        }
    }

    /// Cancel a dispatched-but-not-yet-run maintenance pass. Marks the
    /// scheduler satisfied either way. Returns whether there was a task to
    /// cancel.
    pub fn cancel_pending_maintenance(&self) -> bool {
        let mut state = self.scheduler.lock();
        match std::mem::replace(&mut *state, SchedulerState::Satisfied) {
            SchedulerState::Dispatched(task) => {
                task.cancel();
                true
            }
            _ => false,
        }
    }

    /// The (sanitized) configuration this vault runs with.
    #[must_use]
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }
}

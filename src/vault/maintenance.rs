//! Maintenance scheduling: the startup urgency decision and the one-shot
//! background task that carries it out.
//!
//! At initialization the directory's observed counts are compared against
//! the configured budgets and classified into an explicit plan — far over
//! budget runs maintenance synchronously, slightly over (or any dirty
//! leftover) schedules it with zero delay, a merely unfilled pool waits for
//! the configured delay, and a directory that is exactly right schedules
//! nothing at all. At most one maintenance pass is dispatched per vault
//! lifetime.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, after, bounded, never, select};

use crate::core::config::VaultConfig;
use crate::core::errors::{Result, VaultError};

/// Slack added to each budget before maintenance becomes urgent enough to
/// block initialization.
const URGENT_OVERSHOOT: usize = 10;

/// Observed per-category counts from the initialization scan.
#[derive(Debug, Clone, Copy, Default)]
#[allow(missing_docs)]
pub struct InitialCounts {
    pub panic_logs: usize,
    pub native_logs: usize,
    pub clean: usize,
    pub dirty: usize,
}

/// The three-way startup decision, as an explicit state rather than a
/// sentinel delay value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenancePlan {
    /// Directory is exactly as configured; never schedule anything.
    Satisfied,
    /// Far over budget; run maintenance synchronously, then mark satisfied.
    RunNow,
    /// Schedule maintenance after this delay (zero means as soon as
    /// possible).
    Schedule(Duration),
}

/// Classify the startup scan into a maintenance plan.
#[must_use]
pub fn classify_startup(counts: InitialCounts, config: &VaultConfig) -> MaintenancePlan {
    let max_panic = config.max_panic_logs;
    let max_native = config.max_native_logs;
    let target = config.placeholder_count;

    if counts.panic_logs <= max_panic
        && counts.native_logs <= max_native
        && counts.clean == target
        && counts.dirty == 0
    {
        MaintenancePlan::Satisfied
    } else if counts.panic_logs > max_panic + URGENT_OVERSHOOT
        || counts.native_logs > max_native + URGENT_OVERSHOOT
        || counts.clean > target + URGENT_OVERSHOOT
        || counts.dirty > URGENT_OVERSHOOT
    {
        MaintenancePlan::RunNow
    } else if counts.panic_logs > max_panic
        || counts.native_logs > max_native
        || counts.clean > target
        || counts.dirty > 0
    {
        MaintenancePlan::Schedule(Duration::ZERO)
    } else {
        // Within budget but not exactly satisfied (pool below target):
        // no hurry.
        MaintenancePlan::Schedule(config.maintenance_delay())
    }
}

/// Handle to a dispatched one-shot task. Dropping the handle detaches the
/// task (it still runs); [`cancel`](Self::cancel) stops it if the timer has
/// not fired yet.
pub struct ScheduledTask {
    cancel_tx: Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ScheduledTask {
    /// Cancel the task if it has not started running, then wait for the
    /// worker thread to exit.
    pub fn cancel(mut self) {
        let _ = self.cancel_tx.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Wait for the task to finish (after the timer fires and the job
    /// completes).
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Dispatch `job` on a named background thread after `delay`.
///
/// The worker selects between the one-shot timer and the cancel channel. A
/// dropped (detached) handle disconnects the cancel channel, which must not
/// count as cancellation — the receiver is swapped for `never()` and the
/// timer keeps its course.
pub fn schedule_once<F>(delay: Duration, job: F) -> Result<ScheduledTask>
where
    F: FnOnce() + Send + 'static,
{
    let (cancel_tx, cancel_rx) = bounded::<()>(1);

    let handle = thread::Builder::new()
        .name("crashvault-maint".into())
        .spawn(move || run_after(delay, cancel_rx, job))
        .map_err(|e| VaultError::Runtime {
            details: format!("failed to spawn maintenance thread: {e}"),
        })?;

    Ok(ScheduledTask {
        cancel_tx,
        handle: Some(handle),
    })
}

fn run_after<F: FnOnce()>(delay: Duration, cancel_rx: Receiver<()>, job: F) {
    let timer = after(delay);
    let mut cancel_rx = cancel_rx;
    let fire = loop {
        select! {
            recv(timer) -> _ => break true,
            recv(cancel_rx) -> msg => {
                if msg.is_ok() {
                    break false;
                }
                // Handle dropped, task detached: keep waiting on the timer.
                cancel_rx = never();
            }
        }
    };
    if fire {
        job();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn config(max_each: usize, target: usize) -> VaultConfig {
        VaultConfig {
            max_panic_logs: max_each,
            max_native_logs: max_each,
            placeholder_count: target,
            maintenance_delay_ms: 5_000,
            ..VaultConfig::default()
        }
    }

    fn counts(panic_logs: usize, native_logs: usize, clean: usize, dirty: usize) -> InitialCounts {
        InitialCounts {
            panic_logs,
            native_logs,
            clean,
            dirty,
        }
    }

    #[test]
    fn exactly_right_directory_is_satisfied() {
        let plan = classify_startup(counts(10, 10, 3, 0), &config(10, 3));
        assert_eq!(plan, MaintenancePlan::Satisfied);
    }

    #[test]
    fn far_over_budget_runs_now() {
        // 21 native logs with max 10: exceeds max + 10.
        let plan = classify_startup(counts(0, 21, 3, 0), &config(10, 3));
        assert_eq!(plan, MaintenancePlan::RunNow);
    }

    #[test]
    fn slightly_over_budget_schedules_immediately() {
        // 12 native logs with max 10: over, but within the +10 band.
        let plan = classify_startup(counts(0, 12, 3, 0), &config(10, 3));
        assert_eq!(plan, MaintenancePlan::Schedule(Duration::ZERO));
    }

    #[test]
    fn any_dirty_placeholder_schedules_immediately() {
        let plan = classify_startup(counts(0, 0, 3, 1), &config(10, 3));
        assert_eq!(plan, MaintenancePlan::Schedule(Duration::ZERO));
    }

    #[test]
    fn many_dirty_placeholders_run_now() {
        let plan = classify_startup(counts(0, 0, 3, 11), &config(10, 3));
        assert_eq!(plan, MaintenancePlan::RunNow);
    }

    #[test]
    fn excess_clean_placeholders_follow_the_same_bands() {
        let cfg = config(10, 3);
        assert_eq!(
            classify_startup(counts(0, 0, 4, 0), &cfg),
            MaintenancePlan::Schedule(Duration::ZERO)
        );
        assert_eq!(
            classify_startup(counts(0, 0, 14, 0), &cfg),
            MaintenancePlan::RunNow
        );
    }

    #[test]
    fn unfilled_pool_defers_by_configured_delay() {
        let plan = classify_startup(counts(0, 0, 1, 0), &config(10, 3));
        assert_eq!(plan, MaintenancePlan::Schedule(Duration::from_millis(5_000)));
    }

    #[test]
    fn empty_directory_with_disabled_pool_is_satisfied() {
        let plan = classify_startup(counts(0, 0, 0, 0), &config(10, 0));
        assert_eq!(plan, MaintenancePlan::Satisfied);
    }

    #[test]
    fn scheduled_job_runs_after_zero_delay() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let task = schedule_once(Duration::ZERO, move || {
            flag.store(true, Ordering::SeqCst);
        })
        .unwrap();
        task.join();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn cancelled_job_never_runs() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let task = schedule_once(Duration::from_secs(60), move || {
            flag.store(true, Ordering::SeqCst);
        })
        .unwrap();
        task.cancel();
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn detached_task_still_fires() {
        let (done_tx, done_rx) = bounded::<()>(1);
        let task = schedule_once(Duration::from_millis(10), move || {
            let _ = done_tx.send(());
        })
        .unwrap();
        drop(task); // detach: cancel channel disconnects
        done_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("detached task should still run");
    }
}

//! The scheduler: public submission API plus the dispatch loop.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use chrono::{Local, NaiveDateTime, TimeZone};
use tracing::{debug, info};

use crate::config::{SchedulerConfig, WaiterBackendConfig};
use crate::core::waiter::{spawn_waiter, WaiterPool};
use crate::core::{Job, SchedulerError, TaskStore};
use crate::util::clock;

/// Date format accepted by [`Scheduler::add_at_str`]: `dd-MM-yyyy HH:mm:ss.SSS`,
/// interpreted in the local time zone.
pub const SCHEDULE_DATE_FORMAT: &str = "%d-%m-%Y %H:%M:%S%.3f";

enum WaiterBackend {
    ThreadPerTask,
    Pool(WaiterPool),
}

struct SchedulerInner {
    store: TaskStore,
    waiters: WaiterBackend,
}

/// An in-process scheduler executing jobs at their due time.
///
/// Cheaply cloneable; all clones share one task store. Submissions
/// ([`Scheduler::add_after`] and friends) and [`Scheduler::stop`] may be
/// called from any thread. [`Scheduler::start`] runs the dispatch loop and
/// blocks, so it belongs on a caller-owned thread distinct from the
/// submitters.
///
/// Tasks with distinct due times are handed to waiters in due-time order;
/// tasks sharing a due time are dispatched first-inserted-first, though their
/// waiters then race independently, so no relative *execution* order is
/// guaranteed between them.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let backend = match &self.inner.waiters {
            WaiterBackend::ThreadPerTask => "thread_per_task",
            WaiterBackend::Pool(_) => "pool",
        };
        f.debug_struct("Scheduler")
            .field("backend", &backend)
            .field("pending", &self.inner.store.len())
            .field("stopped", &self.inner.store.is_closed())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Create a scheduler with the default configuration (one dedicated
    /// waiter thread per dispatched task).
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&SchedulerConfig::default())
            .expect("default scheduler configuration is valid")
    }

    /// Create a scheduler from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] if the configuration fails
    /// validation (for example a pooled backend with zero workers).
    pub fn with_config(config: &SchedulerConfig) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;

        let waiters = match config.waiters {
            WaiterBackendConfig::ThreadPerTask => WaiterBackend::ThreadPerTask,
            WaiterBackendConfig::Pool { workers } => {
                WaiterBackend::Pool(WaiterPool::new(workers, config.waiter_stack_size))
            }
        };

        Ok(Self {
            inner: Arc::new(SchedulerInner {
                store: TaskStore::new(),
                waiters,
            }),
        })
    }

    /// Schedule `job` to run after `delay`.
    ///
    /// A zero delay makes the job immediately due.
    pub fn add_after(&self, job: impl Job, delay: Duration) {
        self.insert(Box::new(job), Instant::now() + delay);
    }

    /// Schedule `job` to run after `delay_ms` milliseconds.
    ///
    /// Mirrors millisecond-based callers; prefer [`Scheduler::add_after`]
    /// where a [`Duration`] is already at hand.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NegativeDelay`] if `delay_ms` is negative.
    pub fn add_after_ms(&self, job: impl Job, delay_ms: i64) -> Result<(), SchedulerError> {
        if delay_ms < 0 {
            return Err(SchedulerError::NegativeDelay(delay_ms));
        }
        #[allow(clippy::cast_sign_loss)]
        self.add_after(job, Duration::from_millis(delay_ms as u64));
        Ok(())
    }

    /// Schedule `job` to run at the absolute instant `at`.
    ///
    /// An instant in the past makes the job immediately due.
    pub fn add_at(&self, job: impl Job, at: SystemTime) {
        self.insert(Box::new(job), clock::instant_at(at));
    }

    /// Schedule `job` to run at a local date-time given as
    /// `dd-MM-yyyy HH:mm:ss.SSS` (see [`SCHEDULE_DATE_FORMAT`]).
    ///
    /// A date-time in the past makes the job immediately due.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidTimestamp`] if `when` does not parse
    /// or does not resolve to an unambiguous local instant.
    pub fn add_at_str(&self, job: impl Job, when: &str) -> Result<(), SchedulerError> {
        let naive = NaiveDateTime::parse_from_str(when, SCHEDULE_DATE_FORMAT).map_err(|e| {
            SchedulerError::InvalidTimestamp {
                input: when.to_owned(),
                reason: e.to_string(),
            }
        })?;
        let local = Local.from_local_datetime(&naive).single().ok_or_else(|| {
            SchedulerError::InvalidTimestamp {
                input: when.to_owned(),
                reason: "ambiguous or nonexistent local time".to_owned(),
            }
        })?;
        self.add_at(job, SystemTime::from(local));
        Ok(())
    }

    /// Run the dispatch loop until [`Scheduler::stop`] is observed.
    ///
    /// Blocks the calling thread. With the default thread-per-task backend,
    /// each iteration removes the earliest-due task from the store (even if
    /// it is not yet due, so a later submission with an earlier due time can
    /// never starve behind it), hands it to a dedicated waiter, then sleeps
    /// until the new earliest entry is due or an insertion wakes the loop.
    ///
    /// With a pooled backend, due-time enforcement stays in the loop: a task
    /// is removed only once it is due and pool workers execute immediately.
    /// A worker therefore never sleeps out a distant due time, which would
    /// block due tasks queued behind it. Later submissions with earlier due
    /// times still overtake, because the loop re-evaluates the store's
    /// earliest entry on every insertion.
    ///
    /// Shutdown is observed at iteration boundaries only: a waiter already
    /// holding a task completes normally, and the loop exits on its next
    /// pass over the store.
    pub fn start(&self) {
        info!("dispatch loop started");
        match &self.inner.waiters {
            WaiterBackend::ThreadPerTask => loop {
                let Some(task) = self.inner.store.take_earliest() else {
                    // Store closed; pending tasks stay queued, never dispatched.
                    break;
                };
                debug!(
                    job = task.job_name(),
                    seq = task.seq(),
                    "task dispatched to waiter"
                );
                // Detached; a panic in the job unwinds only this waiter.
                let _handle = spawn_waiter(task);
                self.inner.store.wait_for_due();
            },
            WaiterBackend::Pool(pool) => loop {
                let Some(task) = self.inner.store.take_due() else {
                    break;
                };
                debug!(
                    job = task.job_name(),
                    seq = task.seq(),
                    "due task dispatched to pool"
                );
                pool.dispatch(task);
            },
        }
        info!("dispatch loop stopped");
    }

    /// Request shutdown.
    ///
    /// Advisory and eventually consistent: the dispatch loop exits at its
    /// next iteration boundary, waiters already holding tasks run them to
    /// completion, and tasks still in the store are kept but never
    /// dispatched. Submissions after `stop` still queue; they never run.
    pub fn stop(&self) {
        info!("scheduler stop requested");
        self.inner.store.close();
    }

    /// Number of tasks currently pending in the store.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.store.len()
    }

    fn insert(&self, job: Box<dyn Job>, due_at: Instant) {
        self.inner.store.insert(job, due_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::job_fn;

    #[test]
    fn test_negative_delay_rejected() {
        let scheduler = Scheduler::new();
        let err = scheduler
            .add_after_ms(job_fn("late", || Ok(())), -1)
            .unwrap_err();
        assert!(matches!(err, SchedulerError::NegativeDelay(-1)));
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_zero_delay_accepted() {
        let scheduler = Scheduler::new();
        scheduler.add_after_ms(job_fn("now", || Ok(())), 0).unwrap();
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_add_at_str_parses_schedule_format() {
        let scheduler = Scheduler::new();
        scheduler
            .add_at_str(job_fn("dated", || Ok(())), "03-08-2024 09:56:55.000")
            .unwrap();
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_add_at_str_rejects_garbage() {
        let scheduler = Scheduler::new();
        let err = scheduler
            .add_at_str(job_fn("dated", || Ok(())), "not a date")
            .unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidTimestamp { .. }));
    }

    #[test]
    fn test_debug_reports_backend_and_pending() {
        let scheduler = Scheduler::new();
        scheduler.add_after(job_fn("queued", || Ok(())), Duration::from_secs(60));

        let rendered = format!("{scheduler:?}");
        assert!(rendered.contains("thread_per_task"), "got {rendered}");
        assert!(rendered.contains("pending: 1"), "got {rendered}");
    }

    #[test]
    fn test_invalid_pool_config_rejected() {
        let config = SchedulerConfig {
            waiters: WaiterBackendConfig::Pool { workers: 0 },
            ..SchedulerConfig::default()
        };
        let err = Scheduler::with_config(&config).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidConfig(_)));
    }
}

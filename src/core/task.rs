//! A job bound to the absolute instant it becomes due.

use std::fmt;
use std::time::{Duration, Instant};

use crate::core::Job;

/// A submitted job together with its due time.
///
/// Created by the task store when a caller submits work (a relative delay is
/// converted to `now + delay`; an absolute timestamp is used directly) and
/// immutable from then on. The store-assigned `seq` records insertion order
/// and breaks ties between equal due times, so two tasks due at the same
/// instant are dispatched first-inserted-first.
pub struct ScheduledTask {
    job: Box<dyn Job>,
    due_at: Instant,
    seq: u64,
}

impl ScheduledTask {
    pub(crate) fn new(job: Box<dyn Job>, due_at: Instant, seq: u64) -> Self {
        Self { job, due_at, seq }
    }

    /// The absolute instant at or after which this task may execute.
    #[must_use]
    pub fn due_at(&self) -> Instant {
        self.due_at
    }

    /// Insertion sequence number; earlier submissions have lower values.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The job's display name, for diagnostics.
    #[must_use]
    pub fn job_name(&self) -> &str {
        self.job.name()
    }

    /// Time left until the due instant, zero once due.
    ///
    /// Recomputed against the current clock on every call; waiters must call
    /// this freshly after each wake rather than caching a stale value.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.due_at.saturating_duration_since(Instant::now())
    }

    /// Whether the due instant has been reached.
    #[must_use]
    pub fn is_due(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Consume the task and run its job.
    pub(crate) fn run(self) -> crate::core::AppResult<()> {
        self.job.execute()
    }
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("job", &self.job.name())
            .field("due_at", &self.due_at)
            .field("seq", &self.seq)
            .finish()
    }
}

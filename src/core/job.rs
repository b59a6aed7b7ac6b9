//! The job capability: an opaque unit of work supplied by the caller.

use crate::core::AppResult;

/// A unit of work the scheduler runs at its due time.
///
/// The scheduler never inspects job content; it invokes [`Job::execute`]
/// exactly once per submitted task, on a waiter thread, with no arguments and
/// no observed return value beyond logging. The optional [`Job::name`] is
/// used purely for diagnostics.
///
/// # Failure semantics
///
/// An `Err` returned from `execute` is logged by the waiter and dropped:
/// no retry, no status reported to the submitter. A panic unwinds only the
/// waiter's own thread; the task store and other waiters are unaffected.
///
/// # Example
///
/// ```rust
/// use runlater::core::{AppResult, Job};
///
/// struct Reindex {
///     table: String,
/// }
///
/// impl Job for Reindex {
///     fn name(&self) -> &str {
///         &self.table
///     }
///
///     fn execute(&self) -> AppResult<()> {
///         // ... the actual work ...
///         Ok(())
///     }
/// }
/// ```
pub trait Job: Send + 'static {
    /// Display name for log lines and thread names.
    fn name(&self) -> &str {
        "anonymous"
    }

    /// Run the job. Called exactly once, at or after the task's due time.
    fn execute(&self) -> AppResult<()>;
}

/// A [`Job`] built from a closure.
///
/// Constructed with [`job_fn`]; convenient for tests and one-off callers
/// that do not want to define a struct.
pub struct FnJob<F> {
    name: String,
    f: F,
}

impl<F> Job for FnJob<F>
where
    F: Fn() -> AppResult<()> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self) -> AppResult<()> {
        (self.f)()
    }
}

/// Wrap a closure as a named [`Job`].
///
/// ```rust
/// use runlater::core::job_fn;
///
/// let job = job_fn("touch-cache", || Ok(()));
/// ```
pub fn job_fn<F>(name: impl Into<String>, f: F) -> FnJob<F>
where
    F: Fn() -> AppResult<()> + Send + 'static,
{
    FnJob {
        name: name.into(),
        f,
    }
}

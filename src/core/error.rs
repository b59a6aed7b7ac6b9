//! Error types for scheduler operations.

use thiserror::Error;

/// Errors produced when submitting work or constructing a scheduler.
///
/// Job execution failures are deliberately absent: a job's error is confined
/// to the waiter that ran it (logged, never retried, never reported back to
/// the submitter).
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A millisecond delay was negative.
    #[error("invalid delay: {0} ms is negative")]
    NegativeDelay(i64),
    /// A date string could not be parsed or resolved to an instant.
    #[error("invalid schedule time `{input}`: {reason}")]
    InvalidTimestamp {
        /// The offending input string.
        input: String,
        /// Why it was rejected.
        reason: String,
    },
    /// Scheduler configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Application-facing result using anyhow for higher-level contexts,
/// including the outcome of [`crate::core::Job::execute`].
pub type AppResult<T> = Result<T, anyhow::Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = SchedulerError::NegativeDelay(-5);
        assert_eq!(e.to_string(), "invalid delay: -5 ms is negative");

        let e = SchedulerError::InvalidTimestamp {
            input: "not-a-date".into(),
            reason: "bad format".into(),
        };
        assert_eq!(
            e.to_string(),
            "invalid schedule time `not-a-date`: bad format"
        );

        let e = SchedulerError::InvalidConfig("workers must be greater than 0".into());
        assert_eq!(
            e.to_string(),
            "invalid configuration: workers must be greater than 0"
        );
    }
}

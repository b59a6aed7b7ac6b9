//! Core scheduling engine: task store, dispatch loop, waiters, public API.

pub mod error;
pub mod job;
pub mod scheduler;
pub mod store;
pub mod task;
pub mod waiter;

pub use error::{AppResult, SchedulerError};
pub use job::{job_fn, FnJob, Job};
pub use scheduler::{Scheduler, SCHEDULE_DATE_FORMAT};
pub use store::TaskStore;
pub use task::ScheduledTask;
pub use waiter::WaiterPool;

//! Configuration models for the scheduler and waiter backends.

pub mod scheduler;

pub use scheduler::{SchedulerConfig, WaiterBackendConfig};

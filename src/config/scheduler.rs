//! Scheduler configuration structures.

use serde::{Deserialize, Serialize};

/// Default stack size for waiter threads (2 MiB).
pub const DEFAULT_WAITER_STACK_SIZE: usize = 2 * 1024 * 1024;

/// Waiter backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaiterBackendConfig {
    /// One dedicated OS thread per dispatched task (default, unbounded).
    ThreadPerTask,
    /// A fixed set of waiter threads; caps in-flight tasks at `workers`.
    Pool {
        /// Number of waiter threads.
        workers: usize,
    },
}

impl WaiterBackendConfig {
    /// A pooled backend sized to the number of logical CPUs.
    #[must_use]
    pub fn pool_per_cpu() -> Self {
        Self::Pool {
            workers: num_cpus::get(),
        }
    }
}

/// Root scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Waiter backend selection.
    pub waiters: WaiterBackendConfig,
    /// Stack size in bytes for pooled waiter threads.
    pub waiter_stack_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            waiters: WaiterBackendConfig::ThreadPerTask,
            waiter_stack_size: DEFAULT_WAITER_STACK_SIZE,
        }
    }
}

impl SchedulerConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if let WaiterBackendConfig::Pool { workers } = self.waiters {
            if workers == 0 {
                return Err("pool workers must be greater than 0".into());
            }
        }
        if self.waiter_stack_size == 0 {
            return Err("waiter_stack_size must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

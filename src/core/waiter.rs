//! Waiters: the execution side of dispatch.
//!
//! Two backends:
//!
//! - `spawn_waiter` gives each dispatched task its own named OS thread that
//!   sleeps out the remaining delay, then runs the job: the default, with no
//!   bound on in-flight tasks.
//! - [`WaiterPool`] bounds in-flight tasks with a fixed set of worker
//!   threads fed by a channel. The dispatch loop releases a task to the pool
//!   only once it is due, so workers execute immediately and a distant due
//!   time can never hold up due tasks queued behind it. A pool of N caps
//!   parallelism at N.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::core::ScheduledTask;
use crate::util::clock;

/// Block until `task` is due, then run its job.
///
/// The remaining delay is recomputed after every wake rather than cached, so
/// an early or spurious wake simply re-checks and sleeps again. A job error
/// is logged and dropped; it never reaches the submitter.
pub(crate) fn wait_and_run(task: ScheduledTask) {
    loop {
        let remaining = task.remaining();
        if remaining.is_zero() {
            break;
        }
        thread::sleep(remaining);
    }

    let name = task.job_name().to_owned();
    debug!(
        job = name.as_str(),
        seq = task.seq(),
        at_ms = clock::now_ms(),
        "running job"
    );
    if let Err(e) = task.run() {
        error!(job = name.as_str(), error = %e, "job failed");
    }
}

/// Spawn a dedicated waiter thread for one dispatched task.
///
/// The thread is detached: its handle is returned for callers (tests) that
/// want to join, but the dispatch loop drops it. A panic inside the job
/// unwinds only this thread.
pub(crate) fn spawn_waiter(task: ScheduledTask) -> JoinHandle<()> {
    let name = format!("waiter-{}", task.seq());
    thread::Builder::new()
        .name(name)
        .spawn(move || wait_and_run(task))
        .expect("failed to spawn waiter thread")
}

/// A bounded set of worker threads fed by a channel.
///
/// Callers hand tasks over once due; workers block on the channel and run
/// each received task (re-checking the remaining delay first, so a task
/// handed over early is still never run early). The channel itself is
/// unbounded, matching the unbounded task store; only the number of
/// concurrently in-flight tasks is capped.
pub struct WaiterPool {
    /// Task sender to workers. `None` after shutdown; dropping it unblocks
    /// workers waiting on recv.
    task_tx: Mutex<Option<Sender<ScheduledTask>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WaiterPool {
    /// Spawn `worker_count` waiter threads, each with `stack_size` bytes of
    /// stack.
    #[must_use]
    pub fn new(worker_count: usize, stack_size: usize) -> Self {
        let (task_tx, task_rx) = unbounded::<ScheduledTask>();

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            workers.push(spawn_pool_worker(worker_id, task_rx.clone(), stack_size));
        }

        debug!(worker_count, "waiter pool started");

        Self {
            task_tx: Mutex::new(Some(task_tx)),
            workers: Mutex::new(workers),
        }
    }

    /// Hand a due task to the pool.
    ///
    /// Never blocks. A task dispatched after [`WaiterPool::shutdown`] is
    /// dropped with a warning; the dispatch loop stops before the pool does,
    /// so this only happens on misuse.
    pub fn dispatch(&self, task: ScheduledTask) {
        let tx = self.task_tx.lock();
        match tx.as_ref() {
            Some(tx) => {
                if let Err(e) = tx.send(task) {
                    warn!(job = e.0.job_name(), "waiter pool closed, task dropped");
                }
            }
            None => warn!(job = task.job_name(), "waiter pool shut down, task dropped"),
        }
    }

    /// Stop accepting tasks and join all workers.
    ///
    /// Workers finish the tasks already handed to them (including waiting
    /// out their due times), then exit when the channel drains.
    pub fn shutdown(&self) {
        {
            let mut tx = self.task_tx.lock();
            if tx.take().is_none() {
                return;
            }
        }

        let mut workers = self.workers.lock();
        for worker in workers.drain(..) {
            if worker.join().is_err() {
                warn!("waiter pool worker panicked");
            }
        }
        debug!("waiter pool shut down");
    }
}

impl Drop for WaiterPool {
    fn drop(&mut self) {
        // Unblock workers but do not join; an explicit shutdown() is
        // required for a graceful drain.
        let mut tx = self.task_tx.lock();
        if tx.take().is_some() {
            debug!("waiter pool dropped without shutdown, workers detached");
        }
    }
}

fn spawn_pool_worker(
    worker_id: usize,
    task_rx: Receiver<ScheduledTask>,
    stack_size: usize,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name(format!("waiter-pool-{worker_id}"))
        .stack_size(stack_size)
        .spawn(move || {
            debug!(worker_id, "pool worker started");
            // When the sender is dropped, recv returns Err and the worker
            // exits after draining the channel.
            while let Ok(task) = task_rx.recv() {
                wait_and_run(task);
            }
            debug!(worker_id, "pool worker exiting");
        })
        .expect("failed to spawn waiter pool worker")
}

//! # runlater
//!
//! An in-process, in-memory scheduler for "run this later" workloads.
//!
//! This library executes arbitrary job objects at a future instant, either
//! after a relative delay or at an absolute point in time. It is intended to
//! be embedded inside a larger application that needs deferred execution
//! without standing up an external scheduling service.
//!
//! ## How it works
//!
//! Pending tasks live in a priority-ordered [`core::TaskStore`], ordered by
//! due time. A dedicated control thread runs the dispatch loop
//! ([`core::Scheduler::start`]): it removes the earliest-due task, hands it to
//! a waiter that blocks until the task is actually due, and then waits for
//! whichever comes first: the next task's due time or a newly submitted task
//! that is due even sooner. A single mutex/condvar pair couples every store
//! mutation with the loop's suspension, so an insertion that changes "what is
//! due next" always wakes the loop.
//!
//! ## Example
//!
//! ```rust,no_run
//! use runlater::core::{job_fn, Scheduler};
//! use std::thread;
//! use std::time::Duration;
//!
//! let scheduler = Scheduler::new();
//!
//! // The dispatch loop blocks, so give it its own thread.
//! let loop_handle = {
//!     let scheduler = scheduler.clone();
//!     thread::spawn(move || scheduler.start())
//! };
//!
//! scheduler.add_after(
//!     job_fn("greet", || {
//!         println!("hello from the future");
//!         Ok(())
//!     }),
//!     Duration::from_secs(2),
//! );
//!
//! // ... later ...
//! scheduler.stop();
//! loop_handle.join().unwrap();
//! ```
//!
//! ## Waiter backends
//!
//! By default every dispatched task gets its own OS thread (faithful to the
//! one-thread-per-task model, simple, unbounded). For high submission rates,
//! [`config::WaiterBackendConfig::Pool`] bounds in-flight tasks with a fixed
//! set of worker threads fed by a channel. The dispatch loop then holds each
//! task until it is due before releasing it, so a distant due time never
//! occupies a worker; dispatch order and due-time enforcement are identical,
//! only parallelism is capped.
//!
//! ## What this library does not do
//!
//! No persistence across restarts, no cancellation of a submitted task, no
//! priorities beyond due-time ordering, and no distributed coordination.
//! Job completion is fire-and-forget: no result or status is reported back
//! to the submitter.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling engine: task store, dispatch loop, waiters, public API.
pub mod core;
/// Configuration models for the scheduler and waiter backends.
pub mod config;
/// Shared utilities: clock helpers and telemetry.
pub mod util;

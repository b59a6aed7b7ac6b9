//! Thread-safe priority store of pending tasks, ordered by due time.
//!
//! One `parking_lot::Mutex` + `Condvar` pair couples every store mutation
//! with the dispatch loop's suspension: any insertion (or closing the store)
//! that could change "what should the loop be waiting for" notifies the
//! condvar, and every wait re-checks its condition, so spurious wakeups and
//! insertions that do not change the earliest due time are harmless.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::core::{Job, ScheduledTask};

/// Wrapper giving `BinaryHeap` min-ordering by due time, FIFO within ties.
struct DueEntry {
    task: ScheduledTask,
}

impl PartialEq for DueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.task.seq() == other.task.seq()
    }
}

impl Eq for DueEntry {}

impl PartialOrd for DueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap yields the earliest due time; within a
        // tie, the lower seq (earlier insertion) wins.
        match other.task.due_at().cmp(&self.task.due_at()) {
            Ordering::Equal => other.task.seq().cmp(&self.task.seq()),
            ord => ord,
        }
    }
}

/// Mutable state guarded by the store's single mutex.
struct StoreState {
    pending: BinaryHeap<DueEntry>,
    /// Monotonic insertion counter; assigns each task its tie-break seq.
    next_seq: u64,
    /// Flips `false → true` exactly once, never resets.
    closed: bool,
}

/// Priority-ordered container of pending tasks with blocking take.
///
/// `insert` is O(log n) and always succeeds (the store is unbounded);
/// [`TaskStore::take_earliest`] removes the minimum-due entry
/// unconditionally, even if it is not yet due: due-time enforcement belongs
/// to the waiter that receives the task, which keeps the dispatch loop free
/// to react to later submissions with earlier due times.
pub struct TaskStore {
    state: Mutex<StoreState>,
    /// Signaled on insertion and on close.
    wakeup: Condvar,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    /// Create an empty, open store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                pending: BinaryHeap::new(),
                next_seq: 0,
                closed: false,
            }),
            wakeup: Condvar::new(),
        }
    }

    /// Insert a job due at `due_at` and wake anything waiting on the store.
    ///
    /// Always succeeds; inserting into a closed store is allowed (the task
    /// simply queues and is never dispatched).
    pub fn insert(&self, job: Box<dyn Job>, due_at: Instant) {
        let mut state = self.state.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        let task = ScheduledTask::new(job, due_at, seq);
        debug!(job = task.job_name(), seq, "task inserted");
        state.pending.push(DueEntry { task });
        drop(state);
        self.wakeup.notify_all();
    }

    /// The due instant of the earliest pending task, without removing it.
    #[must_use]
    pub fn peek_due(&self) -> Option<Instant> {
        let state = self.state.lock();
        state.pending.peek().map(|e| e.task.due_at())
    }

    /// Remove and return the earliest-due task, blocking while the store is
    /// empty.
    ///
    /// The entry is removed even when its due time has not yet arrived.
    /// Returns `None` once the store has been closed; a closed store is never
    /// drained, so tasks still pending at close time are never dispatched.
    pub fn take_earliest(&self) -> Option<ScheduledTask> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(entry) = state.pending.pop() {
                return Some(entry.task);
            }
            self.wakeup.wait(&mut state);
        }
    }

    /// Remove and return the earliest task once it is due, blocking until
    /// then.
    ///
    /// Unlike [`TaskStore::take_earliest`], the entry is held in the store
    /// until its due time arrives, and the heap is re-evaluated after every
    /// wake: an insertion with an earlier due time wakes this wait and is
    /// handed out first, so a not-yet-due task never blocks a due one.
    /// The wait-and-pop is atomic under the store's single lock. Returns
    /// `None` once the store has been closed.
    pub fn take_due(&self) -> Option<ScheduledTask> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            match state.pending.peek().map(|e| e.task.due_at()) {
                None => {
                    self.wakeup.wait(&mut state);
                }
                Some(due_at) => {
                    let remaining = due_at.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return state.pending.pop().map(|e| e.task);
                    }
                    let _ = self.wakeup.wait_for(&mut state, remaining);
                }
            }
        }
    }

    /// Block until the earliest pending task is due, a new task is inserted,
    /// or the store is closed.
    ///
    /// With an empty store this suspends indefinitely until an insertion.
    /// With a not-yet-due earliest entry it suspends for exactly the
    /// remaining delay, waking early if an insertion arrives (the newcomer
    /// may be due sooner than the entry currently observed). The wake
    /// condition is re-checked after every wake.
    pub fn wait_for_due(&self) {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return;
            }
            match state.pending.peek().map(|e| e.task.due_at()) {
                None => {
                    self.wakeup.wait(&mut state);
                }
                Some(due_at) => {
                    let remaining = due_at.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return;
                    }
                    let _ = self.wakeup.wait_for(&mut state, remaining);
                }
            }
        }
    }

    /// Close the store and wake all waiters.
    ///
    /// Idempotent. Pending tasks are kept but never handed out again.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        drop(state);
        self.wakeup.notify_all();
    }

    /// Whether [`TaskStore::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Whether no tasks are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::job_fn;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn noop() -> Box<dyn Job> {
        Box::new(job_fn("noop", || Ok(())))
    }

    #[test]
    fn test_take_returns_earliest_due() {
        let store = TaskStore::new();
        let base = Instant::now();

        store.insert(noop(), base + Duration::from_secs(30));
        store.insert(noop(), base + Duration::from_secs(10));
        store.insert(noop(), base + Duration::from_secs(20));

        assert_eq!(store.len(), 3);
        assert_eq!(
            store.take_earliest().unwrap().due_at(),
            base + Duration::from_secs(10)
        );
        assert_eq!(
            store.take_earliest().unwrap().due_at(),
            base + Duration::from_secs(20)
        );
        assert_eq!(
            store.take_earliest().unwrap().due_at(),
            base + Duration::from_secs(30)
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_fifo_within_equal_due_times() {
        let store = TaskStore::new();
        let due = Instant::now() + Duration::from_secs(5);

        store.insert(Box::new(job_fn("first", || Ok(()))), due);
        store.insert(Box::new(job_fn("second", || Ok(()))), due);
        store.insert(Box::new(job_fn("third", || Ok(()))), due);

        assert_eq!(store.take_earliest().unwrap().job_name(), "first");
        assert_eq!(store.take_earliest().unwrap().job_name(), "second");
        assert_eq!(store.take_earliest().unwrap().job_name(), "third");
    }

    #[test]
    fn test_take_removes_not_yet_due_entries() {
        let store = TaskStore::new();
        store.insert(noop(), Instant::now() + Duration::from_secs(3600));

        // Removal is unconditional; the entry is far from due.
        let task = store.take_earliest().unwrap();
        assert!(!task.is_due());
        assert!(store.is_empty());
    }

    #[test]
    fn test_take_blocks_until_insert() {
        let store = Arc::new(TaskStore::new());
        let store2 = Arc::clone(&store);

        let taker = thread::spawn(move || store2.take_earliest());

        thread::sleep(Duration::from_millis(50));
        store.insert(noop(), Instant::now());

        let task = taker.join().unwrap();
        assert!(task.is_some());
    }

    #[test]
    fn test_close_unblocks_take_with_none() {
        let store = Arc::new(TaskStore::new());
        let store2 = Arc::clone(&store);

        let taker = thread::spawn(move || store2.take_earliest());

        thread::sleep(Duration::from_millis(50));
        store.close();

        assert!(taker.join().unwrap().is_none());
        assert!(store.is_closed());
    }

    #[test]
    fn test_closed_store_is_not_drained() {
        let store = TaskStore::new();
        store.insert(noop(), Instant::now());
        store.close();

        assert!(store.take_earliest().is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_take_due_holds_entry_until_due() {
        let store = TaskStore::new();
        store.insert(noop(), Instant::now() + Duration::from_millis(60));

        let started = Instant::now();
        let task = store.take_due().unwrap();
        let waited = started.elapsed();

        assert!(task.is_due());
        assert!(waited >= Duration::from_millis(50), "waited {waited:?}");
        assert!(store.is_empty());
    }

    #[test]
    fn test_take_due_yields_later_inserted_earlier_due_task() {
        let store = Arc::new(TaskStore::new());
        store.insert(Box::new(job_fn("distant", || Ok(()))), Instant::now() + Duration::from_secs(60));

        let store2 = Arc::clone(&store);
        let inserter = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            store2.insert(Box::new(job_fn("urgent", || Ok(()))), Instant::now());
        });

        let started = Instant::now();
        let task = store.take_due().unwrap();

        // The urgent newcomer overtakes the entry waited on first.
        assert_eq!(task.job_name(), "urgent");
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(store.len(), 1);
        inserter.join().unwrap();
    }

    #[test]
    fn test_take_due_returns_none_on_close() {
        let store = Arc::new(TaskStore::new());
        store.insert(noop(), Instant::now() + Duration::from_secs(60));

        let store2 = Arc::clone(&store);
        let closer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            store2.close();
        });

        assert!(store.take_due().is_none());
        assert_eq!(store.len(), 1);
        closer.join().unwrap();
    }

    #[test]
    fn test_peek_does_not_remove() {
        let store = TaskStore::new();
        let due = Instant::now() + Duration::from_secs(1);
        store.insert(noop(), due);

        assert_eq!(store.peek_due(), Some(due));
        assert_eq!(store.peek_due(), Some(due));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_wait_for_due_returns_when_earliest_due() {
        let store = TaskStore::new();
        store.insert(noop(), Instant::now() + Duration::from_millis(50));

        let started = Instant::now();
        store.wait_for_due();
        let waited = started.elapsed();

        assert!(waited >= Duration::from_millis(40), "waited {waited:?}");
        assert!(waited < Duration::from_secs(2), "waited {waited:?}");
    }

    #[test]
    fn test_wait_for_due_wakes_on_earlier_insertion() {
        let store = Arc::new(TaskStore::new());
        store.insert(noop(), Instant::now() + Duration::from_secs(60));

        let store2 = Arc::clone(&store);
        let inserter = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            store2.insert(noop(), Instant::now());
        });

        let started = Instant::now();
        store.wait_for_due();
        let waited = started.elapsed();

        // Far shorter than the 60s target observed before the insertion.
        assert!(waited < Duration::from_secs(5), "waited {waited:?}");
        inserter.join().unwrap();
    }

    #[test]
    fn test_wait_for_due_returns_on_close() {
        let store = Arc::new(TaskStore::new());
        store.insert(noop(), Instant::now() + Duration::from_secs(60));

        let store2 = Arc::clone(&store);
        let closer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            store2.close();
        });

        let started = Instant::now();
        store.wait_for_due();
        assert!(started.elapsed() < Duration::from_secs(5));
        closer.join().unwrap();
    }
}

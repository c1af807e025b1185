//! Keyed job scheduler: "run every N" and "run once after D" on a
//! single worker thread, cancellable by a stable string key.
//!
//! Scheduling the same key again replaces the previous entry. Jobs run
//! sequentially on the worker; they are expected to log their own
//! failures and never panic.

use std::collections::HashSet;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

type Job = Box<dyn FnMut() + Send>;

enum Schedule {
    Every(Duration),
    Once,
}

struct Entry {
    key: String,
    next_run: Instant,
    schedule: Schedule,
    job: Job,
}

#[derive(Default)]
struct SchedState {
    entries: Vec<Entry>,
    /// Keys checked out by the worker this very moment.
    running: HashSet<String>,
    /// Cancellations that arrived while their entry was checked out.
    cancelled: HashSet<String>,
    shutdown: bool,
}

struct Inner {
    state: Mutex<SchedState>,
    wake: Condvar,
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, SchedState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Cloneable handle for scheduling from inside jobs.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Arc<Inner>,
}

impl SchedulerHandle {
    /// Run `job` every `interval`, first run one interval from now.
    /// Replaces any existing entry with the same key.
    pub fn every(&self, key: &str, interval: Duration, job: impl FnMut() + Send + 'static) {
        self.insert(Entry {
            key: key.to_string(),
            next_run: Instant::now() + interval,
            schedule: Schedule::Every(interval),
            job: Box::new(job),
        });
    }

    /// Run `job` once after `delay`. Replaces any existing entry with
    /// the same key.
    pub fn once(&self, key: &str, delay: Duration, job: impl FnMut() + Send + 'static) {
        self.insert(Entry {
            key: key.to_string(),
            next_run: Instant::now() + delay,
            schedule: Schedule::Once,
            job: Box::new(job),
        });
    }

    /// Whether a job is scheduled (or currently running) under `key`.
    pub fn contains(&self, key: &str) -> bool {
        let state = self.inner.lock_state();
        state.entries.iter().any(|e| e.key == key)
            || (state.running.contains(key) && !state.cancelled.contains(key))
    }

    /// Cancel the job scheduled under `key`. Returns false when no such
    /// job exists.
    pub fn cancel(&self, key: &str) -> bool {
        let mut state = self.inner.lock_state();
        let before = state.entries.len();
        state.entries.retain(|e| e.key != key);
        let removed = state.entries.len() != before;
        let cancelled = if removed {
            true
        } else if state.running.contains(key) {
            // Entry is checked out right now; mark it so the worker
            // drops it instead of rescheduling.
            state.cancelled.insert(key.to_string());
            true
        } else {
            false
        };
        drop(state);
        if cancelled {
            debug!(key, "job cancelled");
            self.inner.wake.notify_all();
        }
        cancelled
    }

    fn insert(&self, entry: Entry) {
        let mut state = self.inner.lock_state();
        state.entries.retain(|e| e.key != entry.key);
        debug!(key = %entry.key, "job scheduled");
        state.entries.push(entry);
        drop(state);
        self.inner.wake.notify_all();
    }
}

/// Owns the worker thread; dropping it (or calling `shutdown`) stops
/// the worker and joins it.
pub struct Scheduler {
    inner: Arc<Inner>,
    worker: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new() -> Self {
        let inner = Arc::new(Inner {
            state: Mutex::new(SchedState::default()),
            wake: Condvar::new(),
        });
        let worker_inner = Arc::clone(&inner);
        let worker = thread::Builder::new()
            .name("scheduler".to_string())
            .spawn(move || worker_loop(&worker_inner))
            .ok();
        Self { inner, worker }
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn every(&self, key: &str, interval: Duration, job: impl FnMut() + Send + 'static) {
        self.handle().every(key, interval, job);
    }

    pub fn once(&self, key: &str, delay: Duration, job: impl FnMut() + Send + 'static) {
        self.handle().once(key, delay, job);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.handle().contains(key)
    }

    pub fn cancel(&self, key: &str) -> bool {
        self.handle().cancel(key)
    }

    /// Stop the worker thread and wait for it to finish.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        {
            self.inner.lock_state().shutdown = true;
        }
        self.inner.wake.notify_all();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

const IDLE_WAIT: Duration = Duration::from_secs(60);

fn worker_loop(inner: &Inner) {
    loop {
        let mut state = inner.lock_state();
        if state.shutdown {
            return;
        }

        let now = Instant::now();
        let mut due = Vec::new();
        let mut idx = 0;
        while idx < state.entries.len() {
            if state.entries[idx].next_run <= now {
                let entry = state.entries.remove(idx);
                state.running.insert(entry.key.clone());
                due.push(entry);
            } else {
                idx += 1;
            }
        }

        if due.is_empty() {
            let wait = state
                .entries
                .iter()
                .map(|e| e.next_run)
                .min()
                .map(|next| next.saturating_duration_since(now))
                .unwrap_or(IDLE_WAIT);
            let (guard, _) = inner
                .wake
                .wait_timeout(state, wait)
                .unwrap_or_else(|e| e.into_inner());
            drop(guard);
            continue;
        }

        // Run the checked-out jobs without holding the lock so jobs can
        // schedule and cancel other keys.
        drop(state);
        for mut entry in due {
            (entry.job)();

            let mut state = inner.lock_state();
            state.running.remove(&entry.key);
            let was_cancelled = state.cancelled.remove(&entry.key);
            let was_replaced = state.entries.iter().any(|e| e.key == entry.key);
            if state.shutdown || was_cancelled || was_replaced {
                continue;
            }
            if let Schedule::Every(interval) = entry.schedule {
                entry.next_run = Instant::now() + interval;
                state.entries.push(entry);
            }
        }
    }
}

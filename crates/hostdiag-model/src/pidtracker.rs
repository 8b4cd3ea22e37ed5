//! `PidTracker` - the single mutable object shared across a collection run.
//!
//! Grounded on `probe-cache::CachedCollector`, which guards a
//! shared cache behind a `parking_lot::RwLock` and takes the write lock
//! only on the miss path. Here the cached value is membership in a
//! concurrent `(pid, tag)` set rather than a metric snapshot, but the
//! locking discipline (short read-lock probe, write-lock only to mutate)
//! is the same.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Tracks PIDs spawned by this process (tool-backed collectors, `ss`
/// invocations, etc.) so the process collector and tool-derived event
/// lists can exclude the pipeline's own observer effect (I6).
#[derive(Default)]
pub struct PidTracker {
    entries: RwLock<HashMap<i32, String>>,
}

impl PidTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a PID under a tag (e.g. the tool name that spawned it).
    pub fn add(&self, pid: i32, tag: impl Into<String>) {
        self.entries.write().insert(pid, tag.into());
    }

    /// Deregister a PID, typically at end-of-scope for a spawned child.
    pub fn remove(&self, pid: i32) {
        self.entries.write().remove(&pid);
    }

    /// Whether the given PID belongs to the pipeline's own activity.
    pub fn is_own_pid(&self, pid: i32) -> bool {
        self.entries.read().contains_key(&pid)
    }

    /// Number of PIDs currently tracked.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the tracker is currently empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// RAII guard that registers a PID on construction and deregisters it on
/// drop, even if the scope unwinds via an early return or cancellation.
pub struct PidScope<'a> {
    tracker: &'a PidTracker,
    pid: i32,
}

impl<'a> PidScope<'a> {
    /// Register `pid` under `tag` for the lifetime of the returned guard.
    pub fn new(tracker: &'a PidTracker, pid: i32, tag: impl Into<String>) -> Self {
        tracker.add(pid, tag);
        Self { tracker, pid }
    }
}

impl Drop for PidScope<'_> {
    fn drop(&mut self) {
        self.tracker.remove(self.pid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_remove_round_trips() {
        let tracker = PidTracker::new();
        tracker.add(1234, "bpftrace");
        assert!(tracker.is_own_pid(1234));
        tracker.remove(1234);
        assert!(!tracker.is_own_pid(1234));
    }

    #[test]
    fn scope_guard_deregisters_on_drop() {
        let tracker = PidTracker::new();
        {
            let _scope = PidScope::new(&tracker, 42, "offcputime");
            assert!(tracker.is_own_pid(42));
        }
        assert!(!tracker.is_own_pid(42));
    }

    #[test]
    fn unrelated_pid_is_never_own() {
        let tracker = PidTracker::new();
        tracker.add(1, "x");
        assert!(!tracker.is_own_pid(2));
    }
}

//! Discrete-tick wakeup scheduler.
//!
//! The event unit never resumes a core synchronously: every wake is posted
//! here with a fixed delay and fires when the host has advanced time far
//! enough. This module provides:
//! 1. **Entries:** Per-core wakeup events, either a generic wakeup (resolves
//!    the stored pending access) or an IRQ wakeup (re-enables the clock only).
//! 2. **Ordering:** Entries fire in (due tick, insertion order) — two wakes
//!    due on the same tick fire in the order they were scheduled.
//! 3. **Time:** A monotonic tick counter advanced one tick at a time.
//!
//! Duplicate suppression (at most one generic and one IRQ wakeup in flight
//! per core) is enforced by the core state machine, not here.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Kind of a scheduled core wakeup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WakeKind {
    /// Re-enable the core clock and resolve its pending access.
    Wakeup,
    /// Re-enable the core clock so it can service an interrupt; the pending
    /// access is left untouched.
    IrqWakeup,
}

/// One scheduled wakeup. Field order gives (due, seq) heap ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    due: u64,
    seq: u64,
    core: usize,
    kind: WakeKind,
}

/// Tick counter plus the queue of scheduled wakeups.
#[derive(Debug, Default)]
pub struct Scheduler {
    now: u64,
    seq: u64,
    queue: BinaryHeap<Reverse<Entry>>,
}

impl Scheduler {
    /// Creates an empty scheduler at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current tick.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Posts a wakeup for `core` to fire `delay` ticks from now.
    pub fn schedule_in(&mut self, delay: u64, core: usize, kind: WakeKind) {
        let entry = Entry {
            due: self.now + delay,
            seq: self.seq,
            core,
            kind,
        };
        self.seq += 1;
        self.queue.push(Reverse(entry));
    }

    /// Advances time by one tick and returns the wakeups that came due.
    pub fn tick(&mut self) -> Vec<(usize, WakeKind)> {
        self.now += 1;
        let mut due = Vec::new();
        while let Some(Reverse(head)) = self.queue.peek() {
            if head.due > self.now {
                break;
            }
            let Some(Reverse(entry)) = self.queue.pop() else {
                break;
            };
            due.push((entry.core, entry.kind));
        }
        due
    }

    /// Drops every scheduled wakeup without firing it. Time keeps running.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

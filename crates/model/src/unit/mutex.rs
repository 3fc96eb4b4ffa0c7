//! Mutex arbitration unit.
//!
//! Hardware mutexes with FIFO-fair ownership transfer. A read is a lock
//! attempt; a write releases the lock and carries a 32-bit value to the next
//! owner. While the wait queue is non-empty, ownership moves from core to
//! core without the lock ever opening.

use std::collections::VecDeque;

use tracing::trace;

use crate::common::access::{IoReq, IoStatus};
use crate::unit::core::{CoreBank, CoreState};

/// One hardware mutex.
#[derive(Debug)]
struct Mutex {
    locked: bool,
    /// Value carried from the releasing core to the next owner.
    value: u32,
    /// Cores waiting for the lock, in arrival order.
    waiting: VecDeque<usize>,
}

impl Mutex {
    fn new() -> Self {
        Self {
            locked: false,
            value: 0,
            waiting: VecDeque::new(),
        }
    }
}

/// All hardware mutexes plus the event bit used to wake queued cores.
#[derive(Debug)]
pub struct MutexUnit {
    mutexes: Vec<Mutex>,
    event_bit: u32,
}

impl MutexUnit {
    /// Allocates `nb_mutexes` unlocked mutexes waking through `event_bit`.
    pub fn new(nb_mutexes: usize, event_bit: u32) -> Self {
        Self {
            mutexes: (0..nb_mutexes).map(|_| Mutex::new()).collect(),
            event_bit,
        }
    }

    /// Unlocks every mutex and empties its queue. Queued accesses were
    /// already dropped by the core bank reset; the carried value is not
    /// architectural state and is left as is.
    pub fn reset(&mut self) {
        for mutex in &mut self.mutexes {
            mutex.locked = false;
            mutex.waiting.clear();
        }
    }

    /// Handles a mutex register access from `core` (demux port only).
    ///
    /// Read: lock attempt; suspends the core when the mutex is held. Write:
    /// release, transferring the lock and the written value to the queue head
    /// if anyone is waiting.
    pub fn req(
        &mut self,
        bank: &mut CoreBank,
        offset: u64,
        req: &mut IoReq,
        core: usize,
    ) -> IoStatus {
        let id = (offset >> 2) as usize;
        let Some(mutex) = self.mutexes.get_mut(id) else {
            return IoStatus::Invalid;
        };
        trace!(
            "received mutex access (offset: {offset:#x}, mutex: {id}, core: {core}, is_write: {})",
            req.is_write
        );

        if req.is_write {
            mutex.value = req.data;
            if let Some(next) = mutex.waiting.pop_front() {
                // Hand the lock straight to the queue head: copy the value
                // into its stored access and wake it. `locked` stays set.
                trace!("transferring mutex lock (mutex: {id}, from: {core}, to: {next})");
                bank.store_result(next, mutex.value);
                bank.send_event(next, 1 << self.event_bit);
            } else {
                trace!("unlocking mutex (mutex: {id}, core: {core})");
                mutex.locked = false;
            }
            IoStatus::Ok
        } else if mutex.locked {
            trace!("mutex already locked, waiting (mutex: {id}, core: {core})");
            mutex.waiting.push_back(core);
            bank.arm_clear_mask(core, 1 << self.event_bit);
            bank.wait_event(core, req, CoreState::WaitingEvent)
        } else {
            trace!("locking mutex (mutex: {id}, core: {core})");
            mutex.locked = true;
            IoStatus::Ok
        }
    }
}

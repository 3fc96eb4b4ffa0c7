//! Barrier synchronization unit.
//!
//! Mask-based rendezvous: each barrier compares its arrived-status vector
//! against its participant vector after every mutation; on exact equality the
//! status is zeroed atomically and the barrier event bit is broadcast to every
//! core in the notify-target vector (which may include non-participants).

use tracing::trace;

use crate::common::access::{IoReq, IoStatus};
use crate::common::mask::CoreMask;
use crate::unit::core::{CoreBank, CoreState};
use crate::unit::regmap;

/// One hardware barrier: three equal-length core bit-vectors.
#[derive(Debug)]
struct Barrier {
    /// Cores that must arrive for the barrier to trip.
    core_mask: CoreMask,
    /// Cores that have arrived since the last trip.
    status: CoreMask,
    /// Cores notified when the barrier trips.
    target_mask: CoreMask,
}

impl Barrier {
    fn new(nb_cores: usize) -> Self {
        Self {
            core_mask: CoreMask::for_cores(nb_cores),
            status: CoreMask::for_cores(nb_cores),
            target_mask: CoreMask::for_cores(nb_cores),
        }
    }
}

/// All hardware barriers plus the event bit broadcast on a trip.
#[derive(Debug)]
pub struct BarrierUnit {
    barriers: Vec<Barrier>,
    event_bit: u32,
}

impl BarrierUnit {
    /// Allocates `nb_barriers` cleared barriers over `nb_cores` cores.
    pub fn new(nb_barriers: usize, nb_cores: usize, event_bit: u32) -> Self {
        Self {
            barriers: (0..nb_barriers).map(|_| Barrier::new(nb_cores)).collect(),
            event_bit,
        }
    }

    /// Zeroes all three vectors of every barrier.
    pub fn reset(&mut self) {
        for barrier in &mut self.barriers {
            barrier.core_mask.clear_all();
            barrier.status.clear_all();
            barrier.target_mask.clear_all();
        }
    }

    /// Re-checks one barrier after a mutation.
    fn check_barrier(&mut self, bank: &mut CoreBank, id: usize) {
        let reached = {
            let barrier = &self.barriers[id];
            barrier.status == barrier.core_mask
        };
        if reached {
            trace!("barrier reached, triggering event (barrier: {id})");
            self.barriers[id].status.clear_all();
            let targets = self.barriers[id].target_mask.clone();
            bank.trigger_event(1 << self.event_bit, &targets);
        }
    }

    /// Handles a barrier register access.
    ///
    /// `core` is the issuing core when the access came through the demux
    /// port, `None` on the direct port; the self/wait registers require it.
    pub fn req(
        &mut self,
        bank: &mut CoreBank,
        offset: u64,
        req: &mut IoReq,
        core: Option<usize>,
    ) -> IoStatus {
        let id = (offset / regmap::BARRIER_BLOCK_SIZE) as usize;
        if id >= self.barriers.len() {
            return IoStatus::Invalid;
        }
        let rel = offset % regmap::BARRIER_BLOCK_SIZE;
        let word = ((rel % regmap::MASK_REG_SIZE) >> 2) as usize;
        let is_write = req.is_write;

        if rel < regmap::BARRIER_CORE_MASK + regmap::MASK_REG_SIZE {
            if is_write {
                trace!("setting barrier core mask (barrier: {id}, mask: {:#x})", req.data);
                if !self.barriers[id].core_mask.set_word(word, req.data) {
                    return IoStatus::Invalid;
                }
                self.check_barrier(bank, id);
            } else {
                let Some(value) = self.barriers[id].core_mask.word(word) else {
                    return IoStatus::Invalid;
                };
                req.data = value;
            }
        } else if rel < regmap::BARRIER_STATUS + regmap::MASK_REG_SIZE {
            if is_write {
                trace!("setting barrier status (barrier: {id}, status: {:#x})", req.data);
                if !self.barriers[id].status.set_word(word, req.data) {
                    return IoStatus::Invalid;
                }
                self.check_barrier(bank, id);
            } else {
                let Some(value) = self.barriers[id].status.word(word) else {
                    return IoStatus::Invalid;
                };
                req.data = value;
            }
        } else if rel < regmap::BARRIER_STATUS_SUMMARY + regmap::MASK_REG_SIZE {
            // Aggregate view over every barrier except barrier 0.
            if is_write {
                return IoStatus::Invalid;
            }
            if word >= self.barriers[id].status.words() {
                return IoStatus::Invalid;
            }
            req.data = self
                .barriers
                .iter()
                .skip(1)
                .filter_map(|barrier| barrier.status.word(word))
                .fold(0, |acc, value| acc | value);
        } else if rel < regmap::BARRIER_TARGET_MASK + regmap::MASK_REG_SIZE {
            if is_write {
                trace!("setting barrier target mask (barrier: {id}, mask: {:#x})", req.data);
                if !self.barriers[id].target_mask.set_word(word, req.data) {
                    return IoStatus::Invalid;
                }
                self.check_barrier(bank, id);
            } else {
                let Some(value) = self.barriers[id].target_mask.word(word) else {
                    return IoStatus::Invalid;
                };
                req.data = value;
            }
        } else if rel < regmap::BARRIER_TRIGGER + regmap::MASK_REG_SIZE {
            if !is_write {
                return IoStatus::Invalid;
            }
            if !self.barriers[id].status.or_word(word, req.data) {
                return IoStatus::Invalid;
            }
            trace!("barrier mask trigger (barrier: {id}, mask: {:#x})", req.data);
            self.check_barrier(bank, id);
        } else if rel == regmap::BARRIER_TRIGGER_SELF {
            let Some(core) = core else {
                return IoStatus::Invalid;
            };
            self.barriers[id].status.set(core);
            trace!("barrier trigger (barrier: {id}, core: {core})");
            self.check_barrier(bank, id);
        } else if rel == regmap::BARRIER_TRIGGER_WAIT {
            let Some(core) = core else {
                return IoStatus::Invalid;
            };
            if bank.state(core) == CoreState::WaitingBarrier {
                // The core was already waiting on this barrier: it was pulled
                // out by an interrupt and is replaying the access. Its
                // arrived bit is already in, so just resume the sleep.
                trace!("resuming barrier trigger and wait (barrier: {id}, core: {core})");
            } else {
                self.barriers[id].status.set(core);
                trace!("barrier trigger and wait (barrier: {id}, core: {core})");
            }
            self.check_barrier(bank, id);
            return bank.wait_event(core, req, CoreState::WaitingBarrier);
        } else if rel == regmap::BARRIER_TRIGGER_WAIT_CLEAR {
            let Some(core) = core else {
                return IoStatus::Invalid;
            };
            if bank.state(core) == CoreState::WaitingBarrier {
                trace!("resuming barrier trigger, wait and clear (barrier: {id}, core: {core})");
            } else {
                self.barriers[id].status.set(core);
                trace!("barrier trigger, wait and clear (barrier: {id}, core: {core})");
            }
            bank.arm_clear_event_mask(core);
            self.check_barrier(bank, id);
            return bank.wait_event(core, req, CoreState::WaitingBarrier);
        } else {
            return IoStatus::Invalid;
        }
        IoStatus::Ok
    }
}

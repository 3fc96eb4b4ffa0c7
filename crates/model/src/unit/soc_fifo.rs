//! SoC-event FIFO unit.
//!
//! Bounded queue bridging asynchronous external event ids into the event
//! system. Arrival while full is a defined, silent drop. While the queue is
//! non-empty the configured event bit is broadcast to every core: once on
//! each push, and again after each pop that leaves entries behind, so waiting
//! consumers keep draining one read at a time.

use tracing::trace;

use crate::common::access::{IoReq, IoStatus};
use crate::unit::core::CoreBank;
use crate::unit::regmap;

/// Circular buffer of externally-sourced event ids.
#[derive(Debug)]
pub struct SocEventFifo {
    slots: Vec<u32>,
    head: usize,
    tail: usize,
    free: usize,
    /// Status bit broadcast while non-empty, or `None` to stay silent.
    event_bit: Option<u32>,
}

impl SocEventFifo {
    /// Allocates an empty FIFO of `depth` slots.
    pub fn new(depth: usize, event_bit: Option<u32>) -> Self {
        Self {
            slots: vec![0; depth],
            head: 0,
            tail: 0,
            free: depth,
            event_bit,
        }
    }

    /// Empties the FIFO without reallocating.
    pub fn reset(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.free = self.slots.len();
    }

    /// Broadcasts the configured event bit if the FIFO is non-empty.
    ///
    /// Also run by the top level after any status clear, so a consumer that
    /// clears the bit while entries remain is immediately re-armed.
    pub fn check_state(&self, bank: &mut CoreBank) {
        if let Some(bit) = self.event_bit {
            if self.free != self.slots.len() {
                trace!("generating FIFO event (bit: {bit})");
                bank.broadcast(1 << bit);
            }
        }
    }

    /// External event input: enqueue an id, or drop it silently when full.
    pub fn push(&mut self, bank: &mut CoreBank, event: u32) {
        trace!("received soc event (event: {event})");
        if self.free == 0 {
            trace!("FIFO full, dropping soc event (event: {event})");
            return;
        }
        self.free -= 1;
        self.slots[self.head] = event;
        self.head = (self.head + 1) % self.slots.len();
        self.check_state(bank);
    }

    /// Handles the pop register: read-only; an empty queue reads as 0, else
    /// the oldest id with the valid bit set.
    pub fn io_req(&mut self, bank: &mut CoreBank, req: &mut IoReq) -> IoStatus {
        if req.is_write {
            return IoStatus::Invalid;
        }
        if self.free == self.slots.len() {
            trace!("reading FIFO with no event");
            req.data = 0;
        } else {
            let event = self.slots[self.tail];
            trace!("popping event from FIFO (id: {event})");
            req.data = (1 << regmap::SOC_EVENT_VALID_BIT) | event;
            self.tail = (self.tail + 1) % self.slots.len();
            self.free += 1;
            self.check_state(bank);
        }
        IoStatus::Ok
    }
}

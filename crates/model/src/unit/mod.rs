//! Top-level event unit.
//!
//! This module assembles the peripheral and routes every access. It performs:
//! 1. **Routing:** Direct-port and per-core demux-port dispatch by offset
//!    range; 4-byte accesses only, unknown ranges INVALID.
//! 2. **Software events:** Trigger-all and the trigger-and-wait variants.
//! 3. **Time:** The tick loop that fires scheduled wakeups, and the FIFO
//!    re-arm pass run at the end of every step.
//! 4. **Wires:** External event, SoC event, and IRQ acknowledge inputs; IRQ
//!    line and clock-gate level outputs.

/// Barrier synchronization unit.
pub mod barrier;
/// Per-core synchronization state machine.
pub mod core;
/// Mutex arbitration unit.
pub mod mutex;
/// Flat register offset map.
pub mod regmap;
/// SoC-event FIFO unit.
pub mod soc_fifo;

use tracing::{trace, warn};

use crate::common::access::{Completion, IoReq, IoStatus};
use crate::config::{Config, ConfigError};
use crate::unit::barrier::BarrierUnit;
use crate::unit::core::{CoreBank, CoreState};
use crate::unit::mutex::MutexUnit;
use crate::unit::soc_fifo::SocEventFifo;

/// The cluster event/synchronization unit.
///
/// All structures are allocated once from the configuration; `reset` clears
/// transient state without reallocating. The host drives it with register
/// accesses ([`Self::req`] / [`Self::demux_req`]), external wires, and one
/// [`Self::tick`] per simulation tick, and collects resolved accesses from
/// [`Self::drain_completions`].
#[derive(Debug)]
pub struct EventUnit {
    bank: CoreBank,
    mutexes: MutexUnit,
    barriers: BarrierUnit,
    soc_fifo: SocEventFifo,
}

impl EventUnit {
    /// Builds the unit from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the configuration exceeds the register
    /// map capacities.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let nb_cores = config.cluster.nb_cores;
        Ok(Self {
            bank: CoreBank::new(nb_cores),
            mutexes: MutexUnit::new(config.cluster.nb_mutexes, config.events.mutex),
            barriers: BarrierUnit::new(config.cluster.nb_barriers, nb_cores, config.events.barrier),
            soc_fifo: SocEventFifo::new(config.cluster.fifo_depth, config.events.fifo),
        })
    }

    /// Number of cores the unit serves.
    pub fn nb_cores(&self) -> usize {
        self.bank.nb_cores()
    }

    /// Current tick.
    pub fn now(&self) -> u64 {
        self.bank.now()
    }

    /// Advances time by one tick, firing any wakeups that came due.
    pub fn tick(&mut self) {
        self.bank.tick();
        self.flush();
    }

    /// Advances time by `ticks` ticks.
    pub fn advance(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Clears all transient state: statuses, masks, queues, locks, the FIFO,
    /// and every scheduled wakeup. Suspended accesses are dropped without
    /// resolution; their issuers never see a completion.
    pub fn reset(&mut self) {
        self.bank.reset();
        self.mutexes.reset();
        self.barriers.reset();
        self.soc_fifo.reset();
    }

    /// Takes the accesses resolved since the last drain.
    pub fn drain_completions(&mut self) -> Vec<Completion> {
        self.bank.drain_completions()
    }

    /// Current level of a core's IRQ request line.
    pub fn irq_line(&self, core: usize) -> Option<u32> {
        self.bank.irq_line(core)
    }

    /// Clock-gate level of a core: `false` while it is stalled.
    pub fn is_active(&self, core: usize) -> bool {
        self.bank.is_active(core)
    }

    /// Direct slave port: handles a register access with no issuing core.
    pub fn req(&mut self, req: &mut IoReq) -> IoStatus {
        let status = self.route(req);
        self.flush();
        status
    }

    /// Per-core demultiplexed port: handles a register access issued by
    /// `core`, required for all core-identified operations.
    pub fn demux_req(&mut self, core: usize, req: &mut IoReq) -> IoStatus {
        let status = self.route_demux(core, req);
        self.flush();
        status
    }

    /// External SoC event input, feeding the FIFO unit.
    pub fn soc_event(&mut self, event: u32) {
        self.soc_fifo.push(&mut self.bank, event);
        self.flush();
    }

    /// Per-core input event wire: latches one status bit on one core.
    pub fn in_event(&mut self, core: usize, event: u32) {
        if core >= self.bank.nb_cores() || event >= 32 {
            warn!("ignoring input event out of range (core: {core}, event: {event})");
            return;
        }
        trace!("received input event (core: {core}, event: {event})");
        self.bank.send_event(core, 1 << event);
        self.flush();
    }

    /// Per-core IRQ acknowledge input.
    pub fn irq_ack(&mut self, core: usize, irq: u32) {
        if core >= self.bank.nb_cores() || irq >= 32 {
            warn!("ignoring IRQ acknowledge out of range (core: {core}, irq: {irq})");
            return;
        }
        self.bank.irq_ack(core, irq);
        self.flush();
    }

    /// End-of-step pass: while status bits were cleared, let the FIFO re-arm
    /// its non-empty event. Bounded: each iteration consumes a clear-on-wake
    /// mask, and broadcasts only set bits.
    fn flush(&mut self) {
        while self.bank.take_status_cleared() {
            self.soc_fifo.check_state(&mut self.bank);
        }
    }

    fn route(&mut self, req: &mut IoReq) -> IoStatus {
        let offset = req.offset;
        trace!(
            "event unit access (offset: {offset:#x}, size: {}, is_write: {})",
            req.size, req.is_write
        );
        if req.size != 4 {
            warn!("only 32-bit accesses are allowed (size: {})", req.size);
            return IoStatus::Invalid;
        }

        if (regmap::CORES_AREA_OFFSET..regmap::CORES_AREA_OFFSET + regmap::CORES_AREA_SIZE)
            .contains(&offset)
        {
            let rel = offset - regmap::CORES_AREA_OFFSET;
            let core = (rel / regmap::CORE_BLOCK_SIZE) as usize;
            if core >= self.bank.nb_cores() {
                return IoStatus::Invalid;
            }
            self.bank.core_req(core, rel % regmap::CORE_BLOCK_SIZE, req)
        } else if (regmap::SOC_EVENTS_AREA_OFFSET
            ..regmap::SOC_EVENTS_AREA_OFFSET + regmap::SOC_EVENTS_AREA_SIZE)
            .contains(&offset)
        {
            self.soc_fifo.io_req(&mut self.bank, req)
        } else if (regmap::SW_EVENTS_AREA_OFFSET
            ..regmap::SW_EVENTS_AREA_OFFSET + regmap::SW_EVENTS_AREA_SIZE)
            .contains(&offset)
        {
            self.sw_events_req(offset - regmap::SW_EVENTS_AREA_OFFSET, req, None)
        } else if (regmap::BARRIER_AREA_OFFSET
            ..regmap::BARRIER_AREA_OFFSET + regmap::BARRIER_AREA_SIZE)
            .contains(&offset)
        {
            self.barriers
                .req(&mut self.bank, offset - regmap::BARRIER_AREA_OFFSET, req, None)
        } else {
            IoStatus::Invalid
        }
    }

    fn route_demux(&mut self, core: usize, req: &mut IoReq) -> IoStatus {
        let offset = req.offset;
        trace!(
            "demux event unit access (core: {core}, offset: {offset:#x}, size: {}, is_write: {})",
            req.size, req.is_write
        );
        if req.size != 4 {
            warn!("only 32-bit accesses are allowed (size: {})", req.size);
            return IoStatus::Invalid;
        }
        if core >= self.bank.nb_cores() {
            return IoStatus::Invalid;
        }

        if (regmap::CORE_DEMUX_OFFSET..regmap::CORE_DEMUX_OFFSET + regmap::CORE_DEMUX_SIZE)
            .contains(&offset)
        {
            self.bank
                .core_req(core, offset - regmap::CORE_DEMUX_OFFSET, req)
        } else if (regmap::MUTEX_DEMUX_OFFSET
            ..regmap::MUTEX_DEMUX_OFFSET + regmap::MUTEX_DEMUX_SIZE)
            .contains(&offset)
        {
            self.mutexes
                .req(&mut self.bank, offset - regmap::MUTEX_DEMUX_OFFSET, req, core)
        } else if (regmap::SW_EVENTS_DEMUX_OFFSET
            ..regmap::SW_EVENTS_DEMUX_OFFSET + regmap::SW_EVENTS_DEMUX_SIZE)
            .contains(&offset)
        {
            self.sw_events_req(offset - regmap::SW_EVENTS_DEMUX_OFFSET, req, Some(core))
        } else if (regmap::BARRIER_DEMUX_OFFSET
            ..regmap::BARRIER_DEMUX_OFFSET + regmap::BARRIER_DEMUX_SIZE)
            .contains(&offset)
        {
            self.barriers
                .req(&mut self.bank, offset - regmap::BARRIER_DEMUX_OFFSET, req, Some(core))
        } else {
            // Includes the reserved window of the inactive dispatch block.
            IoStatus::Invalid
        }
    }

    /// Software event block, shared by both ports.
    ///
    /// `core` is the issuing core on the demux port; the wait variants are
    /// rejected without it.
    fn sw_events_req(&mut self, offset: u64, req: &mut IoReq, core: Option<usize>) -> IoStatus {
        if (regmap::SW_EVENT_TRIGGER..regmap::SW_EVENT_TRIGGER + regmap::SW_EVENT_TRIGGER_SIZE)
            .contains(&offset)
        {
            if !req.is_write {
                return IoStatus::Invalid;
            }
            trace!("sw event trigger (event_mask: {:#x})", req.data);
            self.bank.broadcast(req.data);
            IoStatus::Ok
        } else if (regmap::SW_EVENT_TRIGGER_WAIT..regmap::SW_EVENT_TRIGGER_WAIT_CLEAR)
            .contains(&offset)
        {
            let Some(core) = core.filter(|_| !req.is_write) else {
                warn!("sw event trigger-and-wait is a demux-only read");
                return IoStatus::Invalid;
            };
            let event = ((offset - regmap::SW_EVENT_TRIGGER_WAIT) >> 2) as u32;
            trace!("sw event trigger and wait (event: {event}, core: {core})");
            self.bank.broadcast(1 << event);
            self.bank.wait_event(core, req, CoreState::WaitingEvent)
        } else if (regmap::SW_EVENT_TRIGGER_WAIT_CLEAR..regmap::SW_EVENTS_AREA_SIZE)
            .contains(&offset)
        {
            let Some(core) = core.filter(|_| !req.is_write) else {
                warn!("sw event trigger-wait-clear is a demux-only read");
                return IoStatus::Invalid;
            };
            let event = ((offset - regmap::SW_EVENT_TRIGGER_WAIT_CLEAR) >> 2) as u32;
            trace!("sw event trigger, wait and clear (event: {event}, core: {core})");
            self.bank.broadcast(1 << event);
            self.bank.arm_clear_event_mask(core);
            self.bank.wait_event(core, req, CoreState::WaitingEvent)
        } else {
            IoStatus::Invalid
        }
    }
}

//! Per-core synchronization state machine.
//!
//! This module owns the hard core of the unit. It provides:
//! 1. **Per-core state:** Latched status, event/IRQ masks, the deferred
//!    clear-on-wake mask, and the clock-active flag.
//! 2. **Wait/wake protocol:** `wait_event` suspends an access; scheduled
//!    wakeups resolve it after the fixed 2-tick wake latency.
//! 3. **IRQ signaling:** The highest-priority pending IRQ index is driven on
//!    the per-core IRQ line, and re-driven only when it changes.
//! 4. **Ports:** [`CoreBank`] is the narrow capability sub-units use to raise
//!    event bits and suspend cores; they never see each other's state.

use tracing::trace;

use crate::common::access::{Completion, IoReq, IoStatus, ReqId};
use crate::common::mask::CoreMask;
use crate::sched::{Scheduler, WakeKind};
use crate::unit::regmap;

/// Cycles a core pays for a wait decision, even when the awaited event is
/// already latched: the clock-gate handshake runs before the reply comes back.
pub const WAKEUP_REQ_LATENCY: u64 = 6;

/// Cycles between an event arriving for a gated core and the clock being
/// handed back.
pub const WAKEUP_LATENCY: u64 = 2;

/// Wait/wake state of one core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreState {
    /// The core's clock is (or is about to be) running.
    Running,
    /// Suspended on a masked-event wait.
    WaitingEvent,
    /// Suspended on a barrier rendezvous.
    WaitingBarrier,
}

/// A register access suspended on behalf of a core.
///
/// `explicit_data` marks a result a sub-unit stored directly (the mutex value
/// handoff); otherwise the wakeup fills in the core's masked status.
#[derive(Debug, Clone)]
struct PendingReq {
    id: ReqId,
    data: u32,
    latency: u64,
    explicit_data: bool,
}

/// One core's slice of the event unit.
#[derive(Debug)]
pub struct CoreUnit {
    /// Latched event bits.
    status: u32,
    /// Bits that can wake the core from a wait.
    evt_mask: u32,
    /// Bits that assert the IRQ line.
    irq_mask: u32,
    /// Bits cleared from `status` on the next wake.
    clear_evt_mask: u32,
    /// Last IRQ index driven on the line; `None` after reset or acknowledge.
    sync_irq: Option<u32>,
    /// Current level of the IRQ request line.
    irq_line: Option<u32>,
    state: CoreState,
    /// Clock-gate level: `false` while the core's clock is stopped.
    active: bool,
    wakeup_enqueued: bool,
    irq_wakeup_enqueued: bool,
    pending: Option<PendingReq>,
}

impl CoreUnit {
    fn new() -> Self {
        Self {
            status: 0,
            evt_mask: 0,
            irq_mask: 0,
            clear_evt_mask: 0,
            sync_irq: None,
            irq_line: None,
            state: CoreState::Running,
            active: true,
            wakeup_enqueued: false,
            irq_wakeup_enqueued: false,
            pending: None,
        }
    }

    /// Back to the post-reset state. The pending access, if any, is dropped
    /// without ever being resolved; its issuer is stranded. This mirrors the
    /// hardware, which forgets in-flight wait handshakes on reset.
    fn reset(&mut self) {
        self.status = 0;
        self.evt_mask = 0;
        self.irq_mask = 0;
        self.clear_evt_mask = 0;
        self.sync_irq = None;
        self.irq_line = None;
        self.state = CoreState::Running;
        self.active = true;
        self.wakeup_enqueued = false;
        self.irq_wakeup_enqueued = false;
        self.pending = None;
    }
}

/// All cores plus the wakeup scheduler and the completion queue.
///
/// Sub-units (mutex, barrier, FIFO) hold no reference to the top-level unit;
/// they receive `&mut CoreBank` per call and act through its event/wait
/// surface only.
#[derive(Debug)]
pub struct CoreBank {
    cores: Vec<CoreUnit>,
    sched: Scheduler,
    completions: Vec<Completion>,
    /// Set whenever a status bit is cleared; the top level uses it to re-check
    /// the SoC-event FIFO at the end of the step.
    status_cleared: bool,
}

impl CoreBank {
    /// Allocates `nb_cores` idle cores.
    pub fn new(nb_cores: usize) -> Self {
        Self {
            cores: (0..nb_cores).map(|_| CoreUnit::new()).collect(),
            sched: Scheduler::new(),
            completions: Vec::new(),
            status_cleared: false,
        }
    }

    /// Number of cores in the bank.
    pub fn nb_cores(&self) -> usize {
        self.cores.len()
    }

    /// Current tick.
    pub fn now(&self) -> u64 {
        self.sched.now()
    }

    /// Resets every core and drops all scheduled wakeups. Completions already
    /// queued stay queued; pending accesses are abandoned unresolved.
    pub fn reset(&mut self) {
        for core in &mut self.cores {
            core.reset();
        }
        self.sched.clear();
        self.status_cleared = false;
    }

    /// Advances time by one tick and runs the wakeups that came due.
    pub fn tick(&mut self) {
        for (core, kind) in self.sched.tick() {
            match kind {
                WakeKind::Wakeup => self.wakeup(core),
                WakeKind::IrqWakeup => self.irq_wakeup(core),
            }
        }
    }

    /// Takes the queued completions, leaving the queue empty.
    pub fn drain_completions(&mut self) -> Vec<Completion> {
        std::mem::take(&mut self.completions)
    }

    /// Current level of a core's IRQ request line.
    pub fn irq_line(&self, core: usize) -> Option<u32> {
        self.cores[core].irq_line
    }

    /// Clock-gate level of a core.
    pub fn is_active(&self, core: usize) -> bool {
        self.cores[core].active
    }

    /// Wait/wake state of a core.
    pub(crate) fn state(&self, core: usize) -> CoreState {
        self.cores[core].state
    }

    /// Arms the deferred clear-on-wake mask of a core.
    pub(crate) fn arm_clear_mask(&mut self, core: usize, mask: u32) {
        self.cores[core].clear_evt_mask = mask;
    }

    /// Arms the deferred clear-on-wake mask with the core's full event mask.
    pub(crate) fn arm_clear_event_mask(&mut self, core: usize) {
        self.cores[core].clear_evt_mask = self.cores[core].evt_mask;
    }

    /// Stores an explicit result in a core's pending access; the wakeup will
    /// deliver it instead of the masked status.
    pub(crate) fn store_result(&mut self, core: usize, value: u32) {
        if let Some(pending) = &mut self.cores[core].pending {
            pending.data = value;
            pending.explicit_data = true;
        }
    }

    /// True once any status bit was cleared during the current step; reading
    /// resets the flag.
    pub(crate) fn take_status_cleared(&mut self) -> bool {
        std::mem::take(&mut self.status_cleared)
    }

    /// Raises event bits on one core and re-checks it.
    pub fn send_event(&mut self, core: usize, mask: u32) {
        trace!("triggering event (core: {core}, mask: {mask:#x})");
        self.cores[core].status |= mask;
        self.check_state(core);
    }

    /// Raises event bits on every core whose bit is set in `core_mask`.
    pub fn trigger_event(&mut self, event_mask: u32, core_mask: &CoreMask) {
        for core in 0..self.cores.len() {
            if core_mask.test(core) {
                self.send_event(core, event_mask);
            }
        }
    }

    /// Raises event bits on every core.
    pub fn broadcast(&mut self, mask: u32) {
        for core in 0..self.cores.len() {
            self.send_event(core, mask);
        }
    }

    /// Clears status bits on one core.
    fn clear_status(&mut self, core: usize, mask: u32) {
        self.cores[core].status &= !mask;
        self.status_cleared = true;
    }

    /// IRQ acknowledge input: clears the acknowledged bit, forgets the last
    /// driven index, and re-checks the core.
    pub fn irq_ack(&mut self, core: usize, irq: u32) {
        trace!("received IRQ acknowledgement (core: {core}, irq: {irq})");
        self.clear_status(core, 1 << irq);
        self.cores[core].sync_irq = None;
        self.check_state(core);
    }

    /// Applies and disarms the clear-on-wake mask.
    fn check_wait_mask(&mut self, core: usize) {
        let mask = self.cores[core].clear_evt_mask;
        if mask != 0 {
            self.clear_status(core, mask);
            trace!(
                "clear event after wake-up (core: {core}, mask: {mask:#x}, status: {:#x})",
                self.cores[core].status
            );
            self.cores[core].clear_evt_mask = 0;
        }
    }

    /// Gates the core's clock and stores the access for later resolution.
    pub(crate) fn put_to_sleep(
        &mut self,
        core: usize,
        req: &IoReq,
        wait_state: CoreState,
    ) -> IoStatus {
        trace!("gating clock (core: {core})");
        let unit = &mut self.cores[core];
        unit.state = wait_state;
        unit.active = false;
        unit.pending = Some(PendingReq {
            id: req.id,
            data: req.data,
            latency: req.latency,
            explicit_data: false,
        });
        IoStatus::Pending
    }

    /// The wait primitive: suspend until `status & evt_mask` is nonzero.
    ///
    /// The access always comes back asynchronously. If the masked status is
    /// already nonzero the core never sleeps, but the reply is still delayed
    /// by the wake latency and the request pays the full decision penalty.
    pub(crate) fn wait_event(
        &mut self,
        core: usize,
        req: &mut IoReq,
        wait_state: CoreState,
    ) -> IoStatus {
        trace!(
            "wait request (core: {core}, status: {:#x}, evt_mask: {:#x})",
            self.cores[core].status, self.cores[core].evt_mask
        );
        req.latency += WAKEUP_REQ_LATENCY;

        let unit = &self.cores[core];
        if unit.evt_mask & unit.status != 0 {
            // The event is already there; don't gate the clock, but still
            // apply a wait-and-clear and reply through the wakeup path.
            self.check_wait_mask(core);
            let unit = &mut self.cores[core];
            unit.pending = Some(PendingReq {
                id: req.id,
                data: req.data,
                latency: req.latency,
                explicit_data: false,
            });
            unit.wakeup_enqueued = true;
            self.sched.schedule_in(WAKEUP_LATENCY, core, WakeKind::Wakeup);
            IoStatus::Pending
        } else {
            self.put_to_sleep(core, req, wait_state)
        }
    }

    /// Generic wakeup: clock back on, resolve the pending access, re-check.
    fn wakeup(&mut self, core: usize) {
        trace!("replying to core after wakeup (core: {core})");
        let unit = &mut self.cores[core];
        unit.active = true;
        unit.wakeup_enqueued = false;
        if let Some(pending) = unit.pending.take() {
            let data = if pending.explicit_data {
                pending.data
            } else {
                unit.status & unit.evt_mask
            };
            self.completions.push(Completion {
                id: pending.id,
                data,
                latency: pending.latency,
            });
        }
        self.check_state(core);
    }

    /// IRQ wakeup: clock back on so the core can service the interrupt. The
    /// pending access stays stored; the core replays it after the handler.
    fn irq_wakeup(&mut self, core: usize) {
        trace!("IRQ wakeup (core: {core})");
        let unit = &mut self.cores[core];
        unit.active = true;
        unit.irq_wakeup_enqueued = false;
        self.check_state(core);
    }

    /// State re-check, run after any mutation of status, masks, or activity.
    pub(crate) fn check_state(&mut self, core: usize) {
        let unit = &self.cores[core];
        let irq_masked = unit.status & unit.irq_mask;
        let evt_masked = unit.status & unit.evt_mask;
        let irq = (irq_masked != 0).then(|| 31 - irq_masked.leading_zeros());

        trace!(
            "checking core state (core: {core}, active: {}, status: {:#x}, evt_mask: {:#x}, irq_mask: {:#x})",
            unit.active, unit.status, unit.evt_mask, unit.irq_mask
        );

        if unit.active {
            if irq != unit.sync_irq {
                trace!("updating irq req (core: {core}, irq: {irq:?})");
                let unit = &mut self.cores[core];
                unit.sync_irq = irq;
                unit.irq_line = irq;
            }
        } else if irq_masked != 0 && evt_masked == 0 {
            // An IRQ is pending but no event: wake the core just for the
            // handler. The wait state is kept so the replayed access resumes
            // the on-going synchronization.
            if !unit.irq_wakeup_enqueued {
                trace!("activating clock for IRQ handling (core: {core})");
                self.sched
                    .schedule_in(WAKEUP_LATENCY, core, WakeKind::IrqWakeup);
                let unit = &mut self.cores[core];
                unit.irq_wakeup_enqueued = true;
                unit.sync_irq = None;
            }
        } else if matches!(
            unit.state,
            CoreState::WaitingEvent | CoreState::WaitingBarrier
        ) && evt_masked != 0
        {
            trace!("activating clock (core: {core})");
            self.cores[core].state = CoreState::Running;
            self.check_wait_mask(core);
            if !self.cores[core].wakeup_enqueued {
                self.cores[core].wakeup_enqueued = true;
                self.sched.schedule_in(WAKEUP_LATENCY, core, WakeKind::Wakeup);
            }
        }
    }

    /// Handles an access to one core's register block.
    pub(crate) fn core_req(&mut self, core: usize, offset: u64, req: &mut IoReq) -> IoStatus {
        let is_write = req.is_write;
        match offset {
            regmap::CORE_MASK => {
                if is_write {
                    self.cores[core].evt_mask = req.data;
                    trace!("updating event mask (core: {core}, new_value: {:#x})", req.data);
                    self.check_state(core);
                } else {
                    req.data = self.cores[core].evt_mask;
                }
            }
            regmap::CORE_MASK_AND => {
                if !is_write {
                    return IoStatus::Invalid;
                }
                self.cores[core].evt_mask &= !req.data;
                trace!(
                    "clearing event mask (core: {core}, mask: {:#x}, new_value: {:#x})",
                    req.data, self.cores[core].evt_mask
                );
                self.check_state(core);
            }
            regmap::CORE_MASK_OR => {
                if !is_write {
                    return IoStatus::Invalid;
                }
                self.cores[core].evt_mask |= req.data;
                trace!(
                    "setting event mask (core: {core}, mask: {:#x}, new_value: {:#x})",
                    req.data, self.cores[core].evt_mask
                );
                self.check_state(core);
            }
            regmap::CORE_MASK_IRQ => {
                if is_write {
                    self.cores[core].irq_mask = req.data;
                    trace!("updating irq mask (core: {core}, new_value: {:#x})", req.data);
                    self.check_state(core);
                } else {
                    req.data = self.cores[core].irq_mask;
                }
            }
            regmap::CORE_MASK_IRQ_AND => {
                if !is_write {
                    return IoStatus::Invalid;
                }
                self.cores[core].irq_mask &= !req.data;
                trace!(
                    "clearing irq mask (core: {core}, mask: {:#x}, new_value: {:#x})",
                    req.data, self.cores[core].irq_mask
                );
                self.check_state(core);
            }
            regmap::CORE_MASK_IRQ_OR => {
                if !is_write {
                    return IoStatus::Invalid;
                }
                self.cores[core].irq_mask |= req.data;
                trace!(
                    "setting irq mask (core: {core}, mask: {:#x}, new_value: {:#x})",
                    req.data, self.cores[core].irq_mask
                );
                self.check_state(core);
            }
            regmap::CORE_STATUS => {
                if is_write {
                    return IoStatus::Invalid;
                }
                req.data = u32::from(self.cores[core].active);
            }
            regmap::CORE_BUFFER => {
                if is_write {
                    return IoStatus::Invalid;
                }
                req.data = self.cores[core].status;
            }
            regmap::CORE_BUFFER_MASKED => {
                if is_write {
                    return IoStatus::Invalid;
                }
                req.data = self.cores[core].status & self.cores[core].evt_mask;
            }
            regmap::CORE_BUFFER_IRQ_MASKED => {
                if is_write {
                    return IoStatus::Invalid;
                }
                req.data = self.cores[core].status & self.cores[core].irq_mask;
            }
            regmap::CORE_BUFFER_CLEAR => {
                if !is_write {
                    return IoStatus::Invalid;
                }
                self.clear_status(core, req.data);
                trace!(
                    "clearing buffer status (core: {core}, mask: {:#x}, new_value: {:#x})",
                    req.data, self.cores[core].status
                );
                self.check_state(core);
            }
            regmap::CORE_EVENT_WAIT => {
                if is_write {
                    return IoStatus::Invalid;
                }
                return self.wait_event(core, req, CoreState::WaitingEvent);
            }
            regmap::CORE_EVENT_WAIT_CLEAR => {
                if is_write {
                    return IoStatus::Invalid;
                }
                self.arm_clear_event_mask(core);
                return self.wait_event(core, req, CoreState::WaitingEvent);
            }
            _ => return IoStatus::Invalid,
        }
        IoStatus::Ok
    }
}

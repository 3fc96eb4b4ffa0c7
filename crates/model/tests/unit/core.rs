//! # Core State Machine Tests
//!
//! Unit tests for the per-core synchronization state machine: mask register
//! variants, masked status views, the wait/wake protocol with its fixed
//! latencies, IRQ priority signaling, IRQ-only wakeups, and the abrupt
//! cancellation of suspended accesses on reset.

use pretty_assertions::assert_eq;

use crate::common::TestContext;
use eusim_core::IoStatus;
use eusim_core::unit::core::{WAKEUP_LATENCY, WAKEUP_REQ_LATENCY};
use eusim_core::unit::regmap;

/// Event mask AND/OR variants mutate the mask atomically; plain access reads
/// it back.
#[test]
fn event_mask_set_and_clear_variants() {
    let mut ctx = TestContext::new();
    let mask_reg = TestContext::core_reg(0, regmap::CORE_MASK);

    assert_eq!(ctx.write(mask_reg, 0xF0), IoStatus::Ok);
    assert_eq!(
        ctx.write(TestContext::core_reg(0, regmap::CORE_MASK_AND), 0x30),
        IoStatus::Ok
    );
    assert_eq!(ctx.read(mask_reg), (IoStatus::Ok, 0xC0));
    assert_eq!(
        ctx.write(TestContext::core_reg(0, regmap::CORE_MASK_OR), 0x0F),
        IoStatus::Ok
    );
    assert_eq!(ctx.read(mask_reg), (IoStatus::Ok, 0xCF));
}

/// Reads of write-only registers and writes of read-only registers are
/// rejected without side effects.
#[test]
fn register_direction_rules() {
    let mut ctx = TestContext::new();

    let ro = [
        regmap::CORE_STATUS,
        regmap::CORE_BUFFER,
        regmap::CORE_BUFFER_MASKED,
        regmap::CORE_BUFFER_IRQ_MASKED,
        regmap::CORE_EVENT_WAIT,
        regmap::CORE_EVENT_WAIT_CLEAR,
    ];
    for reg in ro {
        let status = ctx.write(TestContext::core_reg(0, reg), 1);
        assert_eq!(status, IoStatus::Invalid, "write to read-only {reg:#x}");
    }

    let wo = [
        regmap::CORE_MASK_AND,
        regmap::CORE_MASK_OR,
        regmap::CORE_MASK_IRQ_AND,
        regmap::CORE_MASK_IRQ_OR,
        regmap::CORE_BUFFER_CLEAR,
    ];
    for reg in wo {
        let (status, _) = ctx.read(TestContext::core_reg(0, reg));
        assert_eq!(status, IoStatus::Invalid, "read of write-only {reg:#x}");
    }
}

/// The masked status views apply the event and IRQ masks; buffer-clear drops
/// latched bits.
#[test]
fn masked_status_views() {
    let mut ctx = TestContext::new();
    ctx.set_evt_mask(0, 0b0011);
    ctx.set_irq_mask(0, 0b0110);
    ctx.eu.in_event(0, 1);
    ctx.eu.in_event(0, 2);

    assert_eq!(ctx.core_status(0), 0b0110);
    let (_, masked) = ctx.read(TestContext::core_reg(0, regmap::CORE_BUFFER_MASKED));
    assert_eq!(masked, 0b0010);
    let (_, irq_masked) = ctx.read(TestContext::core_reg(0, regmap::CORE_BUFFER_IRQ_MASKED));
    assert_eq!(irq_masked, 0b0110);

    let status = ctx.write(TestContext::core_reg(0, regmap::CORE_BUFFER_CLEAR), 0b0010);
    assert_eq!(status, IoStatus::Ok);
    assert_eq!(ctx.core_status(0), 0b0100);
}

/// A wait issued while the awaited event is already latched never gates the
/// clock, but still pays the decision penalty and replies after the wake
/// latency.
#[test]
fn wait_with_event_present_skips_sleep() {
    let mut ctx = TestContext::new();
    ctx.set_evt_mask(0, 0x1);
    ctx.eu.in_event(0, 0);

    let (status, _, id) = ctx.demux_read(0, regmap::CORE_EVENT_WAIT);
    assert_eq!(status, IoStatus::Pending);
    assert!(ctx.eu.is_active(0), "clock must stay on");

    ctx.step(WAKEUP_LATENCY - 1);
    assert!(ctx.take_completions().is_empty());
    ctx.step(1);

    let completions = ctx.take_completions();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].id, id);
    assert_eq!(completions[0].data, 0x1);
    assert_eq!(completions[0].latency, WAKEUP_REQ_LATENCY);
}

/// A wait with no matching event gates the clock and resolves exactly once,
/// exactly the wake latency after a matching bit is raised.
#[test]
fn wait_suspends_until_event() {
    let mut ctx = TestContext::new();
    ctx.set_evt_mask(0, 0x1);

    let (status, _, id) = ctx.demux_read(0, regmap::CORE_EVENT_WAIT);
    assert_eq!(status, IoStatus::Pending);
    assert!(!ctx.eu.is_active(0), "clock must be gated");

    ctx.step(5);
    assert!(ctx.take_completions().is_empty(), "nothing may fire early");

    ctx.eu.in_event(0, 0);
    ctx.step(WAKEUP_LATENCY - 1);
    assert!(ctx.take_completions().is_empty());
    ctx.step(1);

    let completions = ctx.take_completions();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].id, id);
    assert_eq!(completions[0].data, 0x1);
    assert!(ctx.eu.is_active(0));

    ctx.step(20);
    assert!(ctx.take_completions().is_empty(), "must resolve exactly once");
}

/// Wait-and-clear arms the full event mask for clear-on-wake: the matched
/// bits are gone from the latched status before the core sees the reply.
#[test]
fn wait_clear_clears_matched_bits_on_wake() {
    let mut ctx = TestContext::new();
    ctx.set_evt_mask(0, 0x3);
    ctx.eu.in_event(0, 0);

    let (status, _, _) = ctx.demux_read(0, regmap::CORE_EVENT_WAIT_CLEAR);
    assert_eq!(status, IoStatus::Pending);
    ctx.step(WAKEUP_LATENCY);

    let completions = ctx.take_completions();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].data, 0, "matched bits cleared before the reply");
    assert_eq!(ctx.core_status(0), 0);
}

/// The IRQ line always carries the highest set bit of the IRQ-masked status,
/// and is only re-driven when that index changes.
#[test]
fn irq_line_follows_highest_priority_bit() {
    let mut ctx = TestContext::new();
    ctx.set_irq_mask(0, 0b1010);

    assert_eq!(ctx.eu.irq_line(0), None);
    ctx.eu.in_event(0, 1);
    assert_eq!(ctx.eu.irq_line(0), Some(1));
    ctx.eu.in_event(0, 3);
    assert_eq!(ctx.eu.irq_line(0), Some(3));

    // Bit 2 is not IRQ-masked; the computed index is unchanged.
    ctx.eu.in_event(0, 2);
    assert_eq!(ctx.eu.irq_line(0), Some(3));
}

/// Acknowledging an IRQ clears its status bit and lets the next-highest
/// pending IRQ be signaled.
#[test]
fn irq_ack_clears_and_resignals() {
    let mut ctx = TestContext::new();
    ctx.set_irq_mask(0, 0b1010);
    ctx.eu.in_event(0, 1);
    ctx.eu.in_event(0, 3);
    assert_eq!(ctx.eu.irq_line(0), Some(3));

    ctx.eu.irq_ack(0, 3);
    assert_eq!(ctx.core_status(0), 0b0010);
    assert_eq!(ctx.eu.irq_line(0), Some(1));

    // The line is level-typed and only re-driven on change: after the last
    // acknowledge no new index is computed, so the level is left as is.
    ctx.eu.irq_ack(0, 1);
    assert_eq!(ctx.core_status(0), 0);
    assert_eq!(ctx.eu.irq_line(0), Some(1));
}

/// An IRQ arriving for a sleeping core wakes the clock after the wake
/// latency without resolving the suspended access; the access is replayed
/// after the handler and resumes the wait.
#[test]
fn irq_wakeup_leaves_pending_access_untouched() {
    let mut ctx = TestContext::new();
    ctx.set_evt_mask(0, 0x1);
    ctx.set_irq_mask(0, 0x2);

    let (status, _, id) = ctx.demux_read(0, regmap::CORE_EVENT_WAIT);
    assert_eq!(status, IoStatus::Pending);
    assert!(!ctx.eu.is_active(0));

    ctx.eu.in_event(0, 1);
    ctx.step(WAKEUP_LATENCY);
    assert!(ctx.eu.is_active(0), "clock handed back for the handler");
    assert_eq!(ctx.eu.irq_line(0), Some(1));
    assert!(ctx.take_completions().is_empty(), "wait not resolved by the IRQ");

    // Handler runs, acknowledges, and the core replays the original access.
    ctx.eu.irq_ack(0, 1);
    let (status, _) = ctx.demux_read_as(0, regmap::CORE_EVENT_WAIT, id);
    assert_eq!(status, IoStatus::Pending);
    assert!(!ctx.eu.is_active(0));

    ctx.eu.in_event(0, 0);
    ctx.step(WAKEUP_LATENCY);
    let completions = ctx.take_completions();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].id, id);
    assert_eq!(completions[0].data, 0x1);
}

/// Reset drops a suspended access without resolving it: the issuer is
/// stranded. This is the hardware behavior, preserved deliberately.
#[test]
fn reset_strands_suspended_waiter() {
    let mut ctx = TestContext::new();
    ctx.set_evt_mask(1, 0x1);
    let (status, _, _) = ctx.demux_read(1, regmap::CORE_EVENT_WAIT);
    assert_eq!(status, IoStatus::Pending);

    ctx.eu.reset();
    assert!(ctx.eu.is_active(1));
    assert_eq!(ctx.read(TestContext::core_reg(1, regmap::CORE_MASK)), (IoStatus::Ok, 0));

    ctx.eu.in_event(1, 0);
    ctx.step(50);
    assert!(ctx.take_completions().is_empty(), "the waiter must stay stranded");
}

/// Reset also cancels an in-flight wakeup that was already scheduled.
#[test]
fn reset_cancels_scheduled_wakeup() {
    let mut ctx = TestContext::new();
    ctx.set_evt_mask(0, 0x1);
    ctx.eu.in_event(0, 0);
    let (status, _, _) = ctx.demux_read(0, regmap::CORE_EVENT_WAIT);
    assert_eq!(status, IoStatus::Pending);

    ctx.eu.reset();
    ctx.step(10);
    assert!(ctx.take_completions().is_empty());
}

/// The active-flag register tracks the clock gate.
#[test]
fn active_flag_register() {
    let mut ctx = TestContext::new();
    let reg = TestContext::core_reg(2, regmap::CORE_STATUS);
    assert_eq!(ctx.read(reg), (IoStatus::Ok, 1));

    ctx.set_evt_mask(2, 0x1);
    let (status, _, _) = ctx.demux_read(2, regmap::CORE_EVENT_WAIT);
    assert_eq!(status, IoStatus::Pending);
    assert_eq!(ctx.read(reg), (IoStatus::Ok, 0));

    ctx.eu.in_event(2, 0);
    ctx.step(WAKEUP_LATENCY);
    assert_eq!(ctx.read(reg), (IoStatus::Ok, 1));
}

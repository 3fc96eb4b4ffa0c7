//! # Mutex Arbitration Tests
//!
//! Unit tests for the hardware mutexes: uncontended lock/release, FIFO-fair
//! ownership transfer with the 32-bit value handoff, and id bounds.

use pretty_assertions::assert_eq;

use crate::common::TestContext;
use eusim_core::IoStatus;
use eusim_core::config::EventConfig;
use eusim_core::unit::core::WAKEUP_LATENCY;
use eusim_core::unit::regmap;

/// Demux-port offset of one mutex register.
fn mutex_reg(id: usize) -> u64 {
    regmap::MUTEX_DEMUX_OFFSET + id as u64 * 4
}

/// An uncontended read takes the lock immediately; a release with an empty
/// queue opens it again.
#[test]
fn uncontended_lock_and_release() {
    let mut ctx = TestContext::new();

    let (status, _, _) = ctx.demux_read(0, mutex_reg(0));
    assert_eq!(status, IoStatus::Ok);
    assert!(ctx.eu.is_active(0), "no contention, no stall");

    assert_eq!(ctx.demux_write(0, mutex_reg(0), 0), IoStatus::Ok);

    // The lock is open again: another core takes it without stalling.
    let (status, _, _) = ctx.demux_read(1, mutex_reg(0));
    assert_eq!(status, IoStatus::Ok);
}

/// Contended locks move from core to core in arrival order, each transfer
/// delivering the released value to the new owner.
#[test]
fn fifo_transfer_carries_released_value() {
    let mut ctx = TestContext::new();
    let mutex_bit = 1 << EventConfig::default().mutex;
    for core in 0..3 {
        ctx.set_evt_mask(core, mutex_bit);
    }

    let (status, _, _) = ctx.demux_read(0, mutex_reg(0));
    assert_eq!(status, IoStatus::Ok);

    let (status, _, id1) = ctx.demux_read(1, mutex_reg(0));
    assert_eq!(status, IoStatus::Pending);
    assert!(!ctx.eu.is_active(1));
    let (status, _, id2) = ctx.demux_read(2, mutex_reg(0));
    assert_eq!(status, IoStatus::Pending);
    assert!(!ctx.eu.is_active(2));

    // Core 0 releases with a value: core 1 is the queue head and receives it.
    assert_eq!(ctx.demux_write(0, mutex_reg(0), 100), IoStatus::Ok);
    ctx.step(WAKEUP_LATENCY);
    let completions = ctx.take_completions();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].id, id1);
    assert_eq!(completions[0].data, 100);
    assert!(ctx.eu.is_active(1));
    assert!(!ctx.eu.is_active(2), "core 2 still queued");

    // Core 1 passes it on to core 2.
    assert_eq!(ctx.demux_write(1, mutex_reg(0), 200), IoStatus::Ok);
    ctx.step(WAKEUP_LATENCY);
    let completions = ctx.take_completions();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].id, id2);
    assert_eq!(completions[0].data, 200);

    // Final release with an empty queue opens the lock.
    assert_eq!(ctx.demux_write(2, mutex_reg(0), 0), IoStatus::Ok);
    let (status, _, _) = ctx.demux_read(0, mutex_reg(0));
    assert_eq!(status, IoStatus::Ok);
}

/// The notification bit is consumed by the wake and does not linger in the
/// new owner's status.
#[test]
fn transfer_event_bit_is_consumed() {
    let mut ctx = TestContext::new();
    let mutex_bit = 1 << EventConfig::default().mutex;
    ctx.set_evt_mask(1, mutex_bit);

    let (status, _, _) = ctx.demux_read(0, mutex_reg(1));
    assert_eq!(status, IoStatus::Ok);
    let (status, _, _) = ctx.demux_read(1, mutex_reg(1));
    assert_eq!(status, IoStatus::Pending);

    assert_eq!(ctx.demux_write(0, mutex_reg(1), 7), IoStatus::Ok);
    ctx.step(WAKEUP_LATENCY);
    assert_eq!(ctx.take_completions().len(), 1);
    assert_eq!(ctx.core_status(1) & mutex_bit, 0);
}

/// Accesses beyond the configured mutex count are rejected.
#[test]
fn out_of_range_id_is_invalid() {
    let mut ctx = TestContext::new();
    let (status, _, _) = ctx.demux_read(0, mutex_reg(2));
    assert_eq!(status, IoStatus::Invalid);
    assert_eq!(ctx.demux_write(0, mutex_reg(2), 0), IoStatus::Invalid);
}

/// Reset opens every lock; a queued waiter is stranded, not resolved.
#[test]
fn reset_opens_locks_and_strands_waiters() {
    let mut ctx = TestContext::new();
    let mutex_bit = 1 << EventConfig::default().mutex;
    ctx.set_evt_mask(1, mutex_bit);

    let (status, _, _) = ctx.demux_read(0, mutex_reg(0));
    assert_eq!(status, IoStatus::Ok);
    let (status, _, _) = ctx.demux_read(1, mutex_reg(0));
    assert_eq!(status, IoStatus::Pending);

    ctx.eu.reset();
    let (status, _, _) = ctx.demux_read(2, mutex_reg(0));
    assert_eq!(status, IoStatus::Ok, "lock must be open after reset");

    ctx.step(50);
    assert!(ctx.take_completions().is_empty(), "the waiter must stay stranded");
}

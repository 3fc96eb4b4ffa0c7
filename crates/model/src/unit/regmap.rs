//! Flat register offset map for both access ports.
//!
//! # Direct port memory map
//!
//! * `0x0000`: Per-core register blocks (0x40 bytes per core)
//! * `0x4000`: SoC-event FIFO pop register
//! * `0x6000`: Software event trigger block
//! * `0x8000`: Per-barrier register blocks (0x100 bytes per barrier)
//!
//! # Per-core demultiplexed port memory map
//!
//! * `0x000`: The issuing core's own register block
//! * `0x080`: Reserved (inactive value-dispatch block, always INVALID)
//! * `0x0C0`: Mutex registers (4 bytes per mutex id)
//! * `0x100`: Software event trigger block (wait variants live here)
//! * `0x200`: Per-barrier register blocks

/// Base offset of the per-core area on the direct port.
pub const CORES_AREA_OFFSET: u64 = 0x0000;
/// Size of the per-core area.
pub const CORES_AREA_SIZE: u64 = 0x4000;
/// Size of one core's register block.
pub const CORE_BLOCK_SIZE: u64 = 0x40;

/// Base offset of the SoC-event FIFO register on the direct port.
pub const SOC_EVENTS_AREA_OFFSET: u64 = 0x4000;
/// Size of the SoC-event FIFO area (one pop register).
pub const SOC_EVENTS_AREA_SIZE: u64 = 0x4;

/// Base offset of the software event block on the direct port.
pub const SW_EVENTS_AREA_OFFSET: u64 = 0x6000;
/// Size of the software event block.
pub const SW_EVENTS_AREA_SIZE: u64 = 0xC0;

/// Base offset of the barrier area on the direct port.
pub const BARRIER_AREA_OFFSET: u64 = 0x8000;
/// Size of the barrier area.
pub const BARRIER_AREA_SIZE: u64 = 0x1000;
/// Size of one barrier's register block.
pub const BARRIER_BLOCK_SIZE: u64 = 0x100;

/// Offset of the issuing core's register block on the demux port.
pub const CORE_DEMUX_OFFSET: u64 = 0x000;
/// Size of the demuxed core block.
pub const CORE_DEMUX_SIZE: u64 = 0x40;
/// Reserved demux window of the inactive value-dispatch block.
pub const DISPATCH_DEMUX_OFFSET: u64 = 0x080;
/// Size of the reserved dispatch window.
pub const DISPATCH_DEMUX_SIZE: u64 = 0x40;
/// Offset of the mutex registers on the demux port.
pub const MUTEX_DEMUX_OFFSET: u64 = 0x0C0;
/// Size of the mutex window (one 4-byte register per mutex).
pub const MUTEX_DEMUX_SIZE: u64 = 0x40;
/// Offset of the software event block on the demux port.
pub const SW_EVENTS_DEMUX_OFFSET: u64 = 0x100;
/// Size of the demuxed software event block.
pub const SW_EVENTS_DEMUX_SIZE: u64 = 0xC0;
/// Offset of the barrier area on the demux port.
pub const BARRIER_DEMUX_OFFSET: u64 = 0x200;
/// Size of the demuxed barrier area.
pub const BARRIER_DEMUX_SIZE: u64 = 0x1000;

/// Event mask, read/write.
pub const CORE_MASK: u64 = 0x00;
/// Event mask atomic clear-bits, write-only.
pub const CORE_MASK_AND: u64 = 0x04;
/// Event mask atomic set-bits, write-only.
pub const CORE_MASK_OR: u64 = 0x08;
/// IRQ mask, read/write.
pub const CORE_MASK_IRQ: u64 = 0x0C;
/// IRQ mask atomic clear-bits, write-only.
pub const CORE_MASK_IRQ_AND: u64 = 0x10;
/// IRQ mask atomic set-bits, write-only.
pub const CORE_MASK_IRQ_OR: u64 = 0x14;
/// Core clock-active flag, read-only.
pub const CORE_STATUS: u64 = 0x18;
/// Raw latched event status, read-only.
pub const CORE_BUFFER: u64 = 0x1C;
/// Status masked by the event mask, read-only.
pub const CORE_BUFFER_MASKED: u64 = 0x20;
/// Status masked by the IRQ mask, read-only.
pub const CORE_BUFFER_IRQ_MASKED: u64 = 0x24;
/// Status clear-bits, write-only.
pub const CORE_BUFFER_CLEAR: u64 = 0x28;
/// Wait for a masked event, read-only, may suspend.
pub const CORE_EVENT_WAIT: u64 = 0x38;
/// Wait for a masked event and clear it on wake, read-only, may suspend.
pub const CORE_EVENT_WAIT_CLEAR: u64 = 0x3C;

/// Software event trigger-all window (write-only; payload is an event mask).
pub const SW_EVENT_TRIGGER: u64 = 0x00;
/// Size of the trigger-all window.
pub const SW_EVENT_TRIGGER_SIZE: u64 = 0x40;
/// Trigger-and-wait window (demux-only reads; event index from the offset).
pub const SW_EVENT_TRIGGER_WAIT: u64 = 0x40;
/// Trigger-wait-clear window (demux-only reads).
pub const SW_EVENT_TRIGGER_WAIT_CLEAR: u64 = 0x80;

/// Byte span of one multi-word mask register window.
pub const MASK_REG_SIZE: u64 = 0x20;
/// Barrier participant mask window, read/write.
pub const BARRIER_CORE_MASK: u64 = 0x00;
/// Barrier arrived-status window, read/write.
pub const BARRIER_STATUS: u64 = 0x20;
/// OR of the arrived status of every barrier except barrier 0, read-only.
pub const BARRIER_STATUS_SUMMARY: u64 = 0x40;
/// Barrier notify-target mask window, read/write.
pub const BARRIER_TARGET_MASK: u64 = 0x60;
/// Barrier trigger window (OR bits into arrived status), write-only.
pub const BARRIER_TRIGGER: u64 = 0x80;
/// Set the issuing core's arrived bit; demux-only.
pub const BARRIER_TRIGGER_SELF: u64 = 0xA0;
/// Set the issuing core's arrived bit and wait; demux-only, may suspend.
pub const BARRIER_TRIGGER_WAIT: u64 = 0xA4;
/// Trigger-wait with clear-on-wake armed; demux-only, may suspend.
pub const BARRIER_TRIGGER_WAIT_CLEAR: u64 = 0xA8;

/// Bit set in a SoC-event FIFO pop result when an event id was dequeued.
pub const SOC_EVENT_VALID_BIT: u32 = 31;

/// Most cores the direct-port area can address.
pub const MAX_CORES: usize = (CORES_AREA_SIZE / CORE_BLOCK_SIZE) as usize;
/// Most mutexes the demux window can address.
pub const MAX_MUTEXES: usize = (MUTEX_DEMUX_SIZE / 4) as usize;
/// Most barriers the barrier areas can address.
pub const MAX_BARRIERS: usize = (BARRIER_AREA_SIZE / BARRIER_BLOCK_SIZE) as usize;

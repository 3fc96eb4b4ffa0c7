//! Cluster event unit model.
//!
//! This crate implements a tick-accurate behavioral model of a multi-core
//! cluster's event/synchronization peripheral with the following:
//! 1. **Core state machines:** Per-core event/IRQ masks, latched status, and
//!    the suspend/resume protocol with hardware-faithful fixed latencies.
//! 2. **Mutexes:** FIFO-fair lock transfer carrying a 32-bit value.
//! 3. **Barriers:** Mask-based rendezvous with separate notify targets.
//! 4. **SoC-event FIFO:** Bounded external event queue with silent overflow.
//! 5. **Routing:** A direct slave port and per-core demultiplexed ports over
//!    a flat 32-bit register map.
//!
//! Execution is single-threaded and cooperative: the host issues register
//! accesses and advances time one tick at a time; suspended accesses resolve
//! through the completion queue once their scheduled wakeup fires.

/// Common types (access protocol, core masks).
pub mod common;
/// Model configuration (cluster geometry, reserved event bits).
pub mod config;
/// Discrete-tick wakeup scheduler.
pub mod sched;
/// The event unit itself (router, cores, mutexes, barriers, FIFO).
pub mod unit;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Access protocol types used at the unit's ports.
pub use crate::common::access::{Completion, IoReq, IoStatus, ReqId};
/// Top-level unit; construct with `EventUnit::new`.
pub use crate::unit::EventUnit;

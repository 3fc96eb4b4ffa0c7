//! Register access protocol.
//!
//! This module defines how a host engine talks to the event unit. It provides:
//! 1. **Requests:** `IoReq`, a 32-bit register access with offset, direction,
//!    payload, and accumulated latency.
//! 2. **Statuses:** `IoStatus`, the synchronous outcome of an access.
//! 3. **Completions:** `Completion`, the deferred resolution of a `Pending`
//!    access, delivered through the unit's completion queue.
//!
//! There is no blocking anywhere: an access that must stall the issuing core
//! returns [`IoStatus::Pending`] and is resolved later, once the scheduled
//! wakeup fires, as a [`Completion`] carrying the same [`ReqId`].

use std::fmt;

/// Host-assigned identifier of a register access.
///
/// The unit never interprets the value; it only echoes it back in the
/// [`Completion`] that resolves a pending access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReqId(pub u64);

impl fmt::Display for ReqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req#{}", self.0)
    }
}

/// Synchronous outcome of a register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoStatus {
    /// The access completed within this step; read data is in `IoReq::data`.
    Ok,
    /// The access was rejected: bad size, unknown offset, wrong direction,
    /// wrong port, or an out-of-range mutex/barrier id. No state changed
    /// beyond what the handler already committed.
    Invalid,
    /// The access suspended the issuing core; a [`Completion`] with the same
    /// id will be queued once the core is woken up.
    Pending,
}

/// A 32-bit register access presented to the event unit.
///
/// `data` is the write payload on the way in and the read result on the way
/// out. `latency` accumulates the extra cycles the access cost beyond plain
/// routing (the 6-cycle wait-decision penalty in particular); the host adds
/// it to the issuing core's timing.
#[derive(Debug, Clone)]
pub struct IoReq {
    /// Host-assigned identifier, echoed in the completion.
    pub id: ReqId,
    /// Byte offset within the addressed port's register map.
    pub offset: u64,
    /// Access size in bytes; anything other than 4 is rejected.
    pub size: u64,
    /// Direction flag: `true` for a write.
    pub is_write: bool,
    /// Write payload in, read result out.
    pub data: u32,
    /// Extra cycles accumulated by the access.
    pub latency: u64,
}

impl IoReq {
    /// Builds a 4-byte read access.
    pub fn read(id: ReqId, offset: u64) -> Self {
        Self {
            id,
            offset,
            size: 4,
            is_write: false,
            data: 0,
            latency: 0,
        }
    }

    /// Builds a 4-byte write access carrying `data`.
    pub fn write(id: ReqId, offset: u64, data: u32) -> Self {
        Self {
            id,
            offset,
            size: 4,
            is_write: true,
            data,
            latency: 0,
        }
    }
}

/// Deferred resolution of a [`IoStatus::Pending`] access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Identifier of the access being resolved.
    pub id: ReqId,
    /// Final read data: the core's masked status, or the value a sub-unit
    /// stored explicitly (mutex handoff).
    pub data: u32,
    /// Extra cycles the access accumulated before suspending.
    pub latency: u64,
}

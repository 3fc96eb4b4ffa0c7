//! Common types shared across the event unit model.
//!
//! This module groups the small building blocks the rest of the crate is
//! written against:
//! 1. **Access protocol:** Register access requests, statuses, and completions.
//! 2. **Core masks:** Word-indexed bit-vectors covering the configured cores.

/// Register access requests, statuses, and deferred completions.
pub mod access;

/// Word-indexed bit-vector sized to the configured core count.
pub mod mask;

pub use access::{Completion, IoReq, IoStatus, ReqId};
pub use mask::CoreMask;

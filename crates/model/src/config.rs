//! Configuration for the event unit model.
//!
//! This module defines the static configuration the unit is built from. It
//! provides:
//! 1. **Defaults:** Baseline cluster geometry and reserved event bit ids.
//! 2. **Structures:** Hierarchical config for the cluster shape and the
//!    notification event bits.
//! 3. **Validation:** Bounds checks against the register map, reported as
//!    typed errors rather than panics.
//!
//! Configuration is supplied by the host engine, typically deserialized from
//! JSON, or use `Config::default()` for a small standalone cluster.

use serde::Deserialize;
use thiserror::Error;

use crate::unit::regmap;

/// Default configuration constants for the event unit.
mod defaults {
    /// Number of cores in the cluster.
    pub const NB_CORES: usize = 8;

    /// Number of hardware mutexes.
    pub const NB_MUTEXES: usize = 8;

    /// Number of hardware barriers.
    ///
    /// Barrier 0 is excluded from the status-summary register, so a usable
    /// configuration has at least two.
    pub const NB_BARRIERS: usize = 8;

    /// Depth of the SoC-event FIFO.
    pub const FIFO_DEPTH: usize = 16;

    /// Status bit reserved for barrier notifications.
    pub const BARRIER_EVENT: u32 = 16;

    /// Status bit reserved for mutex ownership transfers.
    pub const MUTEX_EVENT: u32 = 17;

    /// Status bit reserved for "SoC-event FIFO non-empty" notifications.
    pub const FIFO_EVENT: u32 = 26;
}

/// Cluster geometry: how many of each structure to allocate at build time.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Number of cores (1..=256).
    pub nb_cores: usize,
    /// Number of hardware mutexes.
    pub nb_mutexes: usize,
    /// Number of hardware barriers.
    pub nb_barriers: usize,
    /// Depth of the SoC-event FIFO.
    pub fifo_depth: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            nb_cores: defaults::NB_CORES,
            nb_mutexes: defaults::NB_MUTEXES,
            nb_barriers: defaults::NB_BARRIERS,
            fifo_depth: defaults::FIFO_DEPTH,
        }
    }
}

/// Status bit ids reserved for the notification side channels.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Status bit raised on a mutex ownership transfer.
    pub mutex: u32,
    /// Status bit broadcast when a barrier is reached.
    pub barrier: u32,
    /// Status bit broadcast while the SoC-event FIFO is non-empty, or `None`
    /// to disable FIFO notifications.
    pub fifo: Option<u32>,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            mutex: defaults::MUTEX_EVENT,
            barrier: defaults::BARRIER_EVENT,
            fifo: Some(defaults::FIFO_EVENT),
        }
    }
}

/// Root configuration type for the event unit.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cluster geometry.
    pub cluster: ClusterConfig,
    /// Reserved notification event bits.
    pub events: EventConfig,
}

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Core count outside what the per-core register area can address.
    #[error("core count {0} outside supported range 1..=256")]
    CoreCount(usize),
    /// Mutex count outside what the demux window can address.
    #[error("mutex count {0} exceeds register map capacity 16")]
    MutexCount(usize),
    /// Barrier count outside what the barrier areas can address.
    #[error("barrier count {0} exceeds register map capacity 16")]
    BarrierCount(usize),
    /// Event bit id that does not fit a 32-bit status register.
    #[error("event bit id {0} does not fit a 32-bit status register")]
    EventBit(u32),
    /// Zero-depth FIFO.
    #[error("SoC-event FIFO depth must be nonzero")]
    FifoDepth,
}

impl Config {
    /// Checks the configuration against the register map capacities.
    ///
    /// # Errors
    ///
    /// Returns the first violated bound as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cluster = &self.cluster;
        if cluster.nb_cores == 0 || cluster.nb_cores > regmap::MAX_CORES {
            return Err(ConfigError::CoreCount(cluster.nb_cores));
        }
        if cluster.nb_mutexes > regmap::MAX_MUTEXES {
            return Err(ConfigError::MutexCount(cluster.nb_mutexes));
        }
        if cluster.nb_barriers > regmap::MAX_BARRIERS {
            return Err(ConfigError::BarrierCount(cluster.nb_barriers));
        }
        if cluster.fifo_depth == 0 {
            return Err(ConfigError::FifoDepth);
        }
        for bit in [Some(self.events.mutex), Some(self.events.barrier), self.events.fifo]
            .into_iter()
            .flatten()
        {
            if bit >= 32 {
                return Err(ConfigError::EventBit(bit));
            }
        }
        Ok(())
    }
}

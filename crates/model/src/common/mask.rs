//! Core bit-vectors.
//!
//! Barrier registers and event broadcasts address cores through multi-word
//! bit masks. `CoreMask` is sized exactly to the configured core count
//! (one `u32` word per 32 cores) instead of a fixed hardware array; word
//! indexes beyond the configured size are reported as out of range so the
//! register decode can reject them.

/// Word-indexed bit-vector with one bit per core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreMask {
    words: Vec<u32>,
}

impl CoreMask {
    /// Creates an all-zero mask covering `nb_cores` cores.
    pub fn for_cores(nb_cores: usize) -> Self {
        Self {
            words: vec![0; nb_cores.div_ceil(32)],
        }
    }

    /// Number of 32-bit words backing the mask.
    pub fn words(&self) -> usize {
        self.words.len()
    }

    /// Reads one word, or `None` if `idx` is out of range.
    pub fn word(&self, idx: usize) -> Option<u32> {
        self.words.get(idx).copied()
    }

    /// Replaces one word; returns `false` if `idx` is out of range.
    pub fn set_word(&mut self, idx: usize, val: u32) -> bool {
        match self.words.get_mut(idx) {
            Some(w) => {
                *w = val;
                true
            }
            None => false,
        }
    }

    /// ORs bits into one word; returns `false` if `idx` is out of range.
    pub fn or_word(&mut self, idx: usize, val: u32) -> bool {
        match self.words.get_mut(idx) {
            Some(w) => {
                *w |= val;
                true
            }
            None => false,
        }
    }

    /// Sets the bit for one core.
    pub fn set(&mut self, core: usize) {
        if let Some(w) = self.words.get_mut(core / 32) {
            *w |= 1 << (core % 32);
        }
    }

    /// Tests the bit for one core.
    pub fn test(&self, core: usize) -> bool {
        self.words
            .get(core / 32)
            .is_some_and(|w| w & (1 << (core % 32)) != 0)
    }

    /// Clears every bit.
    pub fn clear_all(&mut self) {
        self.words.fill(0);
    }
}

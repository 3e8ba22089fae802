//! Ring of per-frame file offsets used for rewinding.

use crate::protocol::{Error, Result};

/// Default number of frames remembered.
pub const FRAME_INDEX_CAPACITY: usize = 1 << 20;

/// Fixed-size ring of file offsets, addressed as `frame & mask`.
///
/// Old entries are silently overwritten once more than `capacity` frames
/// have been recorded.
#[derive(Debug, Clone)]
pub struct FrameIndex {
    offsets: Vec<u64>,
    mask: usize,
}

impl FrameIndex {
    /// Allocate an index with `capacity` slots (rounded up to a power of
    /// two) and slot 0 set to `start`.
    pub fn new(capacity: usize, start: u64) -> Result<Self> {
        let capacity = capacity
            .max(1)
            .checked_next_power_of_two()
            .ok_or(Error::ResourceExhausted {
                what: "frame index",
                size: capacity,
            })?;
        let mut offsets = Vec::new();
        offsets
            .try_reserve_exact(capacity)
            .map_err(|_| Error::ResourceExhausted {
                what: "frame index",
                size: capacity,
            })?;
        offsets.resize(capacity, 0);
        offsets[0] = start;
        Ok(Self {
            offsets,
            mask: capacity - 1,
        })
    }

    /// Offset recorded for `frame`.
    #[must_use]
    pub fn get(&self, frame: usize) -> u64 {
        self.offsets[frame & self.mask]
    }

    /// Record the offset for `frame`.
    pub fn set(&mut self, frame: usize, offset: u64) {
        self.offsets[frame & self.mask] = offset;
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.offsets.len()
    }

    /// `capacity - 1`.
    #[must_use]
    pub fn mask(&self) -> usize {
        self.mask
    }
}

//! Address regions and slice ownership.
//!
//! A distributed cache level is split into slices, each owning an interleaved subset
//! of the address space. A region is `[start, end]` optionally restricted to chunks of
//! `interleave_size` bytes repeating every `interleave_step` bytes.

use serde::{Deserialize, Serialize};

use crate::common::Addr;

/// A contiguous or interleaved range of addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRegion {
    /// First address of the region.
    pub start: Addr,
    /// Last address of the region, inclusive.
    pub end: Addr,
    /// Bytes owned per interleave chunk; 0 means the region is not interleaved.
    pub interleave_size: u64,
    /// Distance between consecutive chunks.
    pub interleave_step: u64,
}

impl Default for AddressRegion {
    /// The whole address space, not interleaved.
    fn default() -> Self {
        Self {
            start: 0,
            end: Addr::MAX,
            interleave_size: 0,
            interleave_step: 0,
        }
    }
}

impl AddressRegion {
    /// Derives the round-robin region of one slice: lines are dealt to slices in turn.
    ///
    /// # Arguments
    ///
    /// * `slice_id` - Index of this slice.
    /// * `slice_count` - Number of slices.
    /// * `line_size` - Cache line size in bytes.
    pub const fn round_robin_slice(slice_id: u64, slice_count: u64, line_size: u64) -> Self {
        Self {
            start: slice_id * line_size,
            end: Addr::MAX,
            interleave_size: line_size,
            interleave_step: slice_count * line_size,
        }
    }

    /// Returns true if the region is interleaved.
    #[inline]
    pub const fn is_interleaved(&self) -> bool {
        self.interleave_size > 0 && self.interleave_step > 0
    }

    /// Returns true if `addr` belongs to the region.
    pub const fn contains(&self, addr: Addr) -> bool {
        if addr < self.start || addr > self.end {
            return false;
        }
        if !self.is_interleaved() {
            return true;
        }
        (addr - self.start) % self.interleave_step < self.interleave_size
    }

    /// Maps a global address onto the dense local address space of the region.
    ///
    /// Interleaved chunks are packed back to back, so consecutive lines owned by a
    /// slice index consecutive sets.
    pub const fn to_local(&self, addr: Addr) -> Addr {
        let offset = addr.saturating_sub(self.start);
        if !self.is_interleaved() {
            return offset;
        }
        (offset / self.interleave_step) * self.interleave_size
            + (offset % self.interleave_step) % self.interleave_size
    }
}

/// Decides which addresses this cache slice is responsible for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SliceMapper {
    region: AddressRegion,
}

impl SliceMapper {
    /// Creates a mapper over `region`.
    pub const fn new(region: AddressRegion) -> Self {
        Self { region }
    }

    /// The region owned by this slice.
    pub const fn region(&self) -> &AddressRegion {
        &self.region
    }

    /// Returns true if this slice owns `addr`.
    #[inline]
    pub const fn owns_address(&self, addr: Addr) -> bool {
        self.region.contains(addr)
    }
}

//! Address and simulated-time types.
//!
//! Addresses are raw 64-bit byte addresses; a cache line is identified by its
//! line-aligned base address. Time is counted in controller clock cycles.

/// A byte address in the simulated physical address space.
pub type Addr = u64;

/// A point in simulated time, counted in controller clock cycles.
pub type Cycle = u64;

/// Returns the base address of the line containing `addr`.
///
/// # Arguments
///
/// * `addr` - Any byte address.
/// * `line_size` - The cache line size in bytes (a power of two).
///
/// # Returns
///
/// `addr` with the line-offset bits cleared.
#[inline(always)]
pub const fn line_base(addr: Addr, line_size: u64) -> Addr {
    addr & !(line_size - 1)
}

/// Returns the byte offset of `addr` within its line.
#[inline(always)]
pub const fn line_offset(addr: Addr, line_size: u64) -> u64 {
    addr & (line_size - 1)
}

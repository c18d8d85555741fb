//! Address Region and Slice Tests.
//!
//! Verifies region membership with and without interleaving, the round-robin slice
//! derivation and the global-to-local address mapping used for set indexing.

use memhier_core::cache::{AddressRegion, SliceMapper};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn default_region_is_whole_address_space() {
    let region = AddressRegion::default();
    assert!(!region.is_interleaved());
    assert!(region.contains(0));
    assert!(region.contains(u64::MAX));
    assert_eq!(region.to_local(0x1234), 0x1234);
}

/// Slice 2 of 4 with 64-byte lines owns one line in every four, starting at 128.
#[test]
fn round_robin_slice_geometry() {
    let region = AddressRegion::round_robin_slice(2, 4, 64);
    assert_eq!(
        region,
        AddressRegion {
            start: 128,
            end: u64::MAX,
            interleave_size: 64,
            interleave_step: 256,
        }
    );

    let slices = SliceMapper::new(region);
    assert!(!slices.owns_address(0));
    assert!(!slices.owns_address(127));
    assert!(slices.owns_address(128));
    assert!(slices.owns_address(191));
    assert!(!slices.owns_address(192));
    assert!(slices.owns_address(128 + 256));
    assert!(slices.owns_address(128 + 256 * 1000 + 63));
}

#[test]
fn contiguous_region_bounds_are_inclusive() {
    let region = AddressRegion {
        start: 0x1000,
        end: 0x1fff,
        interleave_size: 0,
        interleave_step: 0,
    };
    assert!(!region.contains(0xfff));
    assert!(region.contains(0x1000));
    assert!(region.contains(0x1fff));
    assert!(!region.contains(0x2000));
    assert_eq!(region.to_local(0x1040), 0x40);
}

/// Owned chunks are packed back to back in the local address space.
#[test]
fn to_local_packs_interleaved_chunks() {
    let region = AddressRegion::round_robin_slice(2, 4, 64);
    assert_eq!(region.to_local(128), 0);
    assert_eq!(region.to_local(128 + 10), 10);
    assert_eq!(region.to_local(128 + 256), 64);
    assert_eq!(region.to_local(128 + 512 + 10), 138);
}

proptest! {
    /// Every line belongs to exactly one slice of a round-robin split.
    #[test]
    fn each_line_has_exactly_one_owner(addr in 0u64..(1 << 40), count in 1u64..16) {
        let owners = (0..count)
            .filter(|&id| AddressRegion::round_robin_slice(id, count, 64).contains(addr))
            .count();
        prop_assert_eq!(owners, 1);
    }

    /// Consecutive owned lines map to consecutive local lines.
    #[test]
    fn owned_lines_are_dense_locally(id in 0u64..8, k in 0u64..1_000_000) {
        let region = AddressRegion::round_robin_slice(id, 8, 64);
        let addr = id * 64 + k * 8 * 64;
        prop_assert!(region.contains(addr));
        prop_assert_eq!(region.to_local(addr), k * 64);
    }
}

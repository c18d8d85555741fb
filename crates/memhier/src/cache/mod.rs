//! Cache level model.
//!
//! This module contains the resources of one cache level and the controller that
//! arbitrates them:
//! - `array`: set-associative tag storage (single or data + directory).
//! - `policies`: replacement policies.
//! - `hash`: set-index hash functions.
//! - `mshr`: miss tracking and the lookup-latency derivation.
//! - `bank`: per-cycle bank arbitration.
//! - `region`: address regions and slice ownership.
//! - `controller`: the per-cycle controller.

/// Set-associative tag arrays.
pub mod array;

/// Bank arbitration.
pub mod bank;

/// Cache controller and its prefetch path and watchdog.
pub mod controller;

/// Set-index hash functions.
pub mod hash;

/// Miss Status Holding Registers.
pub mod mshr;

/// Replacement policies.
pub mod policies;

/// Address regions and slice ownership.
pub mod region;

pub use array::{CacheArray, CacheLine, StateHandle, TagArray};
pub use controller::CacheController;
pub use mshr::{Admission, MshrTable, mshr_lookup_latency};
pub use region::{AddressRegion, SliceMapper};

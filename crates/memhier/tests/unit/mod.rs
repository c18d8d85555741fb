//! # Unit Components
//!
//! This module organizes the unit tests of the cache level: the storage and
//! resource models, the controller, configuration and statistics.

/// Unit tests for the cache model.
///
/// This module includes tests for tag arrays, replacement policies, set hashing,
/// the MSHR, bank arbitration, slicing, the prefetch path, the watchdog and the
/// controller's per-cycle behavior.
pub mod cache;



/// Unit tests for the next-line prefetcher.
pub mod prefetch;

/// Unit tests for statistics collection.
pub mod stats;

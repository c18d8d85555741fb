//! Discrete-time cache level simulator library.
//!
//! This crate models one level of a simulated cache hierarchy with the following:
//! 1. **Storage:** Set-associative tag arrays (optionally paired with a coherence
//!    directory), pluggable replacement policies and set-index hashes.
//! 2. **Resources:** A bounded MSHR with a deadlock-avoidance reserve, per-cycle bank
//!    arbitration, and address-slice ownership for distributed caches.
//! 3. **Control:** A cycle-driven controller that drains arrivals, applies admission
//!    rules, drives an external coherence protocol, injects delayed prefetches and
//!    watches for deadlock.
//! 4. **Configuration:** JSON parameters validated into derived values.
//! 5. **Statistics:** Per-command traffic, hit/miss split, occupancy and conflicts.

/// Cache storage, resources and controller.
pub mod cache;
/// Common types (addresses, events, errors, logging context).
pub mod common;
/// Cache configuration (defaults, parameter parsing, validation).
pub mod config;
/// Memory links connecting the controller to its neighbours.
pub mod link;
/// Access listeners and prefetchers.
pub mod prefetch;
/// Coherence protocol delegate contract and protocol selection.
pub mod protocol;
/// Cache statistics collection and reporting.
pub mod stats;

/// Main controller type; construct with `CacheController::new` or `from_config`.
pub use crate::cache::CacheController;
/// Raw configuration; deserialize from JSON and call `validate`.
pub use crate::config::{CacheConfig, CacheParams};
/// Error types returned by construction and `tick`.
pub use crate::common::{ConfigError, SimError};

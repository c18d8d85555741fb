//! Cache Replacement Policies.
//!
//! Implements the algorithms that pick a victim way when a line must be installed in
//! a full set. Each tag array owns exactly one policy instance, fixed at construction.
//!
//! # Policies
//!
//! - `Lru`: Least Recently Used.
//! - `Lfu`: Least Frequently Used, ties broken by recency.
//! - `Random`: Uniform pseudo-random selection.
//! - `Mru`: Most Recently Used.
//! - `Nmru`: Not Most Recently Used.

/// Least Frequently Used replacement policy.
pub mod lfu;

/// Least Recently Used replacement policy.
pub mod lru;

/// Most Recently Used replacement policy.
pub mod mru;

/// Not Most Recently Used replacement policy.
pub mod nmru;

/// Random replacement policy.
pub mod random;

pub use lfu::LfuPolicy;
pub use lru::LruPolicy;
pub use mru::MruPolicy;
pub use nmru::NmruPolicy;
pub use random::RandomPolicy;

use crate::config::ReplacementPolicy as PolicyType;

/// Trait for cache replacement policies.
///
/// Defines the interface for updating usage state and selecting victim lines.
pub trait ReplacementPolicy {
    /// Updates the policy state when a line is accessed.
    ///
    /// # Arguments
    ///
    /// * `set` - The cache set index.
    /// * `way` - The way index within the set that was accessed.
    fn touch(&mut self, set: usize, way: usize);

    /// Selects a victim line to evict from a specific set.
    ///
    /// # Arguments
    ///
    /// * `set` - The cache set index.
    ///
    /// # Returns
    ///
    /// The index of the way to evict.
    fn select_victim(&mut self, set: usize) -> usize;

    /// Forgets the usage history of a way, called when a new line is installed in it.
    fn reset_way(&mut self, _set: usize, _way: usize) {}
}

/// A replacement policy selected at construction time.
#[derive(Debug, Clone)]
pub enum Replacement {
    /// Least Recently Used.
    Lru(LruPolicy),
    /// Least Frequently Used.
    Lfu(LfuPolicy),
    /// Random.
    Random(RandomPolicy),
    /// Most Recently Used.
    Mru(MruPolicy),
    /// Not Most Recently Used.
    Nmru(NmruPolicy),
}

impl Replacement {
    /// Builds the policy named by `kind` for an array of `sets` x `ways`.
    pub fn new(kind: PolicyType, sets: usize, ways: usize) -> Self {
        match kind {
            PolicyType::Lru => Self::Lru(LruPolicy::new(sets, ways)),
            PolicyType::Lfu => Self::Lfu(LfuPolicy::new(sets, ways)),
            PolicyType::Random => Self::Random(RandomPolicy::new(sets, ways)),
            PolicyType::Mru => Self::Mru(MruPolicy::new(sets, ways)),
            PolicyType::Nmru => Self::Nmru(NmruPolicy::new(sets, ways)),
        }
    }

    /// Returns which policy this is.
    pub const fn kind(&self) -> PolicyType {
        match self {
            Self::Lru(_) => PolicyType::Lru,
            Self::Lfu(_) => PolicyType::Lfu,
            Self::Random(_) => PolicyType::Random,
            Self::Mru(_) => PolicyType::Mru,
            Self::Nmru(_) => PolicyType::Nmru,
        }
    }
}

impl ReplacementPolicy for Replacement {
    fn touch(&mut self, set: usize, way: usize) {
        match self {
            Self::Lru(p) => p.touch(set, way),
            Self::Lfu(p) => p.touch(set, way),
            Self::Random(p) => p.touch(set, way),
            Self::Mru(p) => p.touch(set, way),
            Self::Nmru(p) => p.touch(set, way),
        }
    }

    fn select_victim(&mut self, set: usize) -> usize {
        match self {
            Self::Lru(p) => p.select_victim(set),
            Self::Lfu(p) => p.select_victim(set),
            Self::Random(p) => p.select_victim(set),
            Self::Mru(p) => p.select_victim(set),
            Self::Nmru(p) => p.select_victim(set),
        }
    }

    fn reset_way(&mut self, set: usize, way: usize) {
        match self {
            Self::Lru(p) => p.reset_way(set, way),
            Self::Lfu(p) => p.reset_way(set, way),
            Self::Random(p) => p.reset_way(set, way),
            Self::Mru(p) => p.reset_way(set, way),
            Self::Nmru(p) => p.reset_way(set, way),
        }
    }
}

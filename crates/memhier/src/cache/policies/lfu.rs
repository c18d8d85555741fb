//! Least Frequently Used (LFU) Replacement Policy.
//!
//! This policy evicts the way with the fewest touches since its line was installed.
//! Ties are broken by recency: among equally used ways, the one touched longest ago
//! is chosen.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `touch()`: O(1)
//!   - `select_victim()`: O(W) where W is the associativity
//! - **Space Complexity:** O(S × W)

use super::ReplacementPolicy;

/// Usage record for one way.
#[derive(Debug, Clone, Copy, Default)]
struct WayUsage {
    /// Touches since the line was installed.
    count: u64,
    /// Global touch stamp of the most recent touch.
    last: u64,
}

/// LFU Policy state.
#[derive(Debug, Clone)]
pub struct LfuPolicy {
    /// Number of ways per set.
    ways: usize,
    /// Flattened `sets * ways` usage records.
    usage: Vec<WayUsage>,
    /// Monotonic touch counter used for tie-breaking.
    clock: u64,
}

impl LfuPolicy {
    /// Creates a new LFU policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the array.
    /// * `ways` - The associativity of the array.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            ways,
            usage: vec![WayUsage::default(); sets * ways],
            clock: 0,
        }
    }

    /// Returns the number of touches recorded for a way.
    pub fn count(&self, set: usize, way: usize) -> u64 {
        self.usage[set * self.ways + way].count
    }
}

impl ReplacementPolicy for LfuPolicy {
    fn touch(&mut self, set: usize, way: usize) {
        self.clock += 1;
        let entry = &mut self.usage[set * self.ways + way];
        entry.count += 1;
        entry.last = self.clock;
    }

    fn select_victim(&mut self, set: usize) -> usize {
        let base = set * self.ways;
        self.usage[base..base + self.ways]
            .iter()
            .enumerate()
            .min_by_key(|(_, u)| (u.count, u.last))
            .map_or(0, |(way, _)| way)
    }

    fn reset_way(&mut self, set: usize, way: usize) {
        self.usage[set * self.ways + way] = WayUsage::default();
    }
}

//! Most Recently Used (MRU) Replacement Policy.
//!
//! This policy evicts the line that was touched most recently. It suits cyclic access
//! patterns larger than the cache, where the line just used is the one least likely
//! to be needed again soon.

use super::ReplacementPolicy;

/// MRU Policy state.
#[derive(Debug, Clone)]
pub struct MruPolicy {
    /// One usage stack per set.
    /// Index 0 is the MRU position (victim), last index is LRU.
    usage: Vec<Vec<usize>>,
}

impl MruPolicy {
    /// Creates a new MRU policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the array.
    /// * `ways` - The associativity of the array.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            usage: (0..sets).map(|_| (0..ways).collect()).collect(),
        }
    }
}

impl ReplacementPolicy for MruPolicy {
    fn touch(&mut self, set: usize, way: usize) {
        let stack = &mut self.usage[set];
        if let Some(pos) = stack.iter().position(|&x| x == way) {
            let _ = stack.remove(pos);
        }
        stack.insert(0, way);
    }

    /// Returns the way at the top of the usage stack.
    fn select_victim(&mut self, set: usize) -> usize {
        self.usage[set].first().copied().unwrap_or(0)
    }
}

//! Least Recently Used (LRU) Replacement Policy.
//!
//! Each set keeps its ways ordered by last touch, most recent first. Touching a way
//! moves it to the front; the victim is whatever sits at the back. Untouched sets
//! start in way order, so the highest way is evicted first.
//!
//! `touch` is linear in the associativity and `select_victim` is constant.

use super::ReplacementPolicy;

/// LRU Policy state.
#[derive(Debug, Clone)]
pub struct LruPolicy {
    /// Ways per set, most recently touched first.
    usage: Vec<Vec<usize>>,
}

impl LruPolicy {
    /// Creates a new LRU policy instance.
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

impl ReplacementPolicy for LruPolicy {
    /// Moves `way` to the MRU position of its set's stack.
    fn touch(&mut self, set: usize, way: usize) {
        let stack = &mut self.usage[set];
        if let Some(pos) = stack.iter().position(|&x| x == way) {
            let _ = stack.remove(pos);
        }
        stack.insert(0, way);
    }

    /// Returns the way at the bottom of the usage stack.
    fn select_victim(&mut self, set: usize) -> usize {
        self.usage[set].last().copied().unwrap_or(0)
    }
}

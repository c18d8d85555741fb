//! Not Most Recently Used (NMRU) Replacement Policy.
//!
//! Any way except the most recently touched one may be evicted. Among the candidates,
//! a per-set round-robin pointer provides the secondary order, so repeated evictions
//! in a set cycle through its ways while the MRU way is protected.

use super::ReplacementPolicy;

/// NMRU Policy state.
#[derive(Debug, Clone)]
pub struct NmruPolicy {
    /// Number of ways per set.
    ways: usize,
    /// Most recently touched way of each set.
    mru: Vec<Option<usize>>,
    /// Next candidate way of each set.
    next: Vec<usize>,
}

impl NmruPolicy {
    /// Creates a new NMRU policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the array.
    /// * `ways` - The associativity of the array.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            ways,
            mru: vec![None; sets],
            next: vec![0; sets],
        }
    }
}

impl ReplacementPolicy for NmruPolicy {
    fn touch(&mut self, set: usize, way: usize) {
        self.mru[set] = Some(way);
    }

    fn select_victim(&mut self, set: usize) -> usize {
        if self.ways <= 1 {
            return 0;
        }
        let mut victim = self.next[set] % self.ways;
        if self.mru[set] == Some(victim) {
            victim = (victim + 1) % self.ways;
        }
        self.next[set] = (victim + 1) % self.ways;
        victim
    }
}

//! Random Replacement Policy.
//!
//! This policy evicts a pseudo-randomly chosen way. It uses a xorshift generator with
//! a fixed seed so that simulations are reproducible.

use super::ReplacementPolicy;

/// Seed of the xorshift generator.
const SEED: u64 = 123_456_789;

/// Random Policy state.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    /// Number of ways per set.
    ways: usize,
    /// Internal state for the pseudo-random number generator.
    state: u64,
}

impl RandomPolicy {
    /// Creates a new Random policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets (unused, kept for a uniform constructor).
    /// * `ways` - The associativity of the array.
    pub const fn new(_sets: usize, ways: usize) -> Self {
        Self { ways, state: SEED }
    }

    /// Advances the generator and returns the next value.
    const fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

impl ReplacementPolicy for RandomPolicy {
    /// Access patterns do not affect random replacement.
    fn touch(&mut self, _set: usize, _way: usize) {}

    fn select_victim(&mut self, _set: usize) -> usize {
        (self.next() % self.ways.max(1) as u64) as usize
    }
}

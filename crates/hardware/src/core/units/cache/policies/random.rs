//! Random Replacement Policy.
//!
//! Picks a pseudo-random way with a xorshift generator. The seed is fixed so
//! that a replayed trace always evicts the same entries.

use super::ReplacementPolicy;

/// Seed of the xorshift state.
const SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// Random Policy state.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    /// Associativity.
    ways: usize,
    /// Xorshift state.
    state: u64,
}

impl RandomPolicy {
    /// Creates a new Random policy instance.
    ///
    /// # Arguments
    ///
    /// * `_sets` - Unused; victim choice does not depend on the set.
    /// * `ways` - The associativity (number of ways).
    pub fn new(_sets: usize, ways: usize) -> Self {
        Self {
            ways: ways.max(1),
            state: SEED,
        }
    }
}

impl ReplacementPolicy for RandomPolicy {
    fn update(&mut self, _set: usize, _way: usize) {}

    fn get_victim(&mut self, _set: usize) -> usize {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        (x % self.ways as u64) as usize
    }
}

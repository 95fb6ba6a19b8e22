//! First-In, First-Out (FIFO) Replacement Policy.
//!
//! Evicts region entries in insertion order, regardless of how often they are
//! touched afterwards. Each set is a round-robin pointer that advances when the
//! way it points at is (re)filled.
//!
//! # Performance
//!
//! - `fill()` / `get_victim()`: O(1)
//! - Space: O(S)

use super::ReplacementPolicy;

/// FIFO Policy state.
#[derive(Debug, Clone)]
pub struct FifoPolicy {
    /// Next way to be evicted, per set.
    next_way: Vec<usize>,
    /// Associativity.
    ways: usize,
}

impl FifoPolicy {
    /// Creates a new FIFO policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets.
    /// * `ways` - The associativity (number of ways).
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            next_way: vec![0; sets],
            ways: ways.max(1),
        }
    }
}

impl ReplacementPolicy for FifoPolicy {
    /// Hits leave the insertion order alone.
    fn update(&mut self, _set: usize, _way: usize) {}

    /// Advances the pointer when the filled way is the current victim.
    fn fill(&mut self, set: usize, way: usize) {
        if self.next_way[set] == way {
            self.next_way[set] = (way + 1) % self.ways;
        }
    }

    fn get_victim(&mut self, set: usize) -> usize {
        self.next_way[set]
    }
}

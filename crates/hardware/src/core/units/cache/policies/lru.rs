//! Least Recently Used (LRU) Replacement Policy.
//!
//! Keeps one recency stack per set. A touched way moves to the front (MRU);
//! the victim is the way at the back. Region entries that keep receiving
//! `add` traffic therefore survive, while regions that went quiet age out.
//!
//! # Performance
//!
//! - `update()` / `demote()`: O(W) where W is the associativity
//! - `get_victim()`: O(1)
//! - Space: O(S × W)

use super::ReplacementPolicy;

/// LRU Policy state.
#[derive(Debug, Clone)]
pub struct LruPolicy {
    /// Per-set recency stacks. Index 0 is MRU, last index is LRU.
    usage: Vec<Vec<usize>>,
}

impl LruPolicy {
    /// Creates a new LRU policy instance.
    ///
    /// Initially way 0 is MRU and way `ways - 1` is the first victim.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets.
    /// * `ways` - The associativity (number of ways).
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            usage: (0..sets).map(|_| (0..ways).collect()).collect(),
        }
    }

    fn unlink(stack: &mut Vec<usize>, way: usize) {
        if let Some(pos) = stack.iter().position(|&x| x == way) {
            let _ = stack.remove(pos);
        }
    }
}

impl ReplacementPolicy for LruPolicy {
    fn update(&mut self, set: usize, way: usize) {
        let stack = &mut self.usage[set];
        Self::unlink(stack, way);
        stack.insert(0, way);
    }

    fn get_victim(&mut self, set: usize) -> usize {
        self.usage[set].last().copied().unwrap_or(0)
    }

    /// Moves `way` to the LRU position so it is reused first.
    fn demote(&mut self, set: usize, way: usize) {
        let stack = &mut self.usage[set];
        Self::unlink(stack, way);
        stack.push(way);
    }
}

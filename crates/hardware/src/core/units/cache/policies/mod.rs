//! Replacement Policies for the confidence table's associative store.
//!
//! Each policy tracks per-set recency (or insertion order) for a fixed number of
//! ways and nominates a victim when a region entry must be replaced.
//!
//! # Policies
//!
//! - `Lru`: Least Recently Used.
//! - `Fifo`: First-In, First-Out.
//! - `Random`: Pseudo-random selection.

/// First-In, First-Out replacement policy.
pub mod fifo;

/// Least Recently Used replacement policy.
pub mod lru;

/// Random replacement policy.
pub mod random;

pub use fifo::FifoPolicy;
pub use lru::LruPolicy;
pub use random::RandomPolicy;

use crate::config::ReplacementPolicy as PolicyKind;

/// Trait for replacement policies.
///
/// Defines the interface for updating usage state and selecting victim ways.
pub trait ReplacementPolicy: Send + Sync {
    /// Records a hit on `way` in `set`.
    fn update(&mut self, set: usize, way: usize);

    /// Records that `way` in `set` was (re)filled. Defaults to a hit.
    fn fill(&mut self, set: usize, way: usize) {
        self.update(set, way);
    }

    /// Selects the way to evict from `set`.
    fn get_victim(&mut self, set: usize) -> usize;

    /// Marks `way` in `set` as the preferred next victim after it was invalidated.
    fn demote(&mut self, _set: usize, _way: usize) {}
}

/// Builds the boxed policy selected by configuration.
///
/// # Arguments
///
/// * `kind` - Policy selected in `VpnTableConfig`.
/// * `sets` - Number of sets in the store.
/// * `ways` - Associativity of the store.
pub fn build(kind: PolicyKind, sets: usize, ways: usize) -> Box<dyn ReplacementPolicy> {
    match kind {
        PolicyKind::Lru => Box::new(LruPolicy::new(sets, ways)),
        PolicyKind::Fifo => Box::new(FifoPolicy::new(sets, ways)),
        PolicyKind::Random => Box::new(RandomPolicy::new(sets, ways)),
    }
}

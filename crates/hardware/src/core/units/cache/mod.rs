//! Set-Associative Storage.
//!
//! This module provides the tagged, set-associative storage that backs the
//! confidence table. It exposes:
//! 1. **`AssociativeStore`:** the slot-handle interface the table consumes
//!    (lookup, victim selection, insertion, recency touch, iteration).
//! 2. **`AssociativeSet`:** a reference implementation over a flat slot array
//!    with a pluggable replacement policy (LRU, FIFO, Random).
//!
//! Payloads are allocated once at construction and never freed; eviction only
//! retags a slot, and the caller resets the payload it gets back.

/// Replacement policy implementations (LRU, FIFO, Random).
pub mod policies;

use std::fmt;

use self::policies::ReplacementPolicy;
use crate::config::ReplacementPolicy as PolicyKind;

/// Handle to one slot (set × way) of an associative store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

impl SlotId {
    /// Wraps a flat slot index.
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the flat slot index.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Tagged associative storage of payloads of type `E`.
///
/// Lookups are pure; recency only changes through `access_entry` and
/// `insert_entry`. Iteration is by flat slot index (`0..num_slots()`) with a
/// validity check per slot.
pub trait AssociativeStore<E>: Send {
    /// Returns the slot holding `tag`, if resident. Does not touch recency.
    fn find_entry(&self, tag: u64) -> Option<SlotId>;

    /// Records a hit on `slot` with the replacement policy.
    fn access_entry(&mut self, slot: SlotId);

    /// Chooses the slot that `tag` should replace. Invalid ways are preferred.
    fn find_victim(&mut self, tag: u64) -> SlotId;

    /// Makes `slot` valid under `tag` and marks it most recently used.
    fn insert_entry(&mut self, tag: u64, slot: SlotId);

    /// Marks `slot` invalid. The payload is left for the caller to reset.
    fn invalidate(&mut self, slot: SlotId);

    /// Total number of slots (sets × ways).
    fn num_slots(&self) -> usize;

    /// Whether `slot` currently holds a tag.
    fn is_valid(&self, slot: SlotId) -> bool;

    /// Tag held by `slot`, if valid.
    fn tag_of(&self, slot: SlotId) -> Option<u64>;

    /// Payload of `slot`.
    fn entry(&self, slot: SlotId) -> &E;

    /// Mutable payload of `slot`.
    fn entry_mut(&mut self, slot: SlotId) -> &mut E;
}

/// Set-associative store with a per-set replacement policy.
///
/// The set index is `tag % sets`; the full tag is kept per slot so that
/// lookups never alias across sets.
pub struct AssociativeSet<E> {
    sets: usize,
    ways: usize,
    tags: Vec<u64>,
    valid: Vec<bool>,
    entries: Vec<E>,
    policy: Box<dyn ReplacementPolicy>,
}

impl<E> AssociativeSet<E> {
    /// Creates a store of `sets × ways` slots, each payload built by `init`.
    ///
    /// # Arguments
    ///
    /// * `sets` - Number of sets (must be non-zero).
    /// * `ways` - Associativity (must be non-zero).
    /// * `policy` - Replacement policy sized for the same geometry.
    /// * `init` - Payload constructor, called once per slot.
    ///
    /// # Panics
    ///
    /// Panics if `sets` or `ways` is zero. Use [`crate::config::VpnTableConfig::validate`]
    /// to reject such geometries up front.
    pub fn new(
        sets: usize,
        ways: usize,
        policy: Box<dyn ReplacementPolicy>,
        init: impl FnMut() -> E,
    ) -> Self {
        assert!(sets > 0 && ways > 0, "associative store needs at least one set and one way");
        let slots = sets * ways;
        Self {
            sets,
            ways,
            tags: vec![0; slots],
            valid: vec![false; slots],
            entries: std::iter::repeat_with(init).take(slots).collect(),
            policy,
        }
    }

    /// Creates a store using the policy selected in configuration.
    ///
    /// # Panics
    ///
    /// Panics if `sets` or `ways` is zero.
    pub fn with_policy(
        sets: usize,
        ways: usize,
        kind: PolicyKind,
        init: impl FnMut() -> E,
    ) -> Self {
        Self::new(sets, ways, policies::build(kind, sets, ways), init)
    }

    /// Number of sets.
    pub const fn sets(&self) -> usize {
        self.sets
    }

    /// Associativity.
    pub const fn ways(&self) -> usize {
        self.ways
    }

    /// Number of valid slots.
    pub fn occupancy(&self) -> usize {
        self.valid.iter().filter(|&&v| v).count()
    }

    fn set_of(&self, tag: u64) -> usize {
        (tag % self.sets as u64) as usize
    }

    const fn split(&self, slot: SlotId) -> (usize, usize) {
        (slot.0 / self.ways, slot.0 % self.ways)
    }
}

impl<E: Send> AssociativeStore<E> for AssociativeSet<E> {
    fn find_entry(&self, tag: u64) -> Option<SlotId> {
        let base = self.set_of(tag) * self.ways;
        (base..base + self.ways)
            .find(|&i| self.valid[i] && self.tags[i] == tag)
            .map(SlotId)
    }

    fn access_entry(&mut self, slot: SlotId) {
        let (set, way) = self.split(slot);
        self.policy.update(set, way);
    }

    fn find_victim(&mut self, tag: u64) -> SlotId {
        let set = self.set_of(tag);
        let base = set * self.ways;
        if let Some(free) = (base..base + self.ways).find(|&i| !self.valid[i]) {
            return SlotId(free);
        }
        let way = self.policy.get_victim(set) % self.ways;
        SlotId(base + way)
    }

    fn insert_entry(&mut self, tag: u64, slot: SlotId) {
        let (set, way) = self.split(slot);
        self.tags[slot.0] = tag;
        self.valid[slot.0] = true;
        self.policy.fill(set, way);
    }

    fn invalidate(&mut self, slot: SlotId) {
        let (set, way) = self.split(slot);
        self.valid[slot.0] = false;
        self.policy.demote(set, way);
    }

    fn num_slots(&self) -> usize {
        self.entries.len()
    }

    fn is_valid(&self, slot: SlotId) -> bool {
        self.valid[slot.0]
    }

    fn tag_of(&self, slot: SlotId) -> Option<u64> {
        self.valid[slot.0].then(|| self.tags[slot.0])
    }

    fn entry(&self, slot: SlotId) -> &E {
        &self.entries[slot.0]
    }

    fn entry_mut(&mut self, slot: SlotId) -> &mut E {
        &mut self.entries[slot.0]
    }
}

impl<E> fmt::Debug for AssociativeSet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssociativeSet")
            .field("sets", &self.sets)
            .field("ways", &self.ways)
            .field("occupancy", &self.occupancy())
            .finish_non_exhaustive()
    }
}

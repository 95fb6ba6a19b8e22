//! Dedup filter for issued prefetch addresses.
//!
//! A bounded, strictly-LRU set of addresses that were recently emitted. A
//! candidate already present is dropped; otherwise it is recorded, evicting the
//! least recently inserted address when full. Lookups do not refresh recency,
//! so an address ages out after `capacity` newer insertions no matter how
//! often it is re-rejected.

use std::fmt;
use std::num::NonZeroUsize;

use lru::LruCache;

use crate::common::error::ConfigError;

/// Recency-bounded "already issued" set.
pub struct PrefetchFilter {
    cache: LruCache<u64, u64>,
}

impl PrefetchFilter {
    /// Creates a filter holding at most `capacity` addresses.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroFilterCapacity`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        let cap = NonZeroUsize::new(capacity).ok_or(ConfigError::ZeroFilterCapacity)?;
        Ok(Self {
            cache: LruCache::new(cap),
        })
    }

    /// Whether `addr` was issued recently.
    pub fn contains(&self, addr: u64) -> bool {
        self.cache.contains(&addr)
    }

    /// Records `addr` unless already present.
    ///
    /// Returns `true` when the address was new.
    pub fn insert(&mut self, addr: u64) -> bool {
        if self.cache.contains(&addr) {
            return false;
        }
        let _ = self.cache.put(addr, addr);
        true
    }

    /// Number of tracked addresses.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether no address is tracked.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Maximum number of tracked addresses.
    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }
}

impl fmt::Debug for PrefetchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefetchFilter")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

//! Hardware Prefetcher interface.
//!
//! This module defines the notification boundary between a cache model and a
//! prefetcher, and the packet types that cross it:
//! 1. **`Prefetcher`:** hooks invoked on accesses, data arrival, fills, prefetch hits,
//!    and retired-instruction counts.
//! 2. **`AccessInfo` / `Packet`:** what the cache knows about the triggering event.
//! 3. **`LineData`:** the cache line payload, or the reason it is unavailable.
//! 4. **`PrefetchRequest`:** a prioritized candidate handed back to the cache.

/// Content-directed (pointer-chasing) prefetcher.
pub mod cdp;

pub use self::cdp::CdpPrefetcher;

use serde::Deserialize;

use crate::common::constants::{CACHE_LINE_BYTES, LINE_WORDS};
use crate::config::ByteOrder;

/// Which prefetcher generated a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PrefetchSource {
    /// The content-directed prefetcher.
    Cdp,
    /// Any other prefetcher sharing the cache.
    Other,
}

/// Payload of a cache line, or why none is available.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LineData {
    /// The event carried no payload and the block was not looked up.
    #[default]
    Missing,
    /// The event carried no payload and the block is not resident.
    BlockNotFound,
    /// Raw line bytes in memory order.
    Present([u8; CACHE_LINE_BYTES]),
}

impl LineData {
    /// Encodes eight 64-bit words into a line payload.
    ///
    /// # Arguments
    ///
    /// * `words` - Words in line order.
    /// * `order` - Byte order of the simulated memory.
    pub fn from_words(words: &[u64; LINE_WORDS], order: ByteOrder) -> Self {
        let mut bytes = [0u8; CACHE_LINE_BYTES];
        for (chunk, word) in bytes.chunks_exact_mut(8).zip(words) {
            let raw = match order {
                ByteOrder::Little => word.to_le_bytes(),
                ByteOrder::Big => word.to_be_bytes(),
            };
            chunk.copy_from_slice(&raw);
        }
        Self::Present(bytes)
    }

    /// Decodes the payload into eight 64-bit words, if present.
    pub fn words(&self, order: ByteOrder) -> Option<[u64; LINE_WORDS]> {
        let Self::Present(bytes) = self else {
            return None;
        };
        let mut words = [0u64; LINE_WORDS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            *word = match order {
                ByteOrder::Little => u64::from_le_bytes(raw),
                ByteOrder::Big => u64::from_be_bytes(raw),
            };
        }
        Some(words)
    }
}

/// A demand access observed by the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessInfo {
    /// Physical address of the access.
    pub addr: u64,
    /// Virtual address, when the request carried one.
    pub vaddr: Option<u64>,
    /// Whether the access missed in the cache.
    pub miss: bool,
    /// Line payload available at access time.
    pub data: LineData,
}

/// A memory-system packet delivered on data arrival, fill, or prefetch hit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packet {
    /// Physical block address.
    pub addr: u64,
    /// Virtual address, when the request carried one.
    pub vaddr: Option<u64>,
    /// Line payload.
    pub data: LineData,
    /// Speculative chain depth of the request (0 for demand).
    pub pf_depth: u32,
    /// Prefetcher that issued the request, `None` for demand traffic.
    pub pf_source: Option<PrefetchSource>,
}

impl Packet {
    /// Creates a demand packet for `addr` with no payload.
    pub fn new(addr: u64) -> Self {
        Self {
            addr,
            ..Self::default()
        }
    }

    /// Sets the virtual address.
    #[must_use]
    pub const fn with_vaddr(mut self, vaddr: u64) -> Self {
        self.vaddr = Some(vaddr);
        self
    }

    /// Sets the line payload.
    #[must_use]
    pub fn with_data(mut self, data: LineData) -> Self {
        self.data = data;
        self
    }

    /// Marks the packet as a prefetch issued by `source` at `depth`.
    #[must_use]
    pub const fn prefetched_by(mut self, source: PrefetchSource, depth: u32) -> Self {
        self.pf_source = Some(source);
        self.pf_depth = depth;
        self
    }
}

/// A prefetch candidate returned to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchRequest {
    /// Block-aligned target address.
    pub addr: u64,
    /// Queue priority; larger is more urgent.
    pub priority: u32,
    /// Prefetcher that generated the request.
    pub source: PrefetchSource,
    /// Speculative chain depth of the request.
    pub depth: u32,
}

/// Trait for cache prefetcher implementations.
///
/// The cache model drives every hook synchronously from its own event
/// handlers; candidates are appended to `out` in priority-agnostic order and
/// the caller owns queueing.
pub trait Prefetcher: Send {
    /// Observes a demand access (hit or miss).
    fn calculate_prefetch(&mut self, info: &AccessInfo, out: &mut Vec<PrefetchRequest>);

    /// Observes the completion of a fill.
    fn notify_fill(&mut self, pkt: &Packet, out: &mut Vec<PrefetchRequest>);

    /// Observes a line payload arriving at the cache.
    ///
    /// `is_l1_use` is set when the request originated at the L1.
    fn notify_with_data(&mut self, _pkt: &Packet, _is_l1_use: bool, _out: &mut Vec<PrefetchRequest>) {
    }

    /// Observes a demand hit on a prefetched line.
    ///
    /// `accuracy` is the cache's own running accuracy for `source`.
    fn pf_hit_notify(
        &mut self,
        _accuracy: f32,
        _source: PrefetchSource,
        _pkt: &Packet,
        _out: &mut Vec<PrefetchRequest>,
    ) {
    }

    /// Reports the number of retired instructions so far.
    fn notify_ins(&mut self, _ins_num: u64) {}

    /// Reports trailing last-level miss counters: misses caused by this
    /// prefetcher's requests and total misses.
    fn set_l3_miss_info(&mut self, _own_misses: u64, _total_misses: u64) {}
}

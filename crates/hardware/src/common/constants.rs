//! Global Prefetcher Constants.
//!
//! This module defines constants shared across the content-directed prefetcher. It includes:
//! 1. **Memory Constants:** Page sizes, masks, and cache line geometry.
//! 2. **Sv39 Field Layout:** Bit positions of the VPN fields used as table keys.
//! 3. **Table Constants:** Decay period and sub-entry limits for the confidence table.
//! 4. **Accuracy Constants:** Thresholds for the accuracy feedback loop.

/// Page size in bytes (4KB).
pub const PAGE_SIZE: u64 = 4096;

/// Number of bits to shift to convert between bytes and pages.
pub const PAGE_SHIFT: u64 = 12;

/// Mask for extracting the page offset from an address.
pub const PAGE_OFFSET_MASK: u64 = PAGE_SIZE - 1;

/// Width of one VPN field (Sv39 page-table index) in bits.
pub const VPN_FIELD_BITS: u32 = 9;

/// Mask for a single VPN field.
pub const VPN_FIELD_MASK: u64 = (1 << VPN_FIELD_BITS) - 1;

/// Lowest bit of the canonical-address check field (`[63:39]`).
pub const CHECK_BITS_SHIFT: u32 = 39;

/// Lowest bit of `vpn2` (`[38:30]`).
pub const VPN2_SHIFT: u32 = 30;

/// Lowest bit of `vpn1` (`[29:21]`).
pub const VPN1_SHIFT: u32 = 21;

/// Lowest bit of `vpn0` (`[20:12]`).
pub const VPN0_SHIFT: u32 = 12;

/// Mask of the word-alignment bits (`[1:0]`).
pub const ALIGN_MASK: u64 = 0x3;

/// Bytes scanned per cache line (one 64-byte block).
pub const CACHE_LINE_BYTES: usize = 64;

/// Number of 64-bit candidate words scanned per line.
pub const LINE_WORDS: usize = CACHE_LINE_BYTES / 8;

/// Number of table writes between two confidence decay sweeps.
pub const RESET_PERIOD: u64 = 128;

/// Exclusive upper bound on sub-entries per region entry.
pub const MAX_SUB_ENTRIES: usize = 512;

/// Issued-prefetch count above which measured accuracy is trusted.
pub const ACCURACY_MIN_ISSUED: u64 = 100;

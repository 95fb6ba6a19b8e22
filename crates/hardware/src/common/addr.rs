//! Virtual Address type and Sv39 field decoding.
//!
//! The prefetcher never walks page tables. It borrows the Sv39 field layout as a
//! grouping key: two pointers that share `vpn2`/`vpn1` live in the same 2 MiB region,
//! and the confidence table tracks regions at that granularity. This module provides:
//! 1. **Type Safety:** A strong type for raw 64-bit values interpreted as virtual addresses.
//! 2. **Field Extraction:** `check_bits`, `vpn2`, `vpn1`, `vpn0`, page offset, alignment bits.
//! 3. **Block Alignment:** Rounding down to a cache-line boundary.

use super::constants::{
    ALIGN_MASK, CHECK_BITS_SHIFT, PAGE_OFFSET_MASK, VPN_FIELD_BITS, VPN_FIELD_MASK, VPN0_SHIFT,
    VPN1_SHIFT, VPN2_SHIFT,
};

/// Extracts bits `[hi:lo]` (inclusive) of `x`.
#[inline(always)]
pub const fn bits(x: u64, hi: u32, lo: u32) -> u64 {
    let width = hi - lo + 1;
    if width >= 64 {
        x >> lo
    } else {
        (x >> lo) & ((1u64 << width) - 1)
    }
}

/// A virtual address (or a 64-bit word being tested as one).
///
/// Words pulled out of a cache line are wrapped in `VirtAddr` before the scanner
/// decides whether they look like pointers, so every field accessor here must be
/// total over arbitrary `u64` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtAddr(pub u64);

impl VirtAddr {
    /// Creates a new virtual address from a raw 64-bit value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(&self) -> u64 {
        self.0
    }

    /// Upper bits `[63:39]`; zero for any canonical user-space Sv39 address.
    #[inline(always)]
    pub const fn check_bits(&self) -> u64 {
        bits(self.0, 63, CHECK_BITS_SHIFT)
    }

    /// Level-2 page-table index, bits `[38:30]`.
    #[inline(always)]
    pub const fn vpn2(&self) -> u64 {
        (self.0 >> VPN2_SHIFT) & VPN_FIELD_MASK
    }

    /// Level-1 page-table index, bits `[29:21]`.
    #[inline(always)]
    pub const fn vpn1(&self) -> u64 {
        (self.0 >> VPN1_SHIFT) & VPN_FIELD_MASK
    }

    /// Level-0 page-table index, bits `[20:12]`.
    #[inline(always)]
    pub const fn vpn0(&self) -> u64 {
        (self.0 >> VPN0_SHIFT) & VPN_FIELD_MASK
    }

    /// Extracts the page offset (bits `[11:0]`).
    #[inline(always)]
    pub const fn page_offset(&self) -> u64 {
        self.0 & PAGE_OFFSET_MASK
    }

    /// Low two bits; zero for a word-aligned pointer.
    #[inline(always)]
    pub const fn align_bits(&self) -> u64 {
        self.0 & ALIGN_MASK
    }

    /// Region key `(vpn2 << 9) | vpn1` used by the confidence table.
    #[inline(always)]
    pub const fn region_key(&self) -> u64 {
        (self.vpn2() << VPN_FIELD_BITS) | self.vpn1()
    }

    /// Rounds the address down to a `line_bytes` boundary.
    ///
    /// # Arguments
    ///
    /// * `line_bytes` - Cache line size; must be a power of two.
    #[inline(always)]
    pub const fn block_align(&self, line_bytes: u64) -> u64 {
        self.0 & !(line_bytes - 1)
    }
}

impl From<u64> for VirtAddr {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}

//! Pointer scanner.
//!
//! Classifies the eight 64-bit words of a cache line as pointer candidates.
//! A word is kept when it looks like a canonical, word-aligned Sv39 address
//! whose region the confidence table currently reports as hot:
//!
//! - `check_bits == 0`
//! - `table.search(vpn2, vpn1)`
//! - `vpn0 != 0`
//! - `align_bits == 0`
//!
//! Scanning never writes to the table.

use super::entry::RegionEntry;
use super::vpn_table::VpnTable;
use crate::common::addr::VirtAddr;
use crate::common::constants::LINE_WORDS;

/// Whether a single word passes every pointer heuristic.
pub fn is_pointer_candidate<E: RegionEntry>(table: &VpnTable<E>, word: u64) -> bool {
    let va = VirtAddr::new(word);
    va.check_bits() == 0
        && table.search(va.vpn2(), va.vpn1())
        && va.vpn0() != 0
        && va.align_bits() == 0
}

/// Returns the accepted words of `words` in their original order.
pub fn scan_pointer<E: RegionEntry>(table: &VpnTable<E>, words: &[u64; LINE_WORDS]) -> Vec<u64> {
    words
        .iter()
        .copied()
        .filter(|&w| is_pointer_candidate(table, w))
        .collect()
}

//! Test fixtures for building addresses, line payloads, and warmed-up prefetchers.

use rvsim_cdp::CdpPrefetcher;
use rvsim_cdp::common::RESET_PERIOD;
use rvsim_cdp::config::{ByteOrder, CdpConfig, ReplacementPolicy, VpnTableConfig};
use rvsim_cdp::core::units::prefetch::{LineData, Packet, PrefetchSource};

/// Composes an Sv39 virtual address from its fields.
pub const fn va(vpn2: u64, vpn1: u64, vpn0: u64, offset: u64) -> u64 {
    (vpn2 << 30) | (vpn1 << 21) | (vpn0 << 12) | offset
}

/// The region every warm-up helper makes hot.
pub const HOT_VPN2: u64 = 1;
/// See [`HOT_VPN2`].
pub const HOT_VPN1: u64 = 5;

/// A pointer into the hot region.
pub const fn hot_ptr(vpn0: u64, offset: u64) -> u64 {
    va(HOT_VPN2, HOT_VPN1, vpn0, offset)
}

/// A small table geometry: 4 sets × 2 ways, 8 cells per entry, LRU.
pub fn small_table() -> VpnTableConfig {
    VpnTableConfig {
        sets: 4,
        ways: 2,
        policy: ReplacementPolicy::Lru,
        sub_entries: 8,
    }
}

/// Default configuration over [`small_table`].
pub fn small_config() -> CdpConfig {
    CdpConfig {
        table: small_table(),
        ..CdpConfig::default()
    }
}

/// Eight-word little-endian payload; missing words are zero.
pub fn line(words: &[u64]) -> LineData {
    let mut all = [0u64; 8];
    all[..words.len()].copy_from_slice(words);
    LineData::from_words(&all, ByteOrder::Little)
}

/// L1 data packet at `vaddr` carrying `words`, issued at `depth`.
pub fn data_packet(vaddr: u64, words: &[u64], depth: u32) -> Packet {
    let pkt = Packet::new(vaddr & !0x3f)
        .with_vaddr(vaddr)
        .with_data(line(words));
    if depth == 0 {
        pkt
    } else {
        pkt.prefetched_by(PrefetchSource::Cdp, depth)
    }
}

/// Feeds exactly one decay period of demand accesses to the hot region so
/// that it is hot after the closing sweep.
pub fn warm_up(pf: &mut CdpPrefetcher) {
    for i in 0..RESET_PERIOD {
        pf.add_to_vpn_table(hot_ptr(i % 16, 0));
    }
}

/// Builds a prefetcher from `config` with the hot region already warm.
pub fn warmed(config: CdpConfig) -> CdpPrefetcher {
    let mut pf = CdpPrefetcher::new(config).unwrap();
    warm_up(&mut pf);
    pf
}

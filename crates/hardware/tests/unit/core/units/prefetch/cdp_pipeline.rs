//! Content-Directed Prefetcher Pipeline Tests.
//!
//! Drives `CdpPrefetcher` through its notification hooks and checks emitted
//! requests and the exit counter bumped by every early return.

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use rvsim_cdp::CdpPrefetcher;
use rvsim_cdp::config::CdpConfig;
use rvsim_cdp::core::units::prefetch::cdp::HotVpn;
use rvsim_cdp::core::units::prefetch::{
    AccessInfo, LineData, Packet, PrefetchRequest, PrefetchSource, Prefetcher,
};
use rvsim_cdp::stats::CdpStats;

use crate::common::fixtures::{
    HOT_VPN1, HOT_VPN2, data_packet, hot_ptr, line, small_config, va, warmed,
};

fn request(addr: u64, priority: u32, depth: u32) -> PrefetchRequest {
    PrefetchRequest {
        addr,
        priority,
        source: PrefetchSource::Cdp,
        depth,
    }
}

fn notify(pf: &mut CdpPrefetcher, pkt: &Packet, l1: bool) -> Vec<PrefetchRequest> {
    let mut out = Vec::new();
    pf.notify_with_data(pkt, l1, &mut out);
    out
}

// ══════════════════════════════════════════════════════════
// 1. Emission
// ══════════════════════════════════════════════════════════

#[test]
fn data_notify_emits_block_aligned_candidates() {
    let mut pf = warmed(small_config());
    let pkt = data_packet(hot_ptr(9, 0), &[hot_ptr(3, 0x48), 0, hot_ptr(4, 0x10)], 0);

    let out = notify(&mut pf, &pkt, true);

    assert_eq!(
        out,
        vec![request(hot_ptr(3, 0x40), 2, 1), request(hot_ptr(4, 0), 2, 1)]
    );
    let stats = pf.stats();
    assert_eq!(stats.data_notify_called, 1);
    assert_eq!(stats.triggered_in_rx_notify, 1);
    assert_eq!(stats.passed_filter, 2);
    assert_eq!(stats.inserted, 2);
    assert_eq!(stats.pf_issued, 2);
}

#[test]
fn repeated_line_is_deduplicated() {
    let mut pf = warmed(small_config());
    let pkt = data_packet(hot_ptr(9, 0), &[hot_ptr(3, 0), hot_ptr(4, 0)], 0);

    assert_eq!(notify(&mut pf, &pkt, true).len(), 2);
    assert!(notify(&mut pf, &pkt, true).is_empty());
    assert_eq!(pf.stats().pf_filtered, 2);
    assert_eq!(pf.stats().pf_issued, 2);
    assert_eq!(pf.stats().data_notify_no_addr_found, 0);
}

#[test]
fn pointers_to_same_block_emit_once() {
    let mut pf = warmed(small_config());
    let pkt = data_packet(hot_ptr(9, 0), &[hot_ptr(3, 0x08), hot_ptr(3, 0x30)], 0);
    assert_eq!(notify(&mut pf, &pkt, true), vec![request(hot_ptr(3, 0), 2, 1)]);
    assert_eq!(pf.stats().pf_filtered, 1);
}

#[test]
fn chained_depth_lowers_priority() {
    let mut pf = warmed(small_config());
    let pkt = data_packet(hot_ptr(9, 0), &[hot_ptr(3, 0)], 2);
    assert_eq!(notify(&mut pf, &pkt, true), vec![request(hot_ptr(3, 0), 0, 3)]);
}

#[test]
fn big_endian_payload_decoded_with_config() {
    let config = CdpConfig {
        byte_order: rvsim_cdp::config::ByteOrder::Big,
        ..small_config()
    };
    let mut pf = warmed(config);
    let mut words = [0u64; 8];
    words[0] = hot_ptr(3, 0);
    let pkt = Packet::new(0)
        .with_vaddr(hot_ptr(9, 0))
        .with_data(LineData::from_words(&words, rvsim_cdp::config::ByteOrder::Big));
    assert_eq!(notify(&mut pf, &pkt, true), vec![request(hot_ptr(3, 0), 2, 1)]);

    // Same bytes read the other way round are not pointers.
    let little = data_packet(hot_ptr(9, 0), &[hot_ptr(5, 0)], 0);
    assert!(notify(&mut pf, &little, true).is_empty());
}

// ══════════════════════════════════════════════════════════
// 2. Data-notify exits
// ══════════════════════════════════════════════════════════

#[test]
fn exit_no_vaddr_checked_first() {
    let mut pf = warmed(small_config());
    let pkt = Packet::new(0x40).with_data(LineData::BlockNotFound);
    assert!(notify(&mut pf, &pkt, false).is_empty());
    assert_eq!(
        pf.stats(),
        &CdpStats {
            data_notify_called: 1,
            data_notify_no_va: 1,
            ..CdpStats::default()
        }
    );
}

#[test]
fn exit_block_not_found() {
    let mut pf = warmed(small_config());
    let pkt = Packet::new(0x40)
        .with_vaddr(hot_ptr(9, 0))
        .with_data(LineData::BlockNotFound);
    assert!(notify(&mut pf, &pkt, true).is_empty());
    assert_eq!(pf.stats().data_notify_exit_block_not_found, 1);
    assert_eq!(pf.stats().data_notify_no_data, 0);
}

#[test]
fn exit_no_data() {
    let mut pf = warmed(small_config());
    let pkt = Packet::new(0x40).with_vaddr(hot_ptr(9, 0));
    assert!(notify(&mut pf, &pkt, true).is_empty());
    assert_eq!(pf.stats().data_notify_no_data, 1);
}

#[test]
fn exit_not_l1() {
    let mut pf = warmed(small_config());
    let pkt = data_packet(hot_ptr(9, 0), &[hot_ptr(3, 0)], 0);
    assert!(notify(&mut pf, &pkt, false).is_empty());
    assert_eq!(pf.stats().data_notify_exit_filter, 1);
    assert_eq!(pf.stats().triggered_in_rx_notify, 0);
}

#[test]
fn exit_depth_at_threshold() {
    let mut pf = warmed(small_config());
    let pkt = data_packet(hot_ptr(9, 0), &[hot_ptr(3, 0)], 3);
    assert!(notify(&mut pf, &pkt, true).is_empty());
    assert_eq!(pf.stats().data_notify_exit_depth, 1);
    assert_eq!(pf.stats().passed_filter, 0);
}

#[test]
fn exit_no_pointer_found() {
    let mut pf = warmed(small_config());
    let pkt = data_packet(hot_ptr(9, 0), &[1, 2, 3, va(7, 7, 7, 0)], 0);
    assert!(notify(&mut pf, &pkt, true).is_empty());
    assert_eq!(pf.stats().triggered_in_rx_notify, 1);
    assert_eq!(pf.stats().data_notify_no_addr_found, 1);
}

#[test]
fn data_notify_does_not_train() {
    let mut pf = warmed(small_config());
    let before = pf.vpn_table().write_counter();
    let pkt = data_packet(va(7, 7, 7, 0), &[hot_ptr(3, 0)], 0);
    let _ = notify(&mut pf, &pkt, true);
    assert_eq!(pf.vpn_table().write_counter(), before);
    assert_eq!(pf.vpn_table().ref_count(7, 7), None);
}

// ══════════════════════════════════════════════════════════
// 3. Demand accesses
// ══════════════════════════════════════════════════════════

#[test]
fn demand_miss_trains_table() {
    let mut pf = CdpPrefetcher::new(small_config()).unwrap();
    let mut out = Vec::new();
    let info = AccessInfo {
        addr: 0x8000,
        vaddr: Some(hot_ptr(1, 0)),
        miss: true,
        data: LineData::Missing,
    };
    pf.calculate_prefetch(&info, &mut out);

    assert!(out.is_empty());
    assert_eq!(pf.stats().triggered_in_calc_pf, 1);
    assert_eq!(pf.stats().miss_notify_called, 1);
    assert_eq!(pf.vpn_table().ref_count(HOT_VPN2, HOT_VPN1), Some(1));
}

#[test]
fn demand_hit_without_vaddr_only_counts() {
    let mut pf = CdpPrefetcher::new(small_config()).unwrap();
    let mut out = Vec::new();
    pf.calculate_prefetch(&AccessInfo::default(), &mut out);
    assert_eq!(pf.stats().triggered_in_calc_pf, 1);
    assert_eq!(pf.stats().miss_notify_called, 0);
    assert_eq!(pf.vpn_table().write_counter(), 0);
}

#[test]
fn demand_accesses_alone_make_region_hot() {
    let mut pf = CdpPrefetcher::new(small_config()).unwrap();
    let mut out = Vec::new();
    for i in 0..128 {
        let info = AccessInfo {
            addr: i * 64,
            vaddr: Some(hot_ptr(i % 8, 0)),
            miss: i % 2 == 0,
            data: LineData::Missing,
        };
        pf.calculate_prefetch(&info, &mut out);
    }
    assert!(pf.vpn_table().search(HOT_VPN2, HOT_VPN1));
    assert_eq!(pf.stats().miss_notify_called, 64);

    let access = AccessInfo {
        addr: 0,
        vaddr: Some(hot_ptr(9, 0)),
        miss: true,
        data: line(&[hot_ptr(3, 0x20)]),
    };
    pf.calculate_prefetch(&access, &mut out);
    assert_eq!(out, vec![request(hot_ptr(3, 0), 2, 1)]);
}

// ══════════════════════════════════════════════════════════
// 4. Feedback
// ══════════════════════════════════════════════════════════

fn throttled() -> CdpConfig {
    CdpConfig {
        enable_throttle: true,
        ..small_config()
    }
}

#[test]
fn own_fill_lowers_confidence() {
    let mut pf = warmed(throttled());
    let before = pf.vpn_table().confidence(HOT_VPN2, HOT_VPN1).unwrap();
    let fill = Packet::new(0)
        .with_vaddr(hot_ptr(3, 0))
        .prefetched_by(PrefetchSource::Cdp, 1);
    let mut out = Vec::new();
    pf.notify_fill(&fill, &mut out);

    assert!(out.is_empty());
    assert_eq!(
        pf.vpn_table().confidence(HOT_VPN2, HOT_VPN1),
        Some(before - 1)
    );
    assert_eq!(pf.stats().fill_updates, 1);
}

#[test]
fn foreign_and_demand_fills_ignored() {
    let mut pf = warmed(throttled());
    let before = pf.vpn_table().confidence(HOT_VPN2, HOT_VPN1);
    let mut out = Vec::new();
    let other = Packet::new(0)
        .with_vaddr(hot_ptr(3, 0))
        .prefetched_by(PrefetchSource::Other, 1);
    pf.notify_fill(&other, &mut out);
    pf.notify_fill(&Packet::new(0).with_vaddr(hot_ptr(3, 0)), &mut out);

    assert_eq!(pf.vpn_table().confidence(HOT_VPN2, HOT_VPN1), before);
    assert_eq!(pf.stats().fill_updates, 0);
}

#[test]
fn fills_ignored_without_throttling() {
    let mut pf = warmed(small_config());
    let before = pf.vpn_table().confidence(HOT_VPN2, HOT_VPN1);
    let fill = Packet::new(0)
        .with_vaddr(hot_ptr(3, 0))
        .prefetched_by(PrefetchSource::Cdp, 1);
    pf.notify_fill(&fill, &mut Vec::new());
    assert_eq!(pf.vpn_table().confidence(HOT_VPN2, HOT_VPN1), before);
    assert_eq!(pf.stats().fill_updates, 0);
}

#[test]
fn prefetch_hits_count_as_useful() {
    let mut pf = warmed(small_config());
    let pkt = Packet::new(0);
    let mut out = Vec::new();
    pf.pf_hit_notify(0.75, PrefetchSource::Cdp, &pkt, &mut out);
    pf.pf_hit_notify(0.5, PrefetchSource::Other, &pkt, &mut out);
    assert_eq!(pf.stats().pf_useful, 1);
    assert!((pf.reported_accuracy() - 0.5).abs() < f32::EPSILON);
    assert!(out.is_empty());
}

#[test]
fn mpki_from_l3_misses() {
    let mut pf = CdpPrefetcher::new(small_config()).unwrap();
    assert!((pf.mpki() - 1.0).abs() < f32::EPSILON);

    pf.notify_ins(1000);
    assert!((pf.mpki() - 1.0).abs() < f32::EPSILON);

    pf.set_l3_miss_info(3, 40);
    pf.notify_ins(0);
    assert!((pf.mpki() - 1.0).abs() < f32::EPSILON);

    pf.notify_ins(2000);
    assert!((pf.mpki() - 20.0).abs() < f32::EPSILON);
}

// ══════════════════════════════════════════════════════════
// 5. Construction
// ══════════════════════════════════════════════════════════

#[test]
fn invalid_config_rejected() {
    let config = CdpConfig {
        lru_filter_size: 0,
        ..small_config()
    };
    assert!(CdpPrefetcher::new(config).is_err());
}

#[test]
fn hot_sink_sees_warm_up_sweep() {
    let seen: Arc<Mutex<Vec<HotVpn>>> = Arc::default();
    let sink_seen = Arc::clone(&seen);
    let mut pf = CdpPrefetcher::new(small_config())
        .unwrap()
        .with_hot_vpn_sink(Box::new(move |hot: &[HotVpn]| {
            sink_seen.lock().unwrap().extend_from_slice(hot);
        }));
    crate::common::fixtures::warm_up(&mut pf);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!((seen[0].vpn2, seen[0].vpn1), (HOT_VPN2, HOT_VPN1));
}

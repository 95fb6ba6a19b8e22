//! Replay Driver Tests.
//!
//! Verifies that each trace event reaches the matching prefetcher hook, and
//! replays a recorded linked-list walk end to end through the real prefetcher.

use std::fmt::Write as _;
use std::io::{Cursor, Write};

use mockall::predicate::eq;
use rvsim_cdp::CdpPrefetcher;
use rvsim_cdp::config::ByteOrder;
use rvsim_cdp::core::units::prefetch::{PrefetchRequest, PrefetchSource};
use rvsim_cdp::sim::{ReplaySummary, Replayer, load_trace, parse_trace};
use tempfile::NamedTempFile;
use tracing_subscriber::EnvFilter;

use crate::common::fixtures::{hot_ptr, small_config};
use crate::common::mocks::MockPf;

const DISPATCH: &str = r#"
{"event":"access","addr":64,"vaddr":4096,"miss":true}
{"event":"data","addr":64,"vaddr":4096,"l1":false,"data":[0,0,0,0,0,0,0,0]}
{"event":"fill","addr":128,"vaddr":8192,"pf_source":"Cdp","pf_depth":1}
{"event":"hit","addr":128,"vaddr":8192,"pf_source":"Cdp","accuracy":0.25}
{"event":"instructions","count":1000}
{"event":"l3_misses","own":1,"total":2}
"#;

#[test]
fn events_dispatch_to_matching_hooks() {
    let mut pf = MockPf::new();
    pf.expect_calculate_prefetch()
        .withf(|info, _| info.miss && info.vaddr == Some(4096))
        .times(1)
        .returning(|_, out| {
            out.push(PrefetchRequest {
                addr: 0x40,
                priority: 1,
                source: PrefetchSource::Other,
                depth: 1,
            });
        });
    pf.expect_notify_with_data()
        .withf(|pkt, l1, _| !*l1 && pkt.data.words(ByteOrder::Little).is_some())
        .times(1)
        .return_const(());
    pf.expect_notify_fill()
        .withf(|pkt, _| pkt.pf_source == Some(PrefetchSource::Cdp) && pkt.pf_depth == 1)
        .times(1)
        .return_const(());
    pf.expect_pf_hit_notify()
        .withf(|acc, src, pkt, _| {
            (*acc - 0.25).abs() < f32::EPSILON
                && *src == PrefetchSource::Cdp
                && pkt.vaddr == Some(8192)
        })
        .times(1)
        .return_const(());
    pf.expect_notify_ins()
        .with(eq(1000))
        .times(1)
        .return_const(());
    pf.expect_set_l3_miss_info()
        .with(eq(1), eq(2))
        .times(1)
        .return_const(());

    let events = parse_trace(Cursor::new(DISPATCH)).unwrap();
    let mut replayer = Replayer::new(pf, ByteOrder::Little);
    let summary = replayer.run(&events);

    assert_eq!(
        summary,
        ReplaySummary {
            events: 6,
            requests: 1,
        }
    );
    assert_eq!(replayer.issued().len(), 1);
}

#[test]
fn step_returns_only_new_requests() {
    let mut pf = MockPf::new();
    pf.expect_calculate_prefetch().returning(|info, out| {
        out.push(PrefetchRequest {
            addr: info.addr,
            priority: 0,
            source: PrefetchSource::Other,
            depth: 1,
        });
    });
    let events = parse_trace(Cursor::new(
        "{\"event\":\"access\",\"addr\":1}\n{\"event\":\"access\",\"addr\":2}\n",
    ))
    .unwrap();

    let mut replayer = Replayer::new(pf, ByteOrder::Little);
    assert_eq!(replayer.step(&events[0])[0].addr, 1);
    let second = replayer.step(&events[1]);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].addr, 2);
    assert_eq!(replayer.summary().events, 2);
}

#[test]
fn without_retention_only_last_step_is_kept() {
    let mut pf = MockPf::new();
    pf.expect_calculate_prefetch().returning(|info, out| {
        out.push(PrefetchRequest {
            addr: info.addr,
            priority: 0,
            source: PrefetchSource::Other,
            depth: 1,
        });
    });
    let events = parse_trace(Cursor::new(
        "{\"event\":\"access\",\"addr\":1}\n{\"event\":\"access\",\"addr\":2}\n{\"event\":\"access\",\"addr\":3}\n",
    ))
    .unwrap();

    let mut replayer = Replayer::new(pf, ByteOrder::Little).retain_issued(false);
    let summary = replayer.run(&events);
    assert_eq!(summary.requests, 3);
    assert_eq!(replayer.issued().len(), 1);
    assert_eq!(replayer.issued()[0].addr, 3);
}

/// A list walk: demand accesses train the region, then a node payload holding
/// two next pointers triggers prefetches, and one of them is hit.
fn list_walk_trace() -> String {
    let mut text = String::from("# list walk\n");
    for i in 0..128u64 {
        let _ = writeln!(
            text,
            r#"{{"event":"access","addr":{},"vaddr":{},"miss":true}}"#,
            i * 64,
            hot_ptr(i % 16, 0)
        );
    }
    let _ = writeln!(
        text,
        r#"{{"event":"data","addr":0,"vaddr":{},"data":[{},{},0,0,0,0,0,0]}}"#,
        hot_ptr(20, 0),
        hot_ptr(21, 0x18),
        hot_ptr(22, 0x40)
    );
    let _ = writeln!(
        text,
        r#"{{"event":"fill","addr":0,"vaddr":{},"pf_source":"Cdp","pf_depth":1}}"#,
        hot_ptr(21, 0)
    );
    let _ = writeln!(
        text,
        r#"{{"event":"hit","addr":0,"vaddr":{},"pf_source":"Cdp"}}"#,
        hot_ptr(21, 0)
    );
    text
}

#[test]
fn list_walk_end_to_end() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(list_walk_trace().as_bytes()).unwrap();
    let events = load_trace(file.path().to_str().unwrap()).unwrap();

    let pf = CdpPrefetcher::new(small_config()).unwrap();
    let mut replayer = Replayer::new(pf, ByteOrder::Little);
    let summary = replayer.run(&events);

    assert_eq!(summary.events, 131);
    assert_eq!(summary.requests, 2);
    let addrs: Vec<u64> = replayer.issued().iter().map(|r| r.addr).collect();
    assert_eq!(addrs, vec![hot_ptr(21, 0), hot_ptr(22, 0x40)]);

    let pf = replayer.into_inner();
    assert_eq!(pf.stats().miss_notify_called, 128);
    assert_eq!(pf.stats().triggered_in_rx_notify, 1);
    assert_eq!(pf.stats().pf_useful, 1);
}

#[test]
fn replay_with_tracing_enabled() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("rvsim_cdp=trace"))
        .with_test_writer()
        .finish();

    let events = parse_trace(Cursor::new(list_walk_trace())).unwrap();
    let summary = tracing::subscriber::with_default(subscriber, || {
        let pf = CdpPrefetcher::new(small_config()).unwrap();
        let mut replayer = Replayer::new(pf, ByteOrder::Little);
        replayer.run(&events)
    });
    assert_eq!(summary.requests, 2);
}

//! Trace replay driver.
//!
//! Stands in for the cache model: each [`TraceEvent`] is turned into the
//! matching notification and the prefetcher's output is collected.

use tracing::debug;

use super::trace::TraceEvent;
use crate::config::ByteOrder;
use crate::core::units::prefetch::{PrefetchRequest, Prefetcher};

/// Totals of one replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Events replayed.
    pub events: u64,
    /// Requests emitted.
    pub requests: u64,
}

/// Plays events against a prefetcher and records the requests it emits.
///
/// By default every request is kept for the whole run; with
/// [`Replayer::retain_issued`] off only the latest event's requests are held.
#[derive(Debug)]
pub struct Replayer<P> {
    prefetcher: P,
    byte_order: ByteOrder,
    issued: Vec<PrefetchRequest>,
    retain: bool,
    summary: ReplaySummary,
}

impl<P: Prefetcher> Replayer<P> {
    /// Wraps `prefetcher`; payloads are encoded in `byte_order`.
    pub const fn new(prefetcher: P, byte_order: ByteOrder) -> Self {
        Self {
            prefetcher,
            byte_order,
            issued: Vec::new(),
            retain: true,
            summary: ReplaySummary {
                events: 0,
                requests: 0,
            },
        }
    }

    /// Chooses whether requests are kept across events. Counting in
    /// [`ReplaySummary::requests`] is unaffected.
    #[must_use]
    pub const fn retain_issued(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    /// Delivers one event. Returns the requests it produced.
    pub fn step(&mut self, event: &TraceEvent) -> &[PrefetchRequest] {
        if !self.retain {
            self.issued.clear();
        }
        let start = self.issued.len();
        let order = self.byte_order;
        match event {
            TraceEvent::Access { .. } => {
                if let Some(info) = event.access_info(order) {
                    self.prefetcher.calculate_prefetch(&info, &mut self.issued);
                }
            }
            TraceEvent::Data { l1, .. } => {
                if let Some(pkt) = event.packet(order) {
                    self.prefetcher.notify_with_data(&pkt, *l1, &mut self.issued);
                }
            }
            TraceEvent::Fill { .. } => {
                if let Some(pkt) = event.packet(order) {
                    self.prefetcher.notify_fill(&pkt, &mut self.issued);
                }
            }
            TraceEvent::Hit {
                pf_source, accuracy, ..
            } => {
                if let Some(pkt) = event.packet(order) {
                    self.prefetcher
                        .pf_hit_notify(*accuracy, *pf_source, &pkt, &mut self.issued);
                }
            }
            TraceEvent::Instructions { count } => self.prefetcher.notify_ins(*count),
            TraceEvent::L3Misses { own, total } => self.prefetcher.set_l3_miss_info(*own, *total),
        }
        self.summary.events += 1;
        self.summary.requests += (self.issued.len() - start) as u64;
        &self.issued[start..]
    }

    /// Delivers every event in order.
    pub fn run<'a>(&mut self, events: impl IntoIterator<Item = &'a TraceEvent>) -> ReplaySummary {
        for event in events {
            let _ = self.step(event);
        }
        debug!(
            events = self.summary.events,
            requests = self.summary.requests,
            "replay finished"
        );
        self.summary
    }

    /// Requests emitted so far, in emission order. Without retention this is
    /// only the last event's output.
    pub fn issued(&self) -> &[PrefetchRequest] {
        &self.issued
    }

    /// Running totals.
    pub const fn summary(&self) -> ReplaySummary {
        self.summary
    }

    /// The wrapped prefetcher.
    pub const fn prefetcher(&self) -> &P {
        &self.prefetcher
    }

    /// Mutable access to the wrapped prefetcher.
    pub fn prefetcher_mut(&mut self) -> &mut P {
        &mut self.prefetcher
    }

    /// Consumes the driver, returning the prefetcher.
    pub fn into_inner(self) -> P {
        self.prefetcher
    }
}

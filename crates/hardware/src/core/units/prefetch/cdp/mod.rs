//! Content-Directed Prefetcher.
//!
//! Treats the contents of fetched cache lines as candidate pointers and
//! prefetches the ones that land in regions recently seen as dereference
//! targets (after Cooksey & Jourdan, "Stateless, Content-Directed Data
//! Prefetching").
//!
//! Per event:
//! 1. **Ingest:** demand virtual addresses feed the confidence table
//!    (`add_to_vpn_table`), which periodically decays itself.
//! 2. **Scan:** line payloads are decoded into eight words and filtered by the
//!    pointer heuristics against table hotness.
//! 3. **Emit:** survivors are block-aligned, deduplicated, capped at the
//!    (accuracy-throttled) degree, and appended as prioritized requests. The
//!    overflow waits in a small local buffer for the next trigger.
//! 4. **Feedback:** fills of our own prefetches decay their region's confidence;
//!    prefetch hits raise measured accuracy.

/// Confidence cells and region entries.
pub mod entry;

/// Dedup filter over issued addresses.
pub mod filter;

/// Pointer heuristics over line words.
pub mod scanner;

/// Set-associative confidence table.
pub mod vpn_table;

pub use self::entry::{RegionEntry, SubVpnEntry, VpnEntry};
pub use self::filter::PrefetchFilter;
pub use self::vpn_table::{HotVpn, HotVpnSink, VpnTable};

use std::collections::VecDeque;

use tracing::{debug, trace};

use super::{AccessInfo, LineData, Packet, PrefetchRequest, PrefetchSource, Prefetcher};
use crate::common::addr::VirtAddr;
use crate::common::constants::{ACCURACY_MIN_ISSUED, LINE_WORDS};
use crate::common::error::ConfigError;
use crate::config::CdpConfig;
use crate::stats::CdpStats;

/// Content-directed prefetcher state.
#[derive(Debug)]
pub struct CdpPrefetcher {
    config: CdpConfig,
    vpn_table: VpnTable<VpnEntry>,
    pf_lru_filter: PrefetchFilter,
    local_buffer: VecDeque<PrefetchRequest>,
    stats: CdpStats,
    /// `(own L3 misses, total L3 misses)` as last reported.
    l3_miss_info: (u64, u64),
    mpki: f32,
    reported_accuracy: f32,
}

impl CdpPrefetcher {
    /// Creates a prefetcher from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `config` fails [`CdpConfig::validate`].
    pub fn new(config: CdpConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let vpn_table = VpnTable::from_config(&config.table)?;
        let pf_lru_filter = PrefetchFilter::new(config.lru_filter_size)?;
        Ok(Self {
            local_buffer: VecDeque::with_capacity(config.local_buffer_depth),
            config,
            vpn_table,
            pf_lru_filter,
            stats: CdpStats::default(),
            l3_miss_info: (0, 0),
            mpki: 1.0,
            reported_accuracy: 1.0,
        })
    }

    /// Installs a callback receiving the hot regions after every decay sweep.
    #[must_use]
    pub fn with_hot_vpn_sink(mut self, sink: HotVpnSink) -> Self {
        self.vpn_table.set_hot_vpn_sink(sink);
        self
    }

    /// Active configuration.
    pub const fn config(&self) -> &CdpConfig {
        &self.config
    }

    /// Counters collected so far.
    pub const fn stats(&self) -> &CdpStats {
        &self.stats
    }

    /// The confidence table.
    pub const fn vpn_table(&self) -> &VpnTable<VpnEntry> {
        &self.vpn_table
    }

    /// The dedup filter.
    pub const fn filter(&self) -> &PrefetchFilter {
        &self.pf_lru_filter
    }

    /// Candidates currently deferred.
    pub fn local_buffer_len(&self) -> usize {
        self.local_buffer.len()
    }

    /// Last misses-per-kilo-instruction estimate.
    pub const fn mpki(&self) -> f32 {
        self.mpki
    }

    /// Last accuracy reported by the cache on a prefetch hit.
    pub const fn reported_accuracy(&self) -> f32 {
        self.reported_accuracy
    }

    /// Records a demand virtual address in the confidence table, then lets
    /// the table decay if its period is full.
    pub fn add_to_vpn_table(&mut self, vaddr: u64) {
        let va = VirtAddr::new(vaddr);
        self.vpn_table.add(va.vpn2(), va.vpn1());
        let _ = self
            .vpn_table
            .reset_confidence(self.config.throttle_aggressiveness, self.config.enable_throttle);
    }

    /// Returns the words of a line that look like pointers into hot regions.
    ///
    /// # Arguments
    ///
    /// * `trigger` - Address of the line being scanned (diagnostics only).
    /// * `words` - The eight words of the line.
    pub fn scan_pointer(&self, trigger: u64, words: &[u64; LINE_WORDS]) -> Vec<u64> {
        let found = scanner::scan_pointer(&self.vpn_table, words);
        trace!("pointer scan of {trigger:#x}: {} candidates", found.len());
        found
    }

    /// Emits `addr` unless it was issued recently.
    ///
    /// Returns `true` when a request was appended to `addresses`.
    pub fn send_pf_with_filter(
        &mut self,
        addr: u64,
        addresses: &mut Vec<PrefetchRequest>,
        priority: u32,
        source: PrefetchSource,
        depth: u32,
    ) -> bool {
        if !self.pf_lru_filter.insert(addr) {
            self.stats.pf_filtered += 1;
            trace!("prefetch {addr:#x} filtered");
            return false;
        }
        addresses.push(PrefetchRequest {
            addr,
            priority,
            source,
            depth,
        });
        self.stats.inserted += 1;
        self.stats.pf_issued += 1;
        true
    }

    /// Fraction of issued prefetches that were useful.
    ///
    /// Stays at `1.0` until more than 100 prefetches were issued.
    pub fn cdp_true_accuracy(&self) -> f32 {
        if self.stats.pf_issued > ACCURACY_MIN_ISSUED {
            self.stats.pf_useful as f32 / self.stats.pf_issued as f32
        } else {
            1.0
        }
    }

    /// Candidates allowed per trigger.
    ///
    /// Without throttling this is the configured degree; with throttling it is
    /// `ceil(degree · accuracy^aggressiveness)`, never below one.
    pub fn effective_degree(&self) -> usize {
        let degree = self.config.degree;
        if degree == 0 || !self.config.enable_throttle {
            return degree;
        }
        let scale = self
            .cdp_true_accuracy()
            .powf(self.config.throttle_aggressiveness);
        ((degree as f32 * scale).ceil() as usize).clamp(1, degree)
    }

    const fn priority_for(&self, depth: u32) -> u32 {
        self.config.depth_threshold.saturating_sub(depth)
    }

    fn is_deferred(&self, block: u64) -> bool {
        self.local_buffer.iter().any(|r| r.addr == block)
    }

    fn defer(&mut self, req: PrefetchRequest) {
        if self.config.local_buffer_depth == 0 {
            self.stats.buffer_dropped += 1;
            return;
        }
        if self.local_buffer.len() >= self.config.local_buffer_depth {
            let _ = self.local_buffer.pop_front();
            self.stats.buffer_dropped += 1;
        }
        self.local_buffer.push_back(req);
        self.stats.deferred += 1;
    }

    /// Scans `words`, drains the local buffer, and emits up to the effective
    /// degree. Returns the number of words accepted by the scanner.
    fn emit_candidates(
        &mut self,
        trigger: u64,
        words: &[u64; LINE_WORDS],
        depth: u32,
        addresses: &mut Vec<PrefetchRequest>,
    ) -> usize {
        let found = self.scan_pointer(trigger, words);
        self.stats.passed_filter += found.len() as u64;

        let budget = self.effective_degree();
        let mut sent = 0;

        while sent < budget {
            let Some(req) = self.local_buffer.pop_front() else {
                break;
            };
            if self.send_pf_with_filter(req.addr, addresses, req.priority, req.source, req.depth) {
                sent += 1;
            }
        }

        let line_bytes = self.config.line_bytes as u64;
        let priority = self.priority_for(depth);
        for candidate in &found {
            let block = VirtAddr::new(*candidate).block_align(line_bytes);
            if sent < budget {
                if self.send_pf_with_filter(block, addresses, priority, PrefetchSource::Cdp, depth) {
                    sent += 1;
                }
            } else if self.pf_lru_filter.contains(block) || self.is_deferred(block) {
                self.stats.pf_filtered += 1;
            } else {
                self.defer(PrefetchRequest {
                    addr: block,
                    priority,
                    source: PrefetchSource::Cdp,
                    depth,
                });
            }
        }

        if sent > 0 {
            debug!(sent, budget, depth, "cdp prefetches emitted for {trigger:#x}");
        }
        found.len()
    }
}

impl Prefetcher for CdpPrefetcher {
    /// Learns from a demand access and scans its line if one came with it.
    fn calculate_prefetch(&mut self, info: &AccessInfo, addresses: &mut Vec<PrefetchRequest>) {
        self.stats.triggered_in_calc_pf += 1;
        if info.miss {
            self.stats.miss_notify_called += 1;
        }
        if let Some(vaddr) = info.vaddr {
            self.add_to_vpn_table(vaddr);
        }
        if let Some(words) = info.data.words(self.config.byte_order) {
            let trigger = info.vaddr.unwrap_or(info.addr);
            let _ = self.emit_candidates(trigger, &words, 1, addresses);
        }
    }

    /// Feeds a completed fill of one of our prefetches back into the table.
    fn notify_fill(&mut self, pkt: &Packet, _addresses: &mut Vec<PrefetchRequest>) {
        if !self.config.enable_throttle || pkt.pf_source != Some(PrefetchSource::Cdp) {
            return;
        }
        if let Some(vaddr) = pkt.vaddr {
            let va = VirtAddr::new(vaddr);
            self.vpn_table.update(va.vpn2(), va.vpn1(), true);
            self.stats.fill_updates += 1;
        }
    }

    /// Scans a line payload arriving for an L1 request.
    fn notify_with_data(&mut self, pkt: &Packet, is_l1_use: bool, addresses: &mut Vec<PrefetchRequest>) {
        self.stats.data_notify_called += 1;

        let Some(vaddr) = pkt.vaddr else {
            self.stats.data_notify_no_va += 1;
            trace!("data notify for {:#x}: no vaddr", pkt.addr);
            return;
        };
        if pkt.data == LineData::BlockNotFound {
            self.stats.data_notify_exit_block_not_found += 1;
            trace!("data notify for {vaddr:#x}: block not found");
            return;
        }
        let Some(words) = pkt.data.words(self.config.byte_order) else {
            self.stats.data_notify_no_data += 1;
            trace!("data notify for {vaddr:#x}: no data");
            return;
        };
        if !is_l1_use {
            self.stats.data_notify_exit_filter += 1;
            return;
        }
        if pkt.pf_depth >= self.config.depth_threshold {
            self.stats.data_notify_exit_depth += 1;
            trace!(depth = pkt.pf_depth, "data notify for {vaddr:#x}: depth exceeded");
            return;
        }

        self.stats.triggered_in_rx_notify += 1;
        if self.emit_candidates(vaddr, &words, pkt.pf_depth + 1, addresses) == 0 {
            self.stats.data_notify_no_addr_found += 1;
        }
    }

    /// Counts a demand hit on one of our prefetches as useful.
    fn pf_hit_notify(
        &mut self,
        accuracy: f32,
        source: PrefetchSource,
        _pkt: &Packet,
        _addresses: &mut Vec<PrefetchRequest>,
    ) {
        self.reported_accuracy = accuracy;
        if source == PrefetchSource::Cdp {
            self.stats.pf_useful += 1;
        }
    }

    fn notify_ins(&mut self, ins_num: u64) {
        if self.l3_miss_info.1 != 0 && ins_num != 0 {
            self.mpki = (self.l3_miss_info.1 as f64 * 1000.0 / ins_num as f64) as f32;
        }
    }

    fn set_l3_miss_info(&mut self, own_misses: u64, total_misses: u64) {
        self.l3_miss_info = (own_misses, total_misses);
    }
}

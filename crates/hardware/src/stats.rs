//! Prefetcher statistics collection and reporting.
//!
//! This module tracks the counters of one content-directed prefetcher. It provides:
//! 1. **Triggers:** How often each notification hook ran and whether it produced work.
//! 2. **Data-notify exits:** One counter per reason a data notification was abandoned.
//! 3. **Filtering:** Candidates that passed the pointer scan, the dedup filter, and the buffer.
//! 4. **Accuracy:** Issued and useful prefetch counts feeding the throttle.

use serde::Serialize;

/// Counters of one prefetcher instance.
///
/// Every field is incremented at exactly one control point of `CdpPrefetcher`;
/// nothing here is derived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CdpStats {
    /// Data notifications that reached candidate emission.
    pub triggered_in_rx_notify: u64,
    /// Calls to `calculate_prefetch`.
    pub triggered_in_calc_pf: u64,
    /// Calls to `notify_with_data`.
    pub data_notify_called: u64,
    /// Data notifications whose block was not resident.
    pub data_notify_exit_block_not_found: u64,
    /// Data notifications from outside the L1.
    pub data_notify_exit_filter: u64,
    /// Data notifications at or beyond the depth threshold.
    pub data_notify_exit_depth: u64,
    /// Data notifications whose line held no pointer-like word.
    pub data_notify_no_addr_found: u64,
    /// Data notifications without a virtual address.
    pub data_notify_no_va: u64,
    /// Data notifications without a payload.
    pub data_notify_no_data: u64,
    /// Demand misses seen by `calculate_prefetch`.
    pub miss_notify_called: u64,
    /// Scanned words accepted as pointer candidates.
    pub passed_filter: u64,
    /// Candidates appended to the output list.
    pub inserted: u64,
    /// Candidates rejected by the dedup filter.
    pub pf_filtered: u64,
    /// Candidates parked in the local buffer because the degree was exhausted.
    pub deferred: u64,
    /// Deferred candidates dropped because the local buffer was full.
    pub buffer_dropped: u64,
    /// Prefetches issued by this prefetcher.
    pub pf_issued: u64,
    /// Issued prefetches later hit by a demand access.
    pub pf_useful: u64,
    /// Fills of this prefetcher's own requests that fed back into the table.
    pub fill_updates: u64,
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"triggers"`, `"data_notify"`, `"filter"`, `"accuracy"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["triggers", "data_notify", "filter", "accuracy"];

impl CdpStats {
    /// Ratio of useful to issued prefetches, or `0.0` before anything was issued.
    pub fn raw_accuracy(&self) -> f64 {
        if self.pf_issued == 0 {
            0.0
        } else {
            self.pf_useful as f64 / self.pf_issued as f64
        }
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// # Arguments
    ///
    /// * `sections` - Slice of section names to print, or empty for all.
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);

        println!("\n==========================================================");
        println!("CONTENT-DIRECTED PREFETCHER STATISTICS");
        println!("==========================================================");
        if want("triggers") {
            println!("TRIGGERS");
            println!("  cdp.triggered_calc_pf      {}", self.triggered_in_calc_pf);
            println!("  cdp.triggered_rx_notify    {}", self.triggered_in_rx_notify);
            println!("  cdp.miss_notify_called     {}", self.miss_notify_called);
            println!("  cdp.data_notify_called     {}", self.data_notify_called);
            println!("  cdp.fill_updates           {}", self.fill_updates);
            println!("----------------------------------------------------------");
        }
        if want("data_notify") {
            println!("DATA NOTIFY EXITS");
            println!("  exit.no_va                 {}", self.data_notify_no_va);
            println!("  exit.no_data               {}", self.data_notify_no_data);
            println!(
                "  exit.block_not_found       {}",
                self.data_notify_exit_block_not_found
            );
            println!("  exit.filter                {}", self.data_notify_exit_filter);
            println!("  exit.depth                 {}", self.data_notify_exit_depth);
            println!("  exit.no_addr_found         {}", self.data_notify_no_addr_found);
            println!("----------------------------------------------------------");
        }
        if want("filter") {
            println!("FILTERING");
            println!("  pf.passed_filter           {}", self.passed_filter);
            println!("  pf.dedup_rejected          {}", self.pf_filtered);
            println!("  pf.inserted                {}", self.inserted);
            println!("  pf.deferred                {}", self.deferred);
            println!("  pf.buffer_dropped          {}", self.buffer_dropped);
            println!("----------------------------------------------------------");
        }
        if want("accuracy") {
            println!("ACCURACY");
            println!("  pf.issued                  {}", self.pf_issued);
            println!("  pf.useful                  {}", self.pf_useful);
            println!(
                "  pf.accuracy                {:.2}%",
                self.raw_accuracy() * 100.0
            );
        }
        println!("==========================================================");
    }

    /// Prints all statistics sections to stdout.
    ///
    /// Equivalent to `print_sections(&[])`.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}

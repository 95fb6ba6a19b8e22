//! Confidence table over virtual page pairs.
//!
//! The table learns which 2 MiB regions (`(vpn2, vpn1)` pairs) are being
//! dereferenced and answers "is this region hot?" for the pointer scanner.
//!
//! A page pair is aggregated as `agg = (vpn2 << 9) | vpn1`. The low
//! `sub_entry_bits` of `agg` select a cell inside a region entry and the rest
//! form the store tag, so neighbouring regions share one entry.
//!
//! Writes (`add`) count toward a decay period of [`RESET_PERIOD`] operations.
//! `reset_confidence` closes the period once it is full; that sweep is the
//! only place a cell can become hot.

use std::fmt;

use tracing::{debug, trace};

use super::entry::RegionEntry;
use crate::common::constants::{RESET_PERIOD, VPN_FIELD_BITS};
use crate::common::error::ConfigError;
use crate::config::VpnTableConfig;
use crate::core::units::cache::{AssociativeSet, AssociativeStore, SlotId};

/// One hot cell reported after a decay sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotVpn {
    /// Level-2 index the cell was initialized with.
    pub vpn2: u64,
    /// Level-1 index the cell was initialized with.
    pub vpn1: u64,
    /// Carried confidence after the sweep.
    pub prev_ref_cnt: u64,
}

/// Callback receiving the hot cells after every decay sweep.
pub type HotVpnSink = Box<dyn FnMut(&[HotVpn]) + Send>;

/// Set-associative confidence table, generic over the region entry payload.
pub struct VpnTable<E> {
    table: Box<dyn AssociativeStore<E>>,
    reset_period: u64,
    reset_counter: u64,
    sub_entry_num: usize,
    sub_entry_bits: u32,
    hot_sink: Option<HotVpnSink>,
}

impl<E: RegionEntry> VpnTable<E> {
    /// Wraps an associative store whose payloads hold `sub_entries` cells.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `sub_entries` is zero, odd, or not below 512.
    pub fn new(table: Box<dyn AssociativeStore<E>>, sub_entries: usize) -> Result<Self, ConfigError> {
        VpnTableConfig {
            sub_entries,
            ..VpnTableConfig::default()
        }
        .validate()?;
        Ok(Self {
            table,
            reset_period: RESET_PERIOD,
            reset_counter: 0,
            sub_entry_num: sub_entries,
            sub_entry_bits: sub_entries.next_power_of_two().trailing_zeros(),
            hot_sink: None,
        })
    }

    /// Builds the table and its [`AssociativeSet`] from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the geometry fails validation.
    pub fn from_config(config: &VpnTableConfig) -> Result<Self, ConfigError>
    where
        E: 'static,
    {
        config.validate()?;
        let sub_entries = config.sub_entries;
        let store = AssociativeSet::with_policy(config.sets, config.ways, config.policy, || {
            E::with_sub_entries(sub_entries)
        });
        Self::new(Box::new(store), sub_entries)
    }

    /// Installs the callback that receives hot cells after each sweep.
    pub fn set_hot_vpn_sink(&mut self, sink: HotVpnSink) {
        self.hot_sink = Some(sink);
    }

    /// Splits a page pair into `(tag, cell index)`.
    ///
    /// # Panics
    ///
    /// Panics when the cell index is not below the sub-entry count, which can
    /// only happen with a non-power-of-two count. The simulation cannot continue
    /// with such a table.
    fn locate(&self, vpn2: u64, vpn1: u64) -> (u64, usize) {
        let cat_addr = (vpn2 << VPN_FIELD_BITS) | vpn1;
        let sub_idx = (cat_addr & ((1u64 << self.sub_entry_bits) - 1)) as usize;
        assert!(
            sub_idx < self.sub_entry_num,
            "sub-entry index {sub_idx} out of range for {} sub-entries",
            self.sub_entry_num
        );
        (cat_addr >> self.sub_entry_bits, sub_idx)
    }

    fn lookup(&self, vpn2: u64, vpn1: u64) -> Option<(SlotId, usize)> {
        let (tag, sub_idx) = self.locate(vpn2, vpn1);
        self.table.find_entry(tag).map(|slot| (slot, sub_idx))
    }

    /// Records one access to `(vpn2, vpn1)`, allocating an entry on a miss.
    ///
    /// # Panics
    ///
    /// Panics when the cell index is out of range (see [`VpnTable::new`]).
    pub fn add(&mut self, vpn2: u64, vpn1: u64) {
        self.reset_counter += 1;
        let (tag, sub_idx) = self.locate(vpn2, vpn1);
        if let Some(slot) = self.table.find_entry(tag) {
            self.table.access_entry(slot);
            let entry = self.table.entry_mut(slot);
            if entry.exists(sub_idx) {
                entry.access(sub_idx);
            } else {
                entry.init(sub_idx, vpn2, vpn1);
            }
        } else {
            let slot = self.table.find_victim(tag);
            if let Some(old) = self.table.tag_of(slot) {
                trace!(old_tag = old, new_tag = tag, "vpn table eviction");
            }
            let entry = self.table.entry_mut(slot);
            entry.discard();
            entry.init(sub_idx, vpn2, vpn1);
            self.table.insert_entry(tag, slot);
        }
    }

    /// Returns whether `(vpn2, vpn1)` is hot. Never touches recency state.
    ///
    /// # Panics
    ///
    /// Panics when the cell index is out of range (see [`VpnTable::new`]).
    pub fn search(&self, vpn2: u64, vpn1: u64) -> bool {
        self.lookup(vpn2, vpn1).is_some_and(|(slot, sub_idx)| {
            let entry = self.table.entry(slot);
            entry.exists(sub_idx) && entry.is_hot(sub_idx)
        })
    }

    /// Lowers the carried confidence of `(vpn2, vpn1)` by one when throttling.
    ///
    /// # Panics
    ///
    /// Panics when the cell index is out of range (see [`VpnTable::new`]).
    pub fn update(&mut self, vpn2: u64, vpn1: u64, enable_throttle: bool) {
        if !enable_throttle {
            return;
        }
        if let Some((slot, sub_idx)) = self.lookup(vpn2, vpn1) {
            let entry = self.table.entry_mut(slot);
            if entry.exists(sub_idx) {
                entry.decr(sub_idx);
            }
        }
    }

    /// Runs a decay sweep if the current period is full.
    ///
    /// Returns `true` when a sweep ran.
    pub fn reset_confidence(&mut self, throttle_aggressiveness: f32, enable_throttle: bool) -> bool {
        if self.reset_counter < self.reset_period {
            return false;
        }
        for i in 0..self.table.num_slots() {
            let slot = SlotId::new(i);
            if self.table.is_valid(slot) {
                self.table.entry_mut(slot).period_reset(
                    throttle_aggressiveness,
                    enable_throttle,
                    self.reset_period,
                );
            }
        }
        self.reset_counter = 0;
        self.show_hot_vpns();
        true
    }

    /// Collects every existing cell with positive carried confidence.
    pub fn hot_vpns(&self) -> Vec<HotVpn> {
        let mut hot = Vec::new();
        for i in 0..self.table.num_slots() {
            let slot = SlotId::new(i);
            if !self.table.is_valid(slot) {
                continue;
            }
            let entry = self.table.entry(slot);
            for idx in 0..self.sub_entry_num {
                if entry.exists(idx) && entry.prev_ref_cnt(idx) > 0 {
                    let (vpn2, vpn1) = entry.debug_vpns(idx);
                    hot.push(HotVpn {
                        vpn2,
                        vpn1,
                        prev_ref_cnt: entry.prev_ref_cnt(idx),
                    });
                }
            }
        }
        hot
    }

    fn show_hot_vpns(&mut self) {
        if self.hot_sink.is_none() && !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }
        let hot = self.hot_vpns();
        debug!(hot = hot.len(), "vpn table confidence sweep");
        if let Some(sink) = self.hot_sink.as_mut() {
            sink(&hot);
        }
    }

    /// Carried confidence of `(vpn2, vpn1)`, if the cell exists.
    pub fn confidence(&self, vpn2: u64, vpn1: u64) -> Option<u64> {
        self.lookup(vpn2, vpn1).and_then(|(slot, sub_idx)| {
            let entry = self.table.entry(slot);
            entry.exists(sub_idx).then(|| entry.prev_ref_cnt(sub_idx))
        })
    }

    /// Accesses of `(vpn2, vpn1)` in the current period, if the cell exists.
    pub fn ref_count(&self, vpn2: u64, vpn1: u64) -> Option<u64> {
        self.lookup(vpn2, vpn1).and_then(|(slot, sub_idx)| {
            let entry = self.table.entry(slot);
            entry.exists(sub_idx).then(|| entry.ref_cnt(sub_idx))
        })
    }

    /// Writes since the last sweep.
    pub const fn write_counter(&self) -> u64 {
        self.reset_counter
    }

    /// Writes per decay period.
    pub const fn reset_period(&self) -> u64 {
        self.reset_period
    }

    /// Cells per region entry.
    pub const fn sub_entries(&self) -> usize {
        self.sub_entry_num
    }

    /// `ceil(log2(sub_entries))`.
    pub const fn sub_entry_bits(&self) -> u32 {
        self.sub_entry_bits
    }
}

impl<E> fmt::Debug for VpnTable<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VpnTable")
            .field("reset_period", &self.reset_period)
            .field("reset_counter", &self.reset_counter)
            .field("sub_entry_num", &self.sub_entry_num)
            .field("sub_entry_bits", &self.sub_entry_bits)
            .field("hot_sink", &self.hot_sink.is_some())
            .finish_non_exhaustive()
    }
}

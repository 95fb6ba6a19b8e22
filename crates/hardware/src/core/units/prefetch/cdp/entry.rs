//! Confidence cells and region entries.
//!
//! A `SubVpnEntry` tracks one `(vpn2, vpn1)` page pair: accesses in the current
//! decay period (`ref_cnt`) and confidence carried over from earlier periods
//! (`prev_ref_cnt`). A `VpnEntry` bundles a fixed number of cells under one tag
//! of the associative store.
//!
//! `hot` is derived from `prev_ref_cnt` and only recomputed by `period_reset`
//! or lowered by `decr`; `init` and `access` never raise it.

/// Payload type the confidence table is generic over.
///
/// Cell indices are always below `sub_entries()`; the table asserts this
/// before calling in.
pub trait RegionEntry: Send {
    /// Creates an entry holding `sub_entries` empty cells.
    fn with_sub_entries(sub_entries: usize) -> Self
    where
        Self: Sized;

    /// Number of cells.
    fn sub_entries(&self) -> usize;

    /// Resets every cell to the empty state.
    fn discard(&mut self);

    /// Starts tracking `(vpn2, vpn1)` in cell `idx`.
    fn init(&mut self, idx: usize, vpn2: u64, vpn1: u64);

    /// Counts one access on cell `idx`.
    fn access(&mut self, idx: usize);

    /// Lowers the carried confidence of cell `idx` by one step.
    fn decr(&mut self, idx: usize);

    /// Closes a decay period on every existing cell.
    fn period_reset(&mut self, throttle_aggressiveness: f32, enable_throttle: bool, reset_period: u64);

    /// Whether cell `idx` holds a page pair.
    fn exists(&self, idx: usize) -> bool;

    /// Whether cell `idx` is hot.
    fn is_hot(&self, idx: usize) -> bool;

    /// Carried confidence of cell `idx`.
    fn prev_ref_cnt(&self, idx: usize) -> u64;

    /// Accesses of cell `idx` in the current period.
    fn ref_cnt(&self, idx: usize) -> u64;

    /// `(vpn2, vpn1)` the cell was initialized with.
    fn debug_vpns(&self, idx: usize) -> (u64, u64);
}

/// Confidence for one virtual page pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubVpnEntry {
    ref_cnt: u64,
    prev_ref_cnt: u64,
    exist: bool,
    hot: bool,
    /// `vpn1` the cell was initialized with (diagnostics only).
    pub debug_vpn1: u64,
    /// `vpn2` the cell was initialized with (diagnostics only).
    pub debug_vpn2: u64,
}

impl SubVpnEntry {
    /// Starts tracking a page pair with one access and no carried confidence.
    pub fn init(&mut self, vpn1: u64, vpn2: u64) {
        self.ref_cnt = 1;
        self.prev_ref_cnt = 0;
        self.hot = false;
        self.exist = true;
        self.debug_vpn1 = vpn1;
        self.debug_vpn2 = vpn2;
    }

    /// Returns the cell to the empty state.
    pub fn discard(&mut self) {
        *self = Self::default();
    }

    /// Counts one access in the current period.
    pub fn access(&mut self) {
        self.ref_cnt += 1;
    }

    /// Lowers carried confidence by one, clearing `hot` at zero.
    pub fn decr(&mut self) {
        self.prev_ref_cnt = self.prev_ref_cnt.saturating_sub(1);
        if self.prev_ref_cnt == 0 {
            self.hot = false;
        }
    }

    /// Folds this period's accesses into the carried confidence.
    ///
    /// `prev' = 0.2·prev + 0.8·ref`, truncated toward zero. With throttling
    /// enabled, a period of at most `reset_period / 16` accesses only decays
    /// (`prev' = 0.2·prev`). `hot` becomes `prev' > 0` and `ref_cnt` restarts.
    pub fn period_reset(&mut self, _throttle_aggressiveness: f32, enable_throttle: bool, reset_period: u64) {
        let decayed = 0.2 * self.prev_ref_cnt as f64;
        self.prev_ref_cnt = if enable_throttle && self.ref_cnt <= reset_period / 16 {
            decayed as u64
        } else {
            (decayed + 0.8 * self.ref_cnt as f64) as u64
        };
        self.hot = self.prev_ref_cnt > 0;
        self.ref_cnt = 0;
    }

    /// Accesses in the current period.
    pub const fn ref_cnt(&self) -> u64 {
        self.ref_cnt
    }

    /// Carried confidence.
    pub const fn prev_ref_cnt(&self) -> u64 {
        self.prev_ref_cnt
    }

    /// Whether the cell tracks a page pair.
    pub const fn exists(&self) -> bool {
        self.exist
    }

    /// Whether the cell is hot.
    pub const fn is_hot(&self) -> bool {
        self.hot
    }
}

/// Fixed-size bundle of confidence cells sharing one store tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpnEntry {
    sub_entries: Vec<SubVpnEntry>,
}

impl VpnEntry {
    /// Cell `idx`.
    pub fn cell(&self, idx: usize) -> &SubVpnEntry {
        &self.sub_entries[idx]
    }

    /// All cells in index order.
    pub fn cells(&self) -> &[SubVpnEntry] {
        &self.sub_entries
    }
}

impl RegionEntry for VpnEntry {
    fn with_sub_entries(sub_entries: usize) -> Self {
        Self {
            sub_entries: vec![SubVpnEntry::default(); sub_entries],
        }
    }

    fn sub_entries(&self) -> usize {
        self.sub_entries.len()
    }

    fn discard(&mut self) {
        self.sub_entries.iter_mut().for_each(SubVpnEntry::discard);
    }

    fn init(&mut self, idx: usize, vpn2: u64, vpn1: u64) {
        self.sub_entries[idx].init(vpn1, vpn2);
    }

    fn access(&mut self, idx: usize) {
        self.sub_entries[idx].access();
    }

    fn decr(&mut self, idx: usize) {
        self.sub_entries[idx].decr();
    }

    fn period_reset(&mut self, throttle_aggressiveness: f32, enable_throttle: bool, reset_period: u64) {
        for cell in self.sub_entries.iter_mut().filter(|c| c.exists()) {
            cell.period_reset(throttle_aggressiveness, enable_throttle, reset_period);
        }
    }

    fn exists(&self, idx: usize) -> bool {
        self.sub_entries[idx].exists()
    }

    fn is_hot(&self, idx: usize) -> bool {
        self.sub_entries[idx].is_hot()
    }

    fn prev_ref_cnt(&self, idx: usize) -> u64 {
        self.sub_entries[idx].prev_ref_cnt()
    }

    fn ref_cnt(&self, idx: usize) -> u64 {
        self.sub_entries[idx].ref_cnt()
    }

    fn debug_vpns(&self, idx: usize) -> (u64, u64) {
        let cell = &self.sub_entries[idx];
        (cell.debug_vpn2, cell.debug_vpn1)
    }
}

//! Configuration system for the content-directed prefetcher.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the prefetcher. It provides:
//! 1. **Defaults:** Baseline table geometry, throttling, and filter constants.
//! 2. **Structures:** `CdpConfig` for the pipeline and `VpnTableConfig` for the confidence table.
//! 3. **Enums:** Replacement policy and line byte order.
//! 4. **Validation:** `CdpConfig::validate` rejects geometries that break table invariants.
//!
//! Configuration is supplied as JSON (see the `cdp-replay` CLI) or use `CdpConfig::default()`.

use serde::Deserialize;

use crate::common::constants::{CACHE_LINE_BYTES, MAX_SUB_ENTRIES};
use crate::common::error::ConfigError;

/// Default configuration constants for the prefetcher.
///
/// These values define the baseline configuration when not explicitly
/// overridden in a JSON configuration document.
mod defaults {
    /// Number of sets in the confidence table's associative store.
    pub const TABLE_SETS: usize = 16;

    /// Associativity of the confidence table's associative store.
    pub const TABLE_WAYS: usize = 8;

    /// Confidence cells bundled into one region entry.
    pub const SUB_ENTRIES: usize = 16;

    /// Maximum speculative chain depth before a trigger is dropped.
    pub const DEPTH_THRESHOLD: u32 = 3;

    /// Maximum candidates emitted per trigger.
    pub const DEGREE: usize = 4;

    /// Exponent applied to measured accuracy when throttling the degree.
    pub const THROTTLE_AGGRESSIVENESS: f32 = 1.0;

    /// Capacity of the LRU dedup filter (addresses).
    pub const LRU_FILTER_SIZE: usize = 128;

    /// Capacity of the local deferral buffer.
    pub const LOCAL_BUFFER_DEPTH: usize = 4;

    /// Cache line size in bytes.
    pub const LINE_BYTES: usize = 64;
}

/// Replacement policy of the confidence table's associative store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    /// Least Recently Used.
    #[default]
    #[serde(alias = "Lru")]
    Lru,
    /// First In First Out (round-robin per set).
    #[serde(alias = "Fifo")]
    Fifo,
    /// Pseudo-random victim selection.
    #[serde(alias = "Random")]
    Random,
}

/// Byte order used to decode 64-bit words out of a cache line payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ByteOrder {
    /// Least significant byte first (RISC-V, x86).
    #[default]
    Little,
    /// Most significant byte first.
    Big,
}

/// Confidence table geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct VpnTableConfig {
    /// Number of sets
    #[serde(default = "VpnTableConfig::default_sets")]
    pub sets: usize,

    /// Associativity (number of ways)
    #[serde(default = "VpnTableConfig::default_ways")]
    pub ways: usize,

    /// Replacement policy
    #[serde(default)]
    pub policy: ReplacementPolicy,

    /// Confidence cells per region entry (even, below 512)
    #[serde(default = "VpnTableConfig::default_sub_entries")]
    pub sub_entries: usize,
}

impl VpnTableConfig {
    fn default_sets() -> usize {
        defaults::TABLE_SETS
    }

    fn default_ways() -> usize {
        defaults::TABLE_WAYS
    }

    fn default_sub_entries() -> usize {
        defaults::SUB_ENTRIES
    }

    /// Checks the table invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the sub-entry count is odd, zero, or not below
    /// 512, or when the store has no sets or no ways.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sub_entries == 0 || self.sub_entries >= MAX_SUB_ENTRIES {
            return Err(ConfigError::SubEntriesOutOfRange(self.sub_entries));
        }
        if self.sub_entries % 2 != 0 {
            return Err(ConfigError::OddSubEntries(self.sub_entries));
        }
        if self.sets == 0 {
            return Err(ConfigError::ZeroSets);
        }
        if self.ways == 0 {
            return Err(ConfigError::ZeroWays);
        }
        Ok(())
    }
}

impl Default for VpnTableConfig {
    fn default() -> Self {
        Self {
            sets: defaults::TABLE_SETS,
            ways: defaults::TABLE_WAYS,
            policy: ReplacementPolicy::default(),
            sub_entries: defaults::SUB_ENTRIES,
        }
    }
}

/// Root configuration of one content-directed prefetcher instance.
///
/// # Examples
///
/// ```
/// use rvsim_cdp::config::{CdpConfig, ReplacementPolicy};
///
/// let json = r#"{
///     "table": { "sets": 4, "ways": 2, "policy": "Fifo", "sub_entries": 8 },
///     "degree": 2,
///     "enable_throttle": true
/// }"#;
///
/// let config: CdpConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.table.policy, ReplacementPolicy::Fifo);
/// assert_eq!(config.degree, 2);
/// assert_eq!(config.local_buffer_depth, 4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CdpConfig {
    /// Confidence table geometry
    #[serde(default)]
    pub table: VpnTableConfig,

    /// Triggers at or beyond this prefetch depth are dropped
    #[serde(default = "CdpConfig::default_depth_threshold")]
    pub depth_threshold: u32,

    /// Maximum candidates emitted per trigger
    #[serde(default = "CdpConfig::default_degree")]
    pub degree: usize,

    /// Exponent on measured accuracy when throttling is enabled
    #[serde(default = "CdpConfig::default_aggressiveness")]
    pub throttle_aggressiveness: f32,

    /// Enables accuracy-driven degree throttling and confidence decay on fills.
    ///
    /// Both are gated together: while disabled, measured accuracy never lowers
    /// the degree and `throttle_aggressiveness` has no effect.
    #[serde(default)]
    pub enable_throttle: bool,

    /// Dedup filter capacity (addresses)
    #[serde(default = "CdpConfig::default_lru_filter_size")]
    pub lru_filter_size: usize,

    /// Deferred candidates kept across triggers
    #[serde(default = "CdpConfig::default_local_buffer_depth")]
    pub local_buffer_depth: usize,

    /// Cache line size in bytes
    #[serde(default = "CdpConfig::default_line_bytes")]
    pub line_bytes: usize,

    /// Byte order of line payloads
    #[serde(default)]
    pub byte_order: ByteOrder,
}

impl CdpConfig {
    fn default_depth_threshold() -> u32 {
        defaults::DEPTH_THRESHOLD
    }

    fn default_degree() -> usize {
        defaults::DEGREE
    }

    fn default_aggressiveness() -> f32 {
        defaults::THROTTLE_AGGRESSIVENESS
    }

    fn default_lru_filter_size() -> usize {
        defaults::LRU_FILTER_SIZE
    }

    fn default_local_buffer_depth() -> usize {
        defaults::LOCAL_BUFFER_DEPTH
    }

    fn default_line_bytes() -> usize {
        defaults::LINE_BYTES
    }

    /// Checks every invariant the table and pipeline rely on.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found: table geometry first, then filter
    /// capacity, line size, depth threshold, and aggressiveness.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.table.validate()?;
        if self.lru_filter_size == 0 {
            return Err(ConfigError::ZeroFilterCapacity);
        }
        if !self.line_bytes.is_power_of_two() || self.line_bytes < CACHE_LINE_BYTES {
            return Err(ConfigError::BadLineSize(self.line_bytes));
        }
        if self.depth_threshold == 0 {
            return Err(ConfigError::ZeroDepthThreshold);
        }
        if !self.throttle_aggressiveness.is_finite() || self.throttle_aggressiveness < 0.0 {
            return Err(ConfigError::BadAggressiveness(self.throttle_aggressiveness));
        }
        Ok(())
    }
}

impl Default for CdpConfig {
    /// Creates a default configuration.
    ///
    /// Throttling is disabled, the table is 16 sets × 8 ways with 16 cells per
    /// entry, and lines are 64-byte little-endian.
    fn default() -> Self {
        Self {
            table: VpnTableConfig::default(),
            depth_threshold: defaults::DEPTH_THRESHOLD,
            degree: defaults::DEGREE,
            throttle_aggressiveness: defaults::THROTTLE_AGGRESSIVENESS,
            enable_throttle: false,
            lru_filter_size: defaults::LRU_FILTER_SIZE,
            local_buffer_depth: defaults::LOCAL_BUFFER_DEPTH,
            line_bytes: defaults::LINE_BYTES,
            byte_order: ByteOrder::default(),
        }
    }
}

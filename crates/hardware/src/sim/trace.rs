//! Event trace format.
//!
//! A trace is a JSON-lines file; each non-blank line that does not start with
//! `#` is one event tagged by `"event"`:
//!
//! ```text
//! {"event":"access","addr":4096,"vaddr":1073745920,"miss":true}
//! {"event":"data","addr":4096,"vaddr":1073745920,"data":[0,0,0,0,0,0,0,0]}
//! {"event":"fill","addr":8192,"vaddr":1073750016,"pf_source":"Cdp","pf_depth":1}
//! {"event":"hit","addr":8192,"vaddr":1073750016,"pf_source":"Cdp","accuracy":0.5}
//! {"event":"instructions","count":1000}
//! {"event":"l3_misses","own":3,"total":40}
//! ```
//!
//! Line payloads are given as eight words and encoded in the configured byte
//! order when the event is replayed.

use std::fs;
use std::io::{BufRead, BufReader};

use serde::Deserialize;

use crate::common::constants::LINE_WORDS;
use crate::common::error::TraceError;
use crate::config::{ByteOrder, CdpConfig};
use crate::core::units::prefetch::{AccessInfo, LineData, Packet, PrefetchSource};

fn default_true() -> bool {
    true
}

fn default_accuracy() -> f32 {
    1.0
}

/// Line payload fields shared by every event that can carry data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TraceLine {
    /// Eight words of the line, if the event carried it.
    #[serde(default)]
    pub data: Option<[u64; LINE_WORDS]>,
    /// Set when the payload was looked up and the block was not resident.
    #[serde(default)]
    pub block_missing: bool,
}

impl TraceLine {
    /// Converts to the prefetcher's payload type.
    pub fn to_line_data(&self, order: ByteOrder) -> LineData {
        match (&self.data, self.block_missing) {
            (Some(words), _) => LineData::from_words(words, order),
            (None, true) => LineData::BlockNotFound,
            (None, false) => LineData::Missing,
        }
    }
}

/// One recorded cache event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    /// Demand access; drives `calculate_prefetch`.
    Access {
        /// Physical address.
        addr: u64,
        /// Virtual address.
        #[serde(default)]
        vaddr: Option<u64>,
        /// Whether the access missed.
        #[serde(default)]
        miss: bool,
        /// Line payload.
        #[serde(flatten)]
        line: TraceLine,
    },
    /// Payload arrival; drives `notify_with_data`.
    Data {
        /// Physical address.
        addr: u64,
        /// Virtual address.
        #[serde(default)]
        vaddr: Option<u64>,
        /// Whether the request came from the L1.
        #[serde(default = "default_true")]
        l1: bool,
        /// Speculative depth of the request.
        #[serde(default)]
        pf_depth: u32,
        /// Issuing prefetcher, if any.
        #[serde(default)]
        pf_source: Option<PrefetchSource>,
        /// Line payload.
        #[serde(flatten)]
        line: TraceLine,
    },
    /// Fill completion; drives `notify_fill`.
    Fill {
        /// Physical address.
        addr: u64,
        /// Virtual address.
        #[serde(default)]
        vaddr: Option<u64>,
        /// Speculative depth of the request.
        #[serde(default)]
        pf_depth: u32,
        /// Issuing prefetcher, if any.
        #[serde(default)]
        pf_source: Option<PrefetchSource>,
        /// Line payload.
        #[serde(flatten)]
        line: TraceLine,
    },
    /// Demand hit on a prefetched line; drives `pf_hit_notify`.
    Hit {
        /// Physical address.
        addr: u64,
        /// Virtual address.
        #[serde(default)]
        vaddr: Option<u64>,
        /// Prefetcher that brought the line in.
        pf_source: PrefetchSource,
        /// Cache-side running accuracy for that prefetcher.
        #[serde(default = "default_accuracy")]
        accuracy: f32,
    },
    /// Retired instruction count; drives `notify_ins`.
    Instructions {
        /// Instructions retired so far.
        count: u64,
    },
    /// Trailing last-level miss counters.
    L3Misses {
        /// Misses on lines this prefetcher brought in.
        own: u64,
        /// All misses.
        total: u64,
    },
}

impl TraceEvent {
    /// Builds the demand-access view of an `Access` event.
    pub fn access_info(&self, order: ByteOrder) -> Option<AccessInfo> {
        match self {
            Self::Access {
                addr,
                vaddr,
                miss,
                line,
            } => Some(AccessInfo {
                addr: *addr,
                vaddr: *vaddr,
                miss: *miss,
                data: line.to_line_data(order),
            }),
            _ => None,
        }
    }

    /// Builds the packet view of a `Data`, `Fill`, or `Hit` event.
    pub fn packet(&self, order: ByteOrder) -> Option<Packet> {
        let (addr, vaddr, pf_depth, pf_source, data) = match self {
            Self::Data {
                addr,
                vaddr,
                pf_depth,
                pf_source,
                line,
                ..
            }
            | Self::Fill {
                addr,
                vaddr,
                pf_depth,
                pf_source,
                line,
            } => (*addr, *vaddr, *pf_depth, *pf_source, line.to_line_data(order)),
            Self::Hit {
                addr,
                vaddr,
                pf_source,
                ..
            } => (*addr, *vaddr, 0, Some(*pf_source), LineData::Missing),
            _ => return None,
        };
        Some(Packet {
            addr,
            vaddr,
            data,
            pf_depth,
            pf_source,
        })
    }
}

/// Parses a JSON-lines trace.
///
/// # Errors
///
/// Returns [`TraceError::Parse`] with the one-based line number of the first
/// malformed event, or [`TraceError::Io`] if reading fails.
pub fn parse_trace(reader: impl BufRead) -> Result<Vec<TraceEvent>, TraceError> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| TraceError::Io {
            path: "<trace>".to_string(),
            source,
        })?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let event = serde_json::from_str(text).map_err(|source| TraceError::Parse {
            line: idx + 1,
            source,
        })?;
        events.push(event);
    }
    Ok(events)
}

/// Reads and parses a trace file.
///
/// # Errors
///
/// Returns [`TraceError`] if the file cannot be opened or an event is malformed.
pub fn load_trace(path: &str) -> Result<Vec<TraceEvent>, TraceError> {
    let file = fs::File::open(path).map_err(|source| TraceError::Io {
        path: path.to_string(),
        source,
    })?;
    parse_trace(BufReader::new(file))
}

/// Reads, parses, and validates a JSON configuration file.
///
/// # Errors
///
/// Returns [`TraceError`] if the file cannot be read, is not valid JSON for
/// [`CdpConfig`], or fails validation.
pub fn load_config(path: &str) -> Result<CdpConfig, TraceError> {
    let text = fs::read_to_string(path).map_err(|source| TraceError::Io {
        path: path.to_string(),
        source,
    })?;
    let config: CdpConfig = serde_json::from_str(&text)?;
    config.validate()?;
    Ok(config)
}

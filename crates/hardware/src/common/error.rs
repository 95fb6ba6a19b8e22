//! Configuration and Trace error definitions.
//!
//! This module defines the recoverable failures of the prefetcher crate. It provides:
//! 1. **Configuration Errors:** Geometry and parameter checks run before any table is built.
//! 2. **Trace Errors:** I/O and parse failures when loading a recorded event trace.
//!
//! Absence conditions inside the engine (tag not resident, no line data) are not
//! errors; they take a fallback path and bump an exit counter in `CdpStats`.

use thiserror::Error;

use super::constants::{CACHE_LINE_BYTES, MAX_SUB_ENTRIES};

/// A configuration value that would break a table or pipeline invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Sub-entry count per region entry must be even.
    #[error("sub-entry count {0} is not even")]
    OddSubEntries(usize),

    /// Sub-entry count must be non-zero and below the hardware limit.
    #[error("sub-entry count {0} out of range (1..{max})", max = MAX_SUB_ENTRIES)]
    SubEntriesOutOfRange(usize),

    /// The associative store needs at least one set.
    #[error("confidence table must have at least one set")]
    ZeroSets,

    /// The associative store needs at least one way.
    #[error("confidence table must have at least one way")]
    ZeroWays,

    /// The dedup filter needs a non-zero capacity.
    #[error("prefetch filter capacity must be non-zero")]
    ZeroFilterCapacity,

    /// Lines must be a power of two and hold all scanned words.
    #[error("line size {0} must be a power of two of at least {min} bytes", min = CACHE_LINE_BYTES)]
    BadLineSize(usize),

    /// A depth threshold of zero would reject every trigger.
    #[error("depth threshold must be non-zero")]
    ZeroDepthThreshold,

    /// Aggressiveness is used as an exponent and must be a finite non-negative number.
    #[error("throttle aggressiveness {0} must be finite and non-negative")]
    BadAggressiveness(f32),
}

/// Failure while loading or parsing a recorded event trace.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The trace or config file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the file being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A trace line was not a valid event.
    #[error("trace line {line}: {source}")]
    Parse {
        /// One-based line number in the trace.
        line: usize,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The configuration document was not valid JSON for `CdpConfig`.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The configuration parsed but failed validation.
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

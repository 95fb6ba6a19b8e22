//! Trace-driven simulation harness.
//!
//! Provides a JSON-lines event trace format and a replay driver that plays it
//! against any [`Prefetcher`](crate::core::units::prefetch::Prefetcher). Every
//! event states its own outcome (hit or miss, payload, depth); the driver never
//! models the cache itself.

/// Replay driver.
pub mod replay;

/// Trace event format and loaders.
pub mod trace;

pub use replay::{ReplaySummary, Replayer};
pub use trace::{TraceEvent, load_config, load_trace, parse_trace};

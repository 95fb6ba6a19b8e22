//! Content-directed prefetcher model.
//!
//! This crate models a content-directed (pointer-chasing) hardware prefetcher
//! as a component of a cache simulator. It provides:
//! 1. **Core:** The set-associative confidence table, pointer scanner, dedup
//!    filter, and the prefetcher itself behind the `Prefetcher` notification
//!    interface.
//! 2. **Configuration:** Table geometry, depth/degree limits, throttling, and
//!    memory byte order, deserializable from JSON.
//! 3. **Simulation:** A JSON-lines event trace format and a replay driver that
//!    stands in for the cache model.
//! 4. **Statistics:** Per-exit counters with sectioned reporting.

/// Common types and constants (address decoding, geometry constants, errors).
pub mod common;
/// Prefetcher configuration (defaults, enums, validation).
pub mod config;
/// Prefetcher core (associative storage, replacement policies, CDP).
pub mod core;
/// Trace format and replay driver.
pub mod sim;
/// Prefetcher statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `CdpConfig::default()` or deserialize from JSON.
pub use crate::config::CdpConfig;
/// The content-directed prefetcher.
pub use crate::core::units::prefetch::CdpPrefetcher;
/// Counters collected by the prefetcher.
pub use crate::stats::CdpStats;

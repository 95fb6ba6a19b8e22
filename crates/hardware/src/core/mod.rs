//! Prefetcher core.
//!
//! This module contains the functional units the prefetcher is built from: the
//! tagged associative storage with its replacement policies, and the prefetcher
//! notification interface with the content-directed implementation.

/// Storage and prefetch units.
pub mod units;

//! Functional units.
//!
//! This module contains the set-associative storage and the prefetchers that
//! sit on top of it.

/// Set-associative storage with replacement policies.
pub mod cache;

/// Prefetcher interface and the content-directed prefetcher.
pub mod prefetch;

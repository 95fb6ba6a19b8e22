//! Common utilities and types used throughout the content-directed prefetcher.
//!
//! This module provides fundamental building blocks that are shared across all components
//! of the prefetcher. It includes:
//! 1. **Address Types:** A virtual address type that decodes Sv39 VPN fields.
//! 2. **Constants:** Field layout, line geometry, and table periods.
//! 3. **Error Handling:** Configuration and trace errors.

/// Address type definitions and VPN field decoding.
pub mod addr;

/// Common constants used throughout the prefetcher.
pub mod constants;

/// Error types for configuration and trace loading.
pub mod error;

pub use addr::VirtAddr;
pub use constants::{CACHE_LINE_BYTES, LINE_WORDS, PAGE_SHIFT, RESET_PERIOD};
pub use error::{ConfigError, TraceError};

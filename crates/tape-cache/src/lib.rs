#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Caching implementations for tape data sources.
//!
//! This crate provides implementations of the [`DataCache`] trait from `tape-core`:
//!
//! - [`InMemoryCache`] - Process-wide in-memory cache (default)
//! - [`NoopCache`] - No-op cache that doesn't store anything

/// In-memory cache implementation.
pub mod memory;
/// No-op cache implementation.
pub mod noop;

// Re-export the trait for convenience
pub use tape_core::DataCache;

// Re-export implementations
pub use memory::InMemoryCache;
pub use noop::NoopCache;

//! Cache module for storing API responses
//!
//! This module provides deterministic cache keys and an expiring key-value
//! store contract with two backends: a durable file store that persists
//! entries as JSON under the XDG cache directory, and an in-process store for
//! short-lived clients and tests. Expired entries are never served; they are
//! deleted lazily on read or in bulk by a sweep.

mod file;
mod key;
mod memory;
mod store;

pub use file::FileCacheStore;
pub use key::{CacheKey, Params};
pub use memory::MemoryCacheStore;
pub use store::{CacheError, CacheStore};

//! In-memory cache of the current top items
//!
//! This module provides the shared read side of the refresh loop: the current
//! `CachedSet`, the cache state, and a single-slot handoff for the error that
//! stopped the loop. Readers never wait on a fetch; the writer only holds the
//! lock long enough to swap in a new set.

mod manager;

pub use manager::{CacheState, CacheStatus, CachedSet, ItemCache};

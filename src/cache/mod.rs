//! Caching subsystem.
//!
//! [`ResultCache`] layers the two cache shapes the bot needs on top of an
//! [`EntryStore`](crate::store::EntryStore):
//!
//! - **search lists** — the ordered display identifiers one query produced,
//!   under `{prefix}:{query}` (or the trending prefix for blank queries);
//! - **result entries** — the full payload for each identifier, under
//!   `{prefix}:{identifier}`;
//!
//! plus the short-lived **selection** entries written when autocomplete
//! suggestions are shown, addressed by `{prefix}:{query}:{index}`.
//!
//! Lists and their items are written in one batch with the same lifetime
//! but expire independently; a list whose items cannot all be resolved is
//! reported as a miss.

pub mod result;

pub use result::{ResultCache, unique_by_name};

use std::time::Duration;

use crate::store::memory::{DEFAULT_SHARDS, DEFAULT_SWEEP_INTERVAL};

/// Lifetime of search lists and their result entries.
pub const SEARCH_TTL: Duration = Duration::from_secs(3600);

/// Lifetime of autocomplete selections pending the user's follow-up.
pub const SELECTION_TTL: Duration = Duration::from_secs(60);

/// Configuration for the result cache and its in-process store.
///
/// ```rust
/// # use nekokai::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .search_ttl(Duration::from_secs(1800))
///     .sweep_interval(Duration::from_secs(10));
/// assert_eq!(config.selection_ttl, Duration::from_secs(60));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Lifetime of search lists and result entries. Default: 1 hour.
    pub search_ttl: Duration,
    /// Lifetime of autocomplete selections. Default: 60 seconds.
    pub selection_ttl: Duration,
    /// Sweep period of the in-process store. Default: 30 seconds.
    pub sweep_interval: Duration,
    /// Shard count of the in-process store. Default: 16.
    pub shards: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            search_ttl: SEARCH_TTL,
            selection_ttl: SELECTION_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            shards: DEFAULT_SHARDS,
        }
    }
}

impl CacheConfig {
    /// Create a new config with the default lifetimes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the lifetime of search lists and result entries.
    pub fn search_ttl(mut self, ttl: Duration) -> Self {
        self.search_ttl = ttl;
        self
    }

    /// Set the lifetime of autocomplete selections.
    pub fn selection_ttl(mut self, ttl: Duration) -> Self {
        self.selection_ttl = ttl;
        self
    }

    /// Set the sweep period of the in-process store.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Set the shard count of the in-process store.
    pub fn shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }
}

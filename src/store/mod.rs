//! Expiring entry stores.
//!
//! [`EntryStore`] is the narrow `get`/`set`/`delete` contract every cache
//! shape in the crate is built on. Values are JSON strings; each carries an
//! absolute expiry computed from the lifetime passed to `set`, and readers
//! never observe an entry at or past its expiry.
//!
//! Two interchangeable backends are selected at construction time:
//!
//! - [`MemoryStore`] — in-process, sharded, with a background sweep timer.
//! - [`RedisStore`] (feature `redis`) — shared across processes via per-key
//!   TTLs.
//!
//! Backend failures never escape a store: they are logged, counted under
//! [`STORE_ERRORS_TOTAL`](crate::telemetry::STORE_ERRORS_TOTAL) and reported
//! to the caller as a miss (or a no-op write).

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

use std::time::Duration;

use async_trait::async_trait;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;

/// Keyed storage of values with an absolute expiration instant.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Backend name used in logs and metric labels.
    fn backend(&self) -> &'static str;

    /// Fetch a live value. Expired and never-set keys both return `None`.
    async fn get(&self, key: &str) -> Option<String>;

    /// Bulk fetch, 1:1 with `keys`.
    async fn get_many(&self, keys: &[String]) -> Vec<Option<String>> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.get(key).await);
        }
        values
    }

    /// Store `value` until `now + lifetime`, replacing any previous entry.
    async fn set(&self, key: &str, value: String, lifetime: Duration);

    /// Store several values with the same lifetime in one batch.
    ///
    /// Backends that can pipeline do so; the writes become visible together
    /// under normal operation but this is not a transaction.
    async fn set_many(&self, entries: Vec<(String, String)>, lifetime: Duration) {
        for (key, value) in entries {
            self.set(&key, value, lifetime).await;
        }
    }

    /// Remove an entry, returning whether it was present.
    async fn delete(&self, key: &str) -> bool;
}

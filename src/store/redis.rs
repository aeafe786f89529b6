//! Redis-backed [`EntryStore`], shared across processes.
//!
//! Values are stored with `SET key value EX seconds`; Redis owns expiry, so
//! there is no sweep. Bulk reads use `MGET` and bulk writes a `MULTI`
//! pipeline so a list and its items land together.
//!
//! Every backend error (connection refused, timeout, protocol) is logged
//! and counted, then reported as a miss or dropped write. The orchestrator
//! above falls through to the upstream fetch path.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::warn;

use super::EntryStore;
use crate::{Result, telemetry};

/// Shared cache backed by a Redis server.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to `url` (e.g. `redis://:password@host:6379/2`).
    ///
    /// Connection failures here are configuration errors and are returned;
    /// once connected, the manager reconnects transparently.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    async fn try_get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn try_get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        let mut conn = self.conn.clone();
        let values: Vec<Option<String>> = redis::cmd("MGET").arg(keys).query_async(&mut conn).await?;
        Ok(values)
    }

    async fn try_set(&self, key: &str, value: String, lifetime: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl_seconds(lifetime)).await?;
        Ok(())
    }

    async fn try_set_many(&self, entries: Vec<(String, String)>, lifetime: Duration) -> Result<()> {
        let seconds = ttl_seconds(lifetime);
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (key, value) in entries {
            pipe.set_ex(key, value, seconds).ignore();
        }
        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn try_delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(key).await?;
        Ok(removed > 0)
    }
}

/// Well inside the longest `EX` Redis accepts: the absolute expiry in
/// milliseconds must fit an i64.
const MAX_TTL_SECONDS: u64 = i64::MAX as u64 / 2000;

/// Redis TTLs are whole seconds; round up, never send zero, clamp to the
/// server's limit.
fn ttl_seconds(lifetime: Duration) -> u64 {
    let secs = lifetime
        .as_secs()
        .saturating_add(u64::from(lifetime.subsec_nanos() > 0));
    secs.clamp(1, MAX_TTL_SECONDS)
}

fn absorb<T>(operation: &'static str, result: Result<T>, fallback: T) -> T {
    result.unwrap_or_else(|e| {
        metrics::counter!(telemetry::STORE_ERRORS_TOTAL,
            "backend" => "redis",
            "operation" => operation,
        )
        .increment(1);
        warn!(operation, error = %e, "redis cache unavailable, treating as miss");
        fallback
    })
}

#[async_trait]
impl EntryStore for RedisStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Option<String> {
        absorb("get", self.try_get(key).await, None)
    }

    async fn get_many(&self, keys: &[String]) -> Vec<Option<String>> {
        if keys.is_empty() {
            return Vec::new();
        }
        absorb("get_many", self.try_get_many(keys).await, vec![None; keys.len()])
    }

    async fn set(&self, key: &str, value: String, lifetime: Duration) {
        absorb("set", self.try_set(key, value, lifetime).await, ());
    }

    async fn set_many(&self, entries: Vec<(String, String)>, lifetime: Duration) {
        if entries.is_empty() {
            return;
        }
        absorb("set_many", self.try_set_many(entries, lifetime).await, ());
    }

    async fn delete(&self, key: &str) -> bool {
        absorb("delete", self.try_delete(key).await, false)
    }
}

//! In-process sharded expiring map.
//!
//! Each shard keeps its entries in a hash map plus an index ordered by
//! `(expires, insertion sequence)`. Re-inserting a key moves it to its new
//! position in that index, so the sweep only ever needs to pop from the
//! front until it meets the first live entry.
//!
//! # Sweep timer
//!
//! A single background task per store wakes every `sweep_interval` and
//! removes expired entries. The task is spawned when the first entry lands
//! in an empty store and exits once the store drains, so an idle cache has
//! no timer. It holds only a weak reference to the store and is aborted when
//! the store is dropped; it never keeps the runtime (or the store) alive.
//!
//! Reads do not evict: an expired entry is hidden from `get` immediately but
//! physically removed by the next sweep.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use super::EntryStore;
use crate::telemetry;

/// Default number of shards.
pub const DEFAULT_SHARDS: usize = 16;

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// In-process [`EntryStore`]. See module docs for the eviction model.
pub struct MemoryStore {
    inner: Arc<Inner>,
}

struct Inner {
    shards: Box<[Mutex<Shard>]>,
    len: AtomicUsize,
    seq: AtomicU64,
    sweep_interval: Duration,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Default)]
struct Shard {
    slots: HashMap<String, Slot>,
    by_expiry: BTreeMap<(Instant, u64), String>,
}

struct Slot {
    value: String,
    expires: Instant,
    seq: u64,
}

impl MemoryStore {
    /// Create a store with [`DEFAULT_SHARDS`] shards.
    pub fn new(sweep_interval: Duration) -> Self {
        Self::with_shards(DEFAULT_SHARDS, sweep_interval)
    }

    /// Create a store with a custom shard count (at least one).
    pub fn with_shards(shards: usize, sweep_interval: Duration) -> Self {
        let shards = (0..shards.max(1))
            .map(|_| Mutex::new(Shard::default()))
            .collect();
        Self {
            inner: Arc::new(Inner {
                shards,
                len: AtomicUsize::new(0),
                seq: AtomicU64::new(0),
                sweep_interval,
                sweeper: Mutex::new(None),
            }),
        }
    }

    /// Number of physically stored entries, including expired ones the
    /// sweep has not reached yet.
    pub fn len(&self) -> usize {
        self.inner.len.load(Ordering::Acquire)
    }

    /// Whether the store holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the background sweep timer is currently armed.
    pub fn is_sweeping(&self) -> bool {
        lock(&self.inner.sweeper)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Remove every entry expired at `Instant::now()` without waiting for
    /// the timer. Returns the number of entries removed.
    pub fn sweep_now(&self) -> usize {
        let removed = self.inner.sweep(Instant::now());
        if self.is_empty() {
            self.inner.disarm();
        }
        removed
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_SWEEP_INTERVAL)
    }
}

impl Inner {
    fn shard(&self, key: &str) -> &Mutex<Shard> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let idx = (hasher.finish() % self.shards.len() as u64) as usize;
        &self.shards[idx]
    }

    fn sweep(&self, now: Instant) -> usize {
        let mut removed = 0;
        for shard in self.shards.iter() {
            let mut shard = lock(shard);
            let n = shard.sweep(now);
            if n > 0 {
                self.len.fetch_sub(n, Ordering::AcqRel);
                removed += n;
            }
        }
        if removed > 0 {
            metrics::counter!(telemetry::SWEPT_ENTRIES_TOTAL).increment(removed as u64);
            debug!(removed, remaining = self.len.load(Ordering::Acquire), "swept expired entries");
        }
        removed
    }

    fn disarm(&self) {
        let mut sweeper = lock(&self.sweeper);
        if self.len.load(Ordering::Acquire) == 0 {
            if let Some(handle) = sweeper.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let sweeper = self
            .sweeper
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = sweeper.take() {
            handle.abort();
        }
    }
}

impl Shard {
    /// Insert or replace; returns `true` when the key was not present.
    fn insert(&mut self, key: String, value: String, expires: Instant, seq: u64) -> bool {
        let previous = self.slots.insert(
            key.clone(),
            Slot {
                value,
                expires,
                seq,
            },
        );
        if let Some(old) = &previous {
            self.by_expiry.remove(&(old.expires, old.seq));
        }
        self.by_expiry.insert((expires, seq), key);
        previous.is_none()
    }

    fn remove(&mut self, key: &str) -> bool {
        match self.slots.remove(key) {
            Some(old) => {
                self.by_expiry.remove(&(old.expires, old.seq));
                true
            }
            None => false,
        }
    }

    fn sweep(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        while let Some((&(expires, _), _)) = self.by_expiry.first_key_value() {
            if expires > now {
                break;
            }
            if let Some((_, key)) = self.by_expiry.pop_first() {
                self.slots.remove(&key);
                removed += 1;
            }
        }
        removed
    }
}

/// Spawn the sweep task if none is running.
///
/// Outside a tokio runtime nothing is spawned; expired entries stay hidden
/// from readers and are removed by the next timer armed from async context
/// or by [`MemoryStore::sweep_now`].
fn arm(inner: &Arc<Inner>) {
    let mut sweeper = lock(&inner.sweeper);
    if sweeper.as_ref().is_some_and(|handle| !handle.is_finished()) {
        return;
    }
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        debug!("no tokio runtime, sweep timer not armed");
        return;
    };
    let weak = Arc::downgrade(inner);
    let interval = inner.sweep_interval;
    *sweeper = Some(runtime.spawn(sweep_loop(weak, interval)));
}

async fn sweep_loop(store: Weak<Inner>, interval: Duration) {
    loop {
        tokio::time::sleep(interval).await;
        let Some(inner) = store.upgrade() else {
            return;
        };
        inner.sweep(Instant::now());

        // Checked under the sweeper lock so a concurrent `set` either sees
        // this task still armed or re-arms after it is cleared.
        let mut sweeper = lock(&inner.sweeper);
        if inner.len.load(Ordering::Acquire) == 0 {
            sweeper.take();
            debug!("store drained, sweep timer disarmed");
            return;
        }
    }
}

/// `now + lifetime`, saturating to roughly 30 years out for lifetimes that
/// would overflow the clock.
fn expiry_after(lifetime: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(lifetime)
        .unwrap_or_else(|| now + Duration::from_secs(86_400 * 365 * 30))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl EntryStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Option<String> {
        let shard = lock(self.inner.shard(key));
        shard
            .slots
            .get(key)
            .filter(|slot| slot.expires > Instant::now())
            .map(|slot| slot.value.clone())
    }

    async fn set(&self, key: &str, value: String, lifetime: Duration) {
        let expires = expiry_after(lifetime);
        let seq = self.inner.seq.fetch_add(1, Ordering::Relaxed);
        {
            let mut shard = lock(self.inner.shard(key));
            if shard.insert(key.to_string(), value, expires, seq) {
                self.inner.len.fetch_add(1, Ordering::AcqRel);
            }
        }
        arm(&self.inner);
    }

    async fn delete(&self, key: &str) -> bool {
        // `len` only changes under the shard lock that changed the entry.
        let (removed, drained) = {
            let mut shard = lock(self.inner.shard(key));
            let removed = shard.remove(key);
            let drained = removed && self.inner.len.fetch_sub(1, Ordering::AcqRel) == 1;
            (removed, drained)
        };
        if drained {
            self.inner.disarm();
        }
        removed
    }
}

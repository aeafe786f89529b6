//! Search-list and result-entry cache.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::CacheConfig;
use crate::store::EntryStore;
use crate::telemetry;
use crate::types::{CacheKey, Domain, MediaEntry, Provider, Selection, normalize};

/// Typed view over an [`EntryStore`] for one entry type.
///
/// Cheap to clone; clones share the same store.
pub struct ResultCache<E> {
    store: Arc<dyn EntryStore>,
    config: CacheConfig,
    _entry: PhantomData<fn() -> E>,
}

impl<E> Clone for ResultCache<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            _entry: PhantomData,
        }
    }
}

impl<E: MediaEntry> ResultCache<E> {
    pub fn new(store: Arc<dyn EntryStore>, config: CacheConfig) -> Self {
        Self {
            store,
            config,
            _entry: PhantomData,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn EntryStore> {
        &self.store
    }

    /// Ordered identifiers cached for `key`.
    ///
    /// An empty or undecodable list is reported as a miss.
    pub async fn load_search_list(&self, key: &CacheKey) -> Option<Vec<String>> {
        let key = key.to_string();
        let raw = self.store.get(&key).await?;
        let ids: Vec<String> = decode(&key, &raw)?;
        (!ids.is_empty()).then_some(ids)
    }

    /// Bulk-read result entries, 1:1 with `ids`. Missing or undecodable
    /// entries come back as `None`.
    pub async fn load_result_entries(
        &self,
        provider: Provider,
        domain: Domain,
        ids: &[String],
    ) -> Vec<Option<E>> {
        let keys: Vec<String> = ids
            .iter()
            .map(|id| CacheKey::result(provider, domain, id).to_string())
            .collect();
        let raw = self.store.get_many(&keys).await;
        keys.iter()
            .zip(raw)
            .map(|(key, raw)| raw.and_then(|raw| decode(key, &raw)))
            .collect()
    }

    /// Cached entries for `key`, in their original order.
    ///
    /// A list that references an entry which has since expired or been
    /// evicted is treated as a full miss, never returned partially.
    pub async fn load_search_results(&self, key: &CacheKey) -> Option<Vec<E>> {
        let Some(ids) = self.load_search_list(key).await else {
            record_miss("search");
            return None;
        };
        let entries = self
            .load_result_entries(key.provider, key.domain, &ids)
            .await;
        let total = entries.len();
        let resolved: Vec<E> = entries.into_iter().flatten().collect();
        if resolved.len() != total {
            debug!(
                key = %key,
                missing = total - resolved.len(),
                "search list references missing entries, treating as miss"
            );
            record_miss("search");
            return None;
        }
        record_hit("search");
        Some(resolved)
    }

    /// Cache the list of display identifiers under `key` and every entry
    /// under its own identifier, in one batch with the search lifetime.
    ///
    /// Returns the identifiers written, in order.
    pub async fn save_search_results(&self, key: &CacheKey, entries: &[E]) -> Vec<String> {
        let names: Vec<String> = entries.iter().map(MediaEntry::display_name).collect();

        let mut batch = Vec::with_capacity(entries.len() + 1);
        for (name, entry) in names.iter().zip(entries) {
            let item_key = CacheKey::result(key.provider, key.domain, name).to_string();
            if let Some(json) = encode(&item_key, entry) {
                batch.push((item_key, json));
            }
        }
        let list_key = key.to_string();
        if let Some(json) = encode(&list_key, &names) {
            // The list goes last so a reader that sees it can resolve its items.
            batch.push((list_key, json));
        }

        self.store.set_many(batch, self.config.search_ttl).await;
        names
    }

    /// Single entry by display identifier (case-insensitive).
    pub async fn load_result(&self, provider: Provider, domain: Domain, identifier: &str) -> Option<E> {
        let key = CacheKey::result(provider, domain, identifier).to_string();
        let entry = match self.store.get(&key).await {
            Some(raw) => decode(&key, &raw),
            None => None,
        };
        record(entry.is_some(), "result");
        entry
    }

    /// Entry pending the user's follow-up for `selection`.
    pub async fn load_selection(&self, selection: &Selection) -> Option<E> {
        let key = selection.encode();
        let entry = match self.store.get(&key).await {
            Some(raw) => decode(&key, &raw),
            None => None,
        };
        record(entry.is_some(), "selection");
        entry
    }

    /// Cache one entry under `selection` with the selection lifetime.
    pub async fn save_selection(&self, selection: &Selection, entry: &E) {
        let key = selection.encode();
        if let Some(json) = encode(&key, entry) {
            self.store.set(&key, json, self.config.selection_ttl).await;
        }
    }

    /// Cache autocomplete selections with the selection lifetime, in one batch.
    pub async fn save_selections(&self, selections: &[(Selection, E)]) {
        let batch: Vec<(String, String)> = selections
            .iter()
            .filter_map(|(selection, entry)| {
                let key = selection.encode();
                encode(&key, entry).map(|json| (key, json))
            })
            .collect();
        if batch.is_empty() {
            return;
        }
        self.store.set_many(batch, self.config.selection_ttl).await;
    }
}

/// Drop entries whose display identifier (case-insensitively) repeats an
/// earlier one. Such entries would share a result key, so only the first,
/// most relevant one is kept.
pub fn unique_by_name<E: MediaEntry>(entries: Vec<E>) -> Vec<E> {
    let mut seen = HashSet::with_capacity(entries.len());
    entries
        .into_iter()
        .filter(|entry| seen.insert(normalize(&entry.display_name())))
        .collect()
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "undecodable cache entry, treating as miss");
            None
        }
    }
}

fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!(key, error = %e, "failed to serialise cache entry, skipping write");
            None
        }
    }
}

fn record(hit: bool, tier: &'static str) {
    if hit {
        record_hit(tier);
    } else {
        record_miss(tier);
    }
}

fn record_hit(tier: &'static str) {
    metrics::counter!(telemetry::CACHE_HITS_TOTAL, "tier" => tier).increment(1);
}

fn record_miss(tier: &'static str) {
    metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "tier" => tier).increment(1);
}

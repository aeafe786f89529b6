//! Search orchestration: cache first, then one bounded upstream call.

mod autocomplete;

pub use autocomplete::{Choice, MAX_CHOICES};

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::cache::{ResultCache, unique_by_name};
use crate::providers::{MediaSource, PAGE_SIZE};
use crate::types::{CacheKey, Domain, Provider, Selection};
use crate::{NekokaiError, Result, telemetry};

/// Upstream budget per call. Autocomplete must answer within a few seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Per-provider entry point combining the result cache and an upstream
/// [`MediaSource`].
///
/// `search` and `get_single` never fail: upstream failures are logged and
/// reported as "nothing found". The `try_` variants return the failure so
/// callers can tell "no matches" from "service unavailable".
pub struct SearchOrchestrator<S: MediaSource> {
    source: S,
    cache: ResultCache<S::Entry>,
    timeout: Duration,
    page_size: usize,
}

impl<S: MediaSource> SearchOrchestrator<S> {
    pub fn new(source: S, cache: ResultCache<S::Entry>) -> Self {
        Self {
            source,
            cache,
            timeout: DEFAULT_TIMEOUT,
            page_size: PAGE_SIZE,
        }
    }

    /// Set the upstream timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the number of entries requested per upstream call.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn provider(&self) -> Provider {
        self.source.provider()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &ResultCache<S::Entry> {
        &self.cache
    }

    /// Entries for `query`, from cache when fully present, else upstream.
    ///
    /// Returns an empty list when the upstream call fails.
    pub async fn search(&self, domain: Domain, query: &str) -> Vec<S::Entry> {
        self.try_search(domain, query).await.unwrap_or_default()
    }

    /// Like [`search`](Self::search), but surfaces upstream failures.
    #[instrument(skip(self), fields(provider = %self.provider()))]
    pub async fn try_search(&self, domain: Domain, query: &str) -> Result<Vec<S::Entry>> {
        let key = CacheKey::for_query(self.provider(), domain, query);

        if let Some(entries) = self.cache.load_search_results(&key).await {
            debug!(key = %key, count = entries.len(), "search served from cache");
            return Ok(entries);
        }

        let entries = unique_by_name(self.fetch(&key).await?);
        if !entries.is_empty() {
            self.cache.save_search_results(&key, &entries).await;
        }
        Ok(entries)
    }

    /// One entry for a selection key, a display identifier or a raw query.
    ///
    /// Returns `None` when nothing matches or the upstream call fails.
    pub async fn get_single(&self, domain: Domain, identifier: &str) -> Option<S::Entry> {
        self.try_get_single(domain, identifier).await.unwrap_or_default()
    }

    /// Like [`get_single`](Self::get_single), but surfaces upstream failures.
    ///
    /// Lookup order: the selection cache when `identifier` is a selection key
    /// for this provider and domain; then the result-entry cache by
    /// normalised identifier; then a search whose first element is taken.
    #[instrument(skip(self), fields(provider = %self.provider()))]
    pub async fn try_get_single(&self, domain: Domain, identifier: &str) -> Result<Option<S::Entry>> {
        if let Some(selection) = self.own_selection(domain, identifier) {
            if let Some(entry) = self.cache.load_selection(&selection).await {
                return Ok(Some(entry));
            }
            // Expired selection: repeat the search it came from. Autocomplete
            // cached the shown list under the selection's (possibly cut)
            // query, so within the search lifetime the index points at the
            // same entry.
            debug!(selection = %selection, "selection expired, searching its query");
            let mut entries = self.try_search(domain, &selection.query).await?;
            return Ok(if selection.index < entries.len() {
                Some(entries.swap_remove(selection.index))
            } else {
                entries.into_iter().next()
            });
        }

        if let Some(entry) = self
            .cache
            .load_result(self.provider(), domain, identifier)
            .await
        {
            return Ok(Some(entry));
        }

        Ok(self.try_search(domain, identifier).await?.into_iter().next())
    }

    /// Parse `identifier` as a selection key addressed to this orchestrator.
    fn own_selection(&self, domain: Domain, identifier: &str) -> Option<Selection> {
        let selection = Selection::parse(identifier).ok()?;
        (selection.provider == self.provider() && selection.domain == domain).then_some(selection)
    }

    /// One upstream call under the timeout. Nothing is cached here.
    async fn fetch(&self, key: &CacheKey) -> Result<Vec<S::Entry>> {
        let provider = self.provider().as_str();
        let started = Instant::now();

        let call = async {
            if key.is_trending() {
                self.source.fetch_trending(key.domain, self.page_size).await
            } else {
                self.source
                    .fetch_search(key.domain, &key.discriminator, self.page_size)
                    .await
            }
        };
        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(NekokaiError::Timeout(self.timeout)),
        };

        metrics::histogram!(telemetry::UPSTREAM_DURATION_SECONDS, "provider" => provider)
            .record(started.elapsed().as_secs_f64());
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(telemetry::UPSTREAM_REQUESTS_TOTAL,
            "provider" => provider,
            "status" => status,
        )
        .increment(1);

        match &result {
            Ok(entries) => debug!(key = %key, count = entries.len(), "upstream fetch succeeded"),
            Err(e) => warn!(key = %key, error = %e, "upstream fetch failed"),
        }
        result
    }
}

//! Builder for configuring [`Nekokai`] instances

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::Nekokai;
use crate::cache::{CacheConfig, ResultCache};
use crate::config::{Config, Secrets};
use crate::providers::{AniListClient, KitsuClient, PAGE_SIZE, kitsu};
use crate::search::{DEFAULT_TIMEOUT, SearchOrchestrator};
use crate::store::{EntryStore, MemoryStore};
use crate::{NekokaiError, Result};

/// Builder for configuring [`Nekokai`] instances.
pub struct NekokaiBuilder {
    kitsu_credentials: Option<(String, String)>,
    anilist_url: Option<String>,
    kitsu_search_url: Option<String>,
    kitsu_edge_url: Option<String>,
    cache: CacheConfig,
    timeout: Duration,
    page_size: usize,
    store: Option<Arc<dyn EntryStore>>,
}

impl Default for NekokaiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NekokaiBuilder {
    pub fn new() -> Self {
        Self {
            kitsu_credentials: None,
            anilist_url: None,
            kitsu_search_url: None,
            kitsu_edge_url: None,
            cache: CacheConfig::default(),
            timeout: DEFAULT_TIMEOUT,
            page_size: PAGE_SIZE,
            store: None,
        }
    }

    /// Seed a builder from loaded configuration. The cache backend is not
    /// applied here; see [`Nekokai::from_config`].
    pub fn from_config(config: &Config, secrets: &Secrets) -> Self {
        let mut builder = Self::new()
            .cache_config(config.cache.cache_config())
            .timeout(config.upstream.timeout())
            .page_size(config.upstream.page_size);
        if let Some((app_id, api_key)) = secrets.kitsu_credentials() {
            builder = builder.kitsu(app_id, api_key);
        }
        builder.anilist_url = config.upstream.anilist_url.clone();
        builder.kitsu_search_url = config.upstream.kitsu_search_url.clone();
        builder.kitsu_edge_url = config.upstream.kitsu_edge_url.clone();
        builder
    }

    /// Configure Kitsu with its Algolia application id and search key.
    pub fn kitsu(mut self, app_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.kitsu_credentials = Some((app_id.into(), api_key.into()));
        self
    }

    /// Override the AniList GraphQL endpoint.
    pub fn anilist_url(mut self, url: impl Into<String>) -> Self {
        self.anilist_url = Some(url.into());
        self
    }

    /// Override the Kitsu Algolia and JSON:API endpoints.
    pub fn kitsu_urls(mut self, search_url: impl Into<String>, edge_url: impl Into<String>) -> Self {
        self.kitsu_search_url = Some(search_url.into());
        self.kitsu_edge_url = Some(edge_url.into());
        self
    }

    /// Set cache lifetimes and in-process store tuning.
    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// Set the upstream timeout (default: 2 s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the page size requested upstream (default: 25).
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Use an existing store instead of creating an in-process one.
    pub fn store(mut self, store: Arc<dyn EntryStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Connect to Redis and use it as the store.
    #[cfg(feature = "redis")]
    pub async fn redis(self, url: &str) -> Result<Self> {
        let store = crate::store::RedisStore::connect(url).await?;
        Ok(self.store(Arc::new(store)))
    }

    /// Build the facade.
    pub fn build(self) -> Result<Nekokai> {
        if self.page_size == 0 {
            return Err(NekokaiError::Configuration(
                "page size must be at least 1".to_string(),
            ));
        }

        let store: Arc<dyn EntryStore> = match self.store {
            Some(store) => store,
            None => Arc::new(MemoryStore::with_shards(
                self.cache.shards,
                self.cache.sweep_interval,
            )),
        };

        let anilist_client = match &self.anilist_url {
            Some(url) => AniListClient::with_base_url(url.as_str())?,
            None => AniListClient::new()?,
        };
        let anilist = SearchOrchestrator::new(
            anilist_client,
            ResultCache::new(Arc::clone(&store), self.cache.clone()),
        )
        .timeout(self.timeout)
        .page_size(self.page_size);

        let kitsu = match self.kitsu_credentials {
            Some((app_id, api_key)) => {
                let client = match (self.kitsu_search_url, self.kitsu_edge_url) {
                    (None, None) => KitsuClient::new(app_id, api_key)?,
                    (search_url, edge_url) => {
                        let search_url = search_url.unwrap_or_else(|| kitsu::algolia_url(&app_id));
                        let edge_url = edge_url.unwrap_or_else(|| kitsu::DEFAULT_EDGE_URL.to_string());
                        KitsuClient::with_base_urls(app_id, api_key, search_url, edge_url)?
                    }
                };
                let orchestrator = SearchOrchestrator::new(
                    client,
                    ResultCache::new(Arc::clone(&store), self.cache.clone()),
                )
                .timeout(self.timeout)
                .page_size(self.page_size);
                Some(orchestrator)
            }
            None => None,
        };

        info!(
            backend = store.backend(),
            kitsu = kitsu.is_some(),
            timeout_ms = self.timeout.as_millis() as u64,
            "nekokai initialised"
        );

        Ok(Nekokai {
            anilist,
            kitsu,
            store,
        })
    }
}

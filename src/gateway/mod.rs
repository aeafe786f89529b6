//! The [`Nekokai`] facade: one orchestrator per provider over a shared store.

mod builder;

pub use builder::NekokaiBuilder;

use std::sync::Arc;

use crate::config::{CacheBackend, Config, Secrets};
use crate::providers::{AniListClient, KitsuClient};
use crate::search::SearchOrchestrator;
use crate::store::EntryStore;
use crate::{NekokaiError, Result};

/// Search entry points for every configured provider.
///
/// Both orchestrators share one [`EntryStore`]; their keys never collide
/// because every key carries a provider prefix.
pub struct Nekokai {
    anilist: SearchOrchestrator<AniListClient>,
    kitsu: Option<SearchOrchestrator<KitsuClient>>,
    store: Arc<dyn EntryStore>,
}

impl Nekokai {
    /// Create a new builder.
    pub fn builder() -> NekokaiBuilder {
        NekokaiBuilder::new()
    }

    /// Build from loaded configuration, connecting to Redis when the
    /// `[cache]` backend asks for it.
    pub async fn from_config(config: &Config, secrets: &Secrets) -> Result<Self> {
        let builder = NekokaiBuilder::from_config(config, secrets);
        match config.cache.backend {
            CacheBackend::Memory => builder.build(),
            CacheBackend::Redis => {
                let url = config.cache.redis_url.as_deref().ok_or_else(|| {
                    NekokaiError::Configuration(
                        "cache.backend = \"redis\" requires cache.redis_url".to_string(),
                    )
                })?;
                connect_redis(builder, url).await?.build()
            }
        }
    }

    /// AniList orchestrator. Always available; AniList needs no credentials.
    pub fn anilist(&self) -> &SearchOrchestrator<AniListClient> {
        &self.anilist
    }

    /// Kitsu orchestrator, if Kitsu credentials were configured.
    pub fn kitsu(&self) -> Result<&SearchOrchestrator<KitsuClient>> {
        self.kitsu
            .as_ref()
            .ok_or(NekokaiError::MissingCredentials("kitsu"))
    }

    /// The store backing every cache.
    pub fn store(&self) -> &Arc<dyn EntryStore> {
        &self.store
    }
}

#[cfg(feature = "redis")]
async fn connect_redis(builder: NekokaiBuilder, url: &str) -> Result<NekokaiBuilder> {
    builder.redis(url).await
}

#[cfg(not(feature = "redis"))]
async fn connect_redis(_builder: NekokaiBuilder, _url: &str) -> Result<NekokaiBuilder> {
    Err(NekokaiError::Configuration(
        "redis cache backend requires the `redis` feature".to_string(),
    ))
}

//! Nekokai - search-result cache for an anime/manga lookup bot
//!
//! Slash-command autocomplete calls [`SearchOrchestrator::search`] with what
//! the user typed; results are served from a two-tier cache (ordered result
//! lists per query, plus one entry per result) and fetched upstream from
//! AniList or Kitsu only on a miss, under a 2 s timeout. Autocomplete choices
//! carry a selection key that [`SearchOrchestrator::get_single`] later
//! resolves from cache.
//!
//! The cache sits on an [`EntryStore`]: in-process ([`MemoryStore`]) by
//! default, or Redis with the `redis` feature.
//!
//! # Example
//!
//! ```rust,no_run
//! use nekokai::{Domain, Nekokai};
//!
//! #[tokio::main]
//! async fn main() -> nekokai::Result<()> {
//!     let nekokai = Nekokai::builder().build()?;
//!
//!     let choices = nekokai.anilist().autocomplete(Domain::Anime, "bebop").await;
//!     for choice in &choices {
//!         println!("{} -> {}", choice.name, choice.value);
//!     }
//!
//!     // The user picked the first suggestion.
//!     if let Some(choice) = choices.first() {
//!         let entry = nekokai.anilist().get_single(Domain::Anime, &choice.value).await;
//!         println!("{entry:?}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod providers;
pub mod search;
pub mod store;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use cache::{CacheConfig, ResultCache};
pub use config::{CacheBackend, Config, Secrets};
pub use error::{NekokaiError, Result};
pub use gateway::{Nekokai, NekokaiBuilder};
pub use providers::{AniListClient, KitsuClient, MediaSource};
pub use search::{Choice, SearchOrchestrator};
pub use store::{EntryStore, MemoryStore};
#[cfg(feature = "redis")]
pub use store::RedisStore;

pub use types::{
    AnilistEntry, CacheKey, CacheKind, Domain, KitsuEntry, KitsuTitles, LABEL_LIMIT, MediaEntry,
    MediaExternalLink, MediaTitle, Provider, Selection, normalize, truncate_utf16,
};

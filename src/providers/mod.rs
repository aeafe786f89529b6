//! Upstream metadata sources.
//!
//! Each provider implements [`MediaSource`]: a search by free text and a
//! trending listing, both returning at most one page of entries. Clients
//! issue exactly one HTTP request per call and never cache; caching and the
//! per-call timeout belong to the orchestrator.

pub mod anilist;
pub mod kitsu;

pub use anilist::AniListClient;
pub use kitsu::KitsuClient;

use async_trait::async_trait;
use reqwest::Response;

use crate::types::{Domain, MediaEntry, Provider};
use crate::{NekokaiError, Result};

/// Number of entries requested per upstream call.
pub const PAGE_SIZE: usize = 25;

/// User agent sent with every upstream request.
pub(crate) const USER_AGENT: &str = concat!("nekokai/", env!("CARGO_PKG_VERSION"));

/// A provider of anime/manga metadata.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Entry type produced by this provider.
    type Entry: MediaEntry;

    /// Which provider this is; selects the cache key namespace.
    fn provider(&self) -> Provider;

    /// Entries matching `query`, most relevant first.
    async fn fetch_search(&self, domain: Domain, query: &str, limit: usize) -> Result<Vec<Self::Entry>>;

    /// Currently trending entries, used when the query is blank.
    async fn fetch_trending(&self, domain: Domain, limit: usize) -> Result<Vec<Self::Entry>>;
}

/// Map a non-2xx response to [`NekokaiError::Api`], keeping a short excerpt
/// of the body as the message.
pub(crate) async fn error_for_status(provider: Provider, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let excerpt: String = body.chars().take(200).collect();
    Err(NekokaiError::Api {
        status: status.as_u16(),
        message: if excerpt.is_empty() {
            format!("{provider} API error: {status}")
        } else {
            format!("{provider} API error: {status}: {excerpt}")
        },
    })
}

pub(crate) fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| NekokaiError::Http(format!("failed to build HTTP client: {e}")))
}

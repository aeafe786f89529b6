//! AniList GraphQL client.
//!
//! See: <https://docs.anilist.co/guide/graphql/>

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{MediaSource, build_http_client, error_for_status};
use crate::types::{AnilistEntry, Domain, Provider};
use crate::{NekokaiError, Result};

/// Default GraphQL endpoint
const DEFAULT_BASE_URL: &str = "https://graphql.anilist.co";

const MEDIA_FIELDS: &str = "id title { romaji english native } description isAdult \
    countryOfOrigin duration siteUrl externalLinks { url site }";

/// Client for the AniList GraphQL API. No credentials are required.
#[derive(Clone)]
pub struct AniListClient {
    http: Client,
    base_url: String,
}

impl AniListClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client with a custom endpoint (for testing with wiremock).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: build_http_client()?,
            base_url: base_url.into(),
        })
    }

    async fn query_media(&self, query: &str, variables: Variables<'_>) -> Result<Vec<AnilistEntry>> {
        let url = format!("{}/", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .header("Accept", "application/json")
            .json(&GraphQlRequest { query, variables })
            .send()
            .await?;
        let response = error_for_status(Provider::AniList, response).await?;

        let body: GraphQlResponse = response.json().await?;
        let Some(data) = body.data else {
            let message = body
                .errors
                .into_iter()
                .next()
                .map(|e| e.message)
                .unwrap_or_else(|| "response contained no data".to_string());
            return Err(NekokaiError::Payload(message));
        };

        let entries: Vec<AnilistEntry> = data.page.media.into_iter().flatten().collect();
        debug!(count = entries.len(), "anilist returned media");
        Ok(entries)
    }
}

#[async_trait]
impl MediaSource for AniListClient {
    type Entry = AnilistEntry;

    fn provider(&self) -> Provider {
        Provider::AniList
    }

    async fn fetch_search(&self, domain: Domain, query: &str, limit: usize) -> Result<Vec<AnilistEntry>> {
        let variables = Variables {
            search: Some(query),
            per_page: limit,
        };
        self.query_media(&media_query(domain, false), variables).await
    }

    async fn fetch_trending(&self, domain: Domain, limit: usize) -> Result<Vec<AnilistEntry>> {
        let variables = Variables {
            search: None,
            per_page: limit,
        };
        self.query_media(&media_query(domain, true), variables).await
    }
}

/// GraphQL document for one page of anime or manga, either matching
/// `$search` or sorted by trend.
fn media_query(domain: Domain, trending: bool) -> String {
    let (media_type, extra) = match domain {
        Domain::Anime => ("ANIME", "episodes"),
        Domain::Manga => ("MANGA", "chapters volumes"),
    };
    let (params, filter) = if trending {
        ("$perPage: Int", "sort: [TRENDING_DESC]")
    } else {
        ("$search: String!, $perPage: Int", "search: $search")
    };
    format!(
        "query ({params}) {{ Page(page: 1, perPage: $perPage) {{ \
         media({filter}, type: {media_type}, isAdult: false) {{ {MEDIA_FIELDS} {extra} }} }} }}"
    )
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Variables<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Variables<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
    per_page: usize,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<PageData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct PageData {
    #[serde(rename = "Page")]
    page: Page,
}

#[derive(Deserialize)]
struct Page {
    #[serde(default)]
    media: Vec<Option<AnilistEntry>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

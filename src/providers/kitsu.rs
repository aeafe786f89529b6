//! Kitsu client.
//!
//! Text search goes through Kitsu's Algolia index and needs the Algolia
//! application id and search key; trending listings come from the public
//! JSON:API edge. Both payload shapes are mapped into [`KitsuEntry`].

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{MediaSource, build_http_client, error_for_status};
use crate::types::{Domain, KitsuEntry, KitsuTitles, Provider};
use crate::{NekokaiError, Result};

/// Default JSON:API edge
pub const DEFAULT_EDGE_URL: &str = "https://kitsu.io/api/edge";

/// Algolia index holding both anime and manga.
const SEARCH_INDEX: &str = "production_media";

/// Client for Kitsu search and trending listings.
#[derive(Clone)]
pub struct KitsuClient {
    http: Client,
    app_id: String,
    api_key: String,
    search_url: String,
    edge_url: String,
}

impl KitsuClient {
    /// Create a client from the Algolia application id and search key.
    pub fn new(app_id: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let app_id = app_id.into();
        let search_url = algolia_url(&app_id);
        Self::with_base_urls(app_id, api_key, search_url, DEFAULT_EDGE_URL)
    }

    /// Create a client with custom endpoints (for testing with wiremock).
    pub fn with_base_urls(
        app_id: impl Into<String>,
        api_key: impl Into<String>,
        search_url: impl Into<String>,
        edge_url: impl Into<String>,
    ) -> Result<Self> {
        let app_id = app_id.into();
        let api_key = api_key.into();
        if app_id.trim().is_empty() || api_key.trim().is_empty() {
            return Err(NekokaiError::MissingCredentials("kitsu"));
        }
        Ok(Self {
            http: build_http_client()?,
            app_id,
            api_key,
            search_url: search_url.into(),
            edge_url: edge_url.into(),
        })
    }
}

#[async_trait]
impl MediaSource for KitsuClient {
    type Entry = KitsuEntry;

    fn provider(&self) -> Provider {
        Provider::Kitsu
    }

    async fn fetch_search(&self, domain: Domain, query: &str, limit: usize) -> Result<Vec<KitsuEntry>> {
        let url = format!(
            "{}/1/indexes/{SEARCH_INDEX}/query",
            self.search_url.trim_end_matches('/')
        );
        let params = search_params(domain, query, limit);

        let response = self
            .http
            .post(&url)
            .header("X-Algolia-API-Key", &self.api_key)
            .header("X-Algolia-Application-Id", &self.app_id)
            .json(&AlgoliaRequest { params: &params })
            .send()
            .await?;
        let response = error_for_status(Provider::Kitsu, response).await?;

        let body: AlgoliaResponse = response.json().await?;
        debug!(count = body.hits.len(), "kitsu search returned hits");
        Ok(body.hits.into_iter().map(AlgoliaHit::into_entry).collect())
    }

    async fn fetch_trending(&self, domain: Domain, limit: usize) -> Result<Vec<KitsuEntry>> {
        let url = format!(
            "{}/trending/{}",
            self.edge_url.trim_end_matches('/'),
            domain.as_str()
        );

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.api+json")
            .query(&[("limit", limit)])
            .send()
            .await?;
        let response = error_for_status(Provider::Kitsu, response).await?;

        let body: TrendingResponse = response.json().await?;
        debug!(count = body.data.len(), "kitsu trending returned entries");
        body.data.into_iter().map(TrendingDatum::into_entry).collect()
    }
}

/// Algolia search host for an application id.
pub fn algolia_url(app_id: &str) -> String {
    format!("https://{app_id}-dsn.algolia.net")
}

/// Algolia `params` string: url-encoded query, kind facet and page size.
fn search_params(domain: Domain, query: &str, limit: usize) -> String {
    format!(
        "query={}&facetFilters={}&hitsPerPage={limit}",
        urlencoding::encode(query),
        urlencoding::encode(&format!("kind:{domain}")),
    )
}

/// `YYYY-MM-DD` as unix seconds at UTC midnight.
fn parse_start_date(date: &str) -> Option<i64> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp())
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

// ============================================================================
// Algolia search
// ============================================================================

#[derive(Serialize)]
struct AlgoliaRequest<'a> {
    params: &'a str,
}

#[derive(Deserialize)]
struct AlgoliaResponse {
    #[serde(default)]
    hits: Vec<AlgoliaHit>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlgoliaHit {
    id: u64,
    synopsis: Option<String>,
    average_rating: Option<f64>,
    subtype: Option<String>,
    #[serde(default)]
    titles: RawTitles,
    canonical_title: Option<String>,
    poster_image: Option<PosterImage>,
    age_rating: Option<String>,
    /// Unix seconds.
    start_date: Option<i64>,
    episode_count: Option<u32>,
    episode_length: Option<u32>,
    chapter_count: Option<u32>,
    volume_count: Option<u32>,
}

impl AlgoliaHit {
    fn into_entry(self) -> KitsuEntry {
        KitsuEntry {
            id: self.id,
            synopsis: self.synopsis.unwrap_or_default(),
            average_rating: self.average_rating,
            subtype: self.subtype,
            titles: self.titles.with_canonical(self.canonical_title),
            poster: self.poster_image.and_then(|p| p.original),
            age_rating: self.age_rating,
            start_date: self.start_date,
            episode_count: self.episode_count,
            episode_length: self.episode_length,
            chapter_count: self.chapter_count,
            volume_count: self.volume_count,
        }
    }
}

// ============================================================================
// JSON:API trending
// ============================================================================

#[derive(Deserialize)]
struct TrendingResponse {
    #[serde(default)]
    data: Vec<TrendingDatum>,
}

#[derive(Deserialize)]
struct TrendingDatum {
    id: String,
    attributes: TrendingAttributes,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrendingAttributes {
    synopsis: Option<String>,
    /// Decimal string, e.g. `"82.31"`.
    average_rating: Option<String>,
    subtype: Option<String>,
    #[serde(default)]
    titles: RawTitles,
    canonical_title: Option<String>,
    poster_image: Option<PosterImage>,
    age_rating: Option<String>,
    /// `YYYY-MM-DD`.
    start_date: Option<String>,
    episode_count: Option<u32>,
    episode_length: Option<u32>,
    chapter_count: Option<u32>,
    volume_count: Option<u32>,
}

impl TrendingDatum {
    fn into_entry(self) -> Result<KitsuEntry> {
        let id = self
            .id
            .parse()
            .map_err(|_| NekokaiError::Payload(format!("non-numeric kitsu id '{}'", self.id)))?;
        let attrs = self.attributes;
        Ok(KitsuEntry {
            id,
            synopsis: attrs.synopsis.unwrap_or_default(),
            average_rating: attrs.average_rating.and_then(|r| r.parse().ok()),
            subtype: attrs.subtype,
            titles: attrs.titles.with_canonical(attrs.canonical_title),
            poster: attrs.poster_image.and_then(|p| p.original),
            age_rating: attrs.age_rating,
            start_date: attrs.start_date.as_deref().and_then(parse_start_date),
            episode_count: attrs.episode_count,
            episode_length: attrs.episode_length,
            chapter_count: attrs.chapter_count,
            volume_count: attrs.volume_count,
        })
    }
}

// ============================================================================
// Shared payload pieces
// ============================================================================

#[derive(Default, Deserialize)]
struct RawTitles {
    en: Option<String>,
    en_us: Option<String>,
    en_jp: Option<String>,
    ja_jp: Option<String>,
}

impl RawTitles {
    fn with_canonical(self, canonical: Option<String>) -> KitsuTitles {
        KitsuTitles {
            en: blank_to_none(self.en),
            en_us: blank_to_none(self.en_us),
            en_jp: blank_to_none(self.en_jp),
            ja_jp: blank_to_none(self.ja_jp),
            canonical: blank_to_none(canonical),
        }
    }
}

#[derive(Deserialize)]
struct PosterImage {
    original: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MediaEntry;

    #[test]
    fn search_params_encode_query_and_facet() {
        assert_eq!(
            search_params(Domain::Anime, "re:zero & friends", 25),
            "query=re%3Azero%20%26%20friends&facetFilters=kind%3Aanime&hitsPerPage=25"
        );
    }

    #[test]
    fn start_date_is_utc_midnight() {
        assert_eq!(parse_start_date("1970-01-02"), Some(86_400));
        assert_eq!(parse_start_date("2006-04-04"), Some(1_144_108_800));
        assert_eq!(parse_start_date("soon"), None);
    }

    #[test]
    fn trending_datum_maps_string_fields() {
        let json = r#"{
            "id": "1376",
            "attributes": {
                "synopsis": "A boy and his notebook.",
                "averageRating": "83.05",
                "subtype": "TV",
                "titles": { "en": "Death Note", "en_jp": "Death Note", "ja_jp": "デスノート" },
                "canonicalTitle": "Death Note",
                "posterImage": { "original": "https://media.kitsu.io/anime/1376/poster.jpg" },
                "ageRating": "R",
                "startDate": "2006-10-04",
                "episodeCount": 37,
                "episodeLength": 23
            }
        }"#;
        let datum: TrendingDatum = serde_json::from_str(json).unwrap();
        let entry = datum.into_entry().unwrap();
        assert_eq!(entry.id, 1376);
        assert_eq!(entry.average_rating, Some(83.05));
        assert_eq!(entry.start_date, Some(1_159_920_000));
        assert_eq!(entry.titles.canonical.as_deref(), Some("Death Note"));
        assert_eq!(entry.display_name(), "Death Note");
        assert!(entry.chapter_count.is_none());
    }

    #[test]
    fn trending_datum_rejects_non_numeric_id() {
        let json = r#"{ "id": "abc", "attributes": {} }"#;
        let datum: TrendingDatum = serde_json::from_str(json).unwrap();
        assert!(matches!(datum.into_entry(), Err(NekokaiError::Payload(_))));
    }

    #[test]
    fn algolia_hit_defaults_missing_synopsis() {
        let json = r#"{
            "id": 11,
            "averageRating": 79.5,
            "titles": { "en_jp": "Naruto", "en": "" },
            "canonicalTitle": "Naruto",
            "posterImage": { "original": null },
            "startDate": 1191974400,
            "episodeCount": 220
        }"#;
        let hit: AlgoliaHit = serde_json::from_str(json).unwrap();
        let entry = hit.into_entry();
        assert_eq!(entry.synopsis, "");
        assert!(entry.titles.en.is_none());
        assert_eq!(entry.display_name(), "Naruto");
        assert!(entry.poster.is_none());
    }

    #[test]
    fn missing_credentials_are_rejected() {
        assert!(matches!(
            KitsuClient::new("", "key"),
            Err(NekokaiError::MissingCredentials("kitsu"))
        ));
    }
}

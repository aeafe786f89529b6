//! AniList media record, as cached.
//!
//! Field names follow AniList's GraphQL schema (camelCase), so the GraphQL
//! `Media` object deserialises into [`AnilistEntry`] directly.

use serde::{Deserialize, Serialize};

use super::media::{MediaEntry, first_present};

/// Anime or manga record from AniList.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnilistEntry {
    /// The id of the media
    pub id: u64,
    /// The official titles of the media in various languages
    pub title: MediaTitle,
    /// Short description of the media's story and characters (HTML)
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_adult: Option<bool>,
    /// ISO 3166-1 alpha-2
    #[serde(default)]
    pub country_of_origin: Option<String>,
    /// General length of each anime episode in minutes
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub chapters: Option<u32>,
    #[serde(default)]
    pub volumes: Option<u32>,
    #[serde(default)]
    pub site_url: Option<String>,
    #[serde(default)]
    pub external_links: Option<Vec<Option<MediaExternalLink>>>,
}

/// The official titles of the media in various languages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaTitle {
    #[serde(default)]
    pub romaji: Option<String>,
    #[serde(default)]
    pub english: Option<String>,
    #[serde(default)]
    pub native: Option<String>,
}

/// An external link to another site related to the media
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaExternalLink {
    pub url: String,
    pub site: String,
}

impl MediaEntry for AnilistEntry {
    fn id(&self) -> u64 {
        self.id
    }

    fn best_title(&self) -> Option<&str> {
        first_present(&[
            self.title.english.as_deref(),
            self.title.romaji.as_deref(),
            self.title.native.as_deref(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(english: Option<&str>, romaji: Option<&str>, native: Option<&str>) -> AnilistEntry {
        AnilistEntry {
            id: 20,
            title: MediaTitle {
                romaji: romaji.map(String::from),
                english: english.map(String::from),
                native: native.map(String::from),
            },
            description: None,
            is_adult: Some(false),
            country_of_origin: None,
            duration: None,
            episodes: None,
            chapters: None,
            volumes: None,
            site_url: None,
            external_links: None,
        }
    }

    #[test]
    fn display_name_prefers_english() {
        let e = entry(Some("Naruto"), Some("NARUTO"), Some("ナルト"));
        assert_eq!(e.display_name(), "Naruto");
    }

    #[test]
    fn display_name_falls_back_through_titles() {
        assert_eq!(entry(None, Some("NARUTO"), None).display_name(), "NARUTO");
        assert_eq!(entry(Some(""), None, Some("ナルト")).display_name(), "ナルト");
        assert_eq!(entry(None, None, None).display_name(), "20");
    }

    #[test]
    fn deserialises_graphql_media() {
        let json = r#"{
            "id": 1,
            "title": { "romaji": "Cowboy Bebop", "english": "Cowboy Bebop", "native": null },
            "description": "Space western",
            "isAdult": false,
            "countryOfOrigin": "JP",
            "duration": 24,
            "siteUrl": "https://anilist.co/anime/1",
            "externalLinks": [{ "url": "https://example.com", "site": "Example" }, null],
            "episodes": 26
        }"#;
        let e: AnilistEntry = serde_json::from_str(json).unwrap();
        assert_eq!(e.episodes, Some(26));
        assert_eq!(e.country_of_origin.as_deref(), Some("JP"));
        assert_eq!(e.external_links.as_ref().unwrap().len(), 2);
        assert!(e.chapters.is_none());
    }
}

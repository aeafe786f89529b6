//! Kitsu media record, as cached.
//!
//! Kitsu answers searches through Algolia and trending listings through its
//! JSON:API edge; both payloads are mapped into [`KitsuEntry`] by
//! [`providers::kitsu`](crate::providers::kitsu).

use serde::{Deserialize, Serialize};

use super::media::{MediaEntry, first_present};

/// Anime or manga record from Kitsu. Episode fields are only populated for
/// anime, chapter/volume fields only for manga.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitsuEntry {
    pub id: u64,
    #[serde(default)]
    pub synopsis: String,
    /// Percentage, 0–100.
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub subtype: Option<String>,
    pub titles: KitsuTitles,
    /// Poster image URL (original size).
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub age_rating: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub start_date: Option<i64>,
    #[serde(default)]
    pub episode_count: Option<u32>,
    /// Minutes.
    #[serde(default)]
    pub episode_length: Option<u32>,
    #[serde(default)]
    pub chapter_count: Option<u32>,
    #[serde(default)]
    pub volume_count: Option<u32>,
}

/// Localised titles. Only the locales the bot displays are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KitsuTitles {
    #[serde(default)]
    pub en: Option<String>,
    #[serde(default)]
    pub en_us: Option<String>,
    #[serde(default)]
    pub en_jp: Option<String>,
    #[serde(default)]
    pub ja_jp: Option<String>,
    #[serde(default)]
    pub canonical: Option<String>,
}

impl MediaEntry for KitsuEntry {
    fn id(&self) -> u64 {
        self.id
    }

    fn best_title(&self) -> Option<&str> {
        first_present(&[
            self.titles.en.as_deref(),
            self.titles.en_us.as_deref(),
            self.titles.en_jp.as_deref(),
            self.titles.ja_jp.as_deref(),
            self.titles.canonical.as_deref(),
        ])
    }
}

//! Provider/domain identifiers and the [`MediaEntry`] contract shared by all
//! cached payloads.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::key::{LABEL_LIMIT, truncate_utf16};
use crate::NekokaiError;

/// Upstream metadata source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    AniList,
    Kitsu,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AniList => "anilist",
            Self::Kitsu => "kitsu",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = NekokaiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anilist" => Ok(Self::AniList),
            "kitsu" => Ok(Self::Kitsu),
            other => Err(NekokaiError::Configuration(format!(
                "unknown provider '{other}'"
            ))),
        }
    }
}

/// The two media kinds queried upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Anime,
    Manga,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anime => "anime",
            Self::Manga => "manga",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = NekokaiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anime" => Ok(Self::Anime),
            "manga" => Ok(Self::Manga),
            other => Err(NekokaiError::Configuration(format!(
                "unknown domain '{other}'"
            ))),
        }
    }
}

/// A full media record that can be cached and addressed by display name.
///
/// Entries are immutable once cached; a refresh replaces them wholesale.
pub trait MediaEntry: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Upstream numeric id.
    fn id(&self) -> u64;

    /// Best available title: English, then romanised, then native.
    fn best_title(&self) -> Option<&str>;

    /// Identifier used for cache keys and autocomplete labels.
    ///
    /// Falls back to the numeric id and is always capped at
    /// [`LABEL_LIMIT`] UTF-16 code units.
    fn display_name(&self) -> String {
        match self.best_title() {
            Some(title) => truncate_utf16(title, LABEL_LIMIT),
            None => self.id().to_string(),
        }
    }
}

/// First candidate that is present and not blank.
pub(crate) fn first_present<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|s| !s.trim().is_empty())
}

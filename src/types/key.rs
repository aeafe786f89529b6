//! Cache key scheme.
//!
//! Keys render as `{prefix}:{discriminator}` where the prefix encodes the
//! provider, domain and kind (e.g. `aas` = AniList anime search, `kmr` =
//! Kitsu manga result). Keys are global: no user id is embedded.

use std::fmt;

use super::media::{Domain, Provider};
use crate::{NekokaiError, Result};

/// Maximum length, in UTF-16 code units, of a display identifier and of an
/// autocomplete choice value. Matches the chat platform's label limit.
pub const LABEL_LIMIT: usize = 100;

/// Normalise free text for use as a key discriminator.
pub fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Truncate `text` to at most `limit` UTF-16 code units.
///
/// Text that already fits is returned unchanged. Otherwise the text is cut on
/// the last space that fits and an ellipsis is appended, so the result is
/// always `<= limit` units and never splits a surrogate pair.
pub fn truncate_utf16(text: &str, limit: usize) -> String {
    if text.encode_utf16().count() <= limit {
        return text.to_string();
    }
    if limit == 0 {
        return String::new();
    }

    let head = cut_utf16(text, limit - 1);
    let head = match head.rfind(' ') {
        Some(pos) if pos > 0 => head[..pos].trim_end(),
        _ => head,
    };
    format!("{head}…")
}

/// Longest prefix of `text` that fits in `limit` UTF-16 code units.
fn cut_utf16(text: &str, limit: usize) -> &str {
    let mut units = 0;
    for (idx, ch) in text.char_indices() {
        units += ch.len_utf16();
        if units > limit {
            return &text[..idx];
        }
    }
    text
}

/// What a key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// Ordered identifier list for a searched query.
    Search,
    /// Ordered identifier list for the blank-query trending listing.
    Trending,
    /// One full entry, addressed by its display identifier.
    Result,
    /// One entry pending an autocomplete follow-up, addressed by query + index.
    Selection,
}

/// Fully qualified cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub provider: Provider,
    pub domain: Domain,
    pub kind: CacheKind,
    pub discriminator: String,
}

impl CacheKey {
    /// Key for the list produced by `query`.
    ///
    /// Blank queries route to the [`CacheKind::Trending`] namespace, which can
    /// never collide with a searched query.
    pub fn for_query(provider: Provider, domain: Domain, query: &str) -> Self {
        let discriminator = normalize(query);
        let kind = if discriminator.is_empty() {
            CacheKind::Trending
        } else {
            CacheKind::Search
        };
        Self {
            provider,
            domain,
            kind,
            discriminator,
        }
    }

    /// Key for a single entry addressed by its display identifier.
    pub fn result(provider: Provider, domain: Domain, identifier: &str) -> Self {
        Self {
            provider,
            domain,
            kind: CacheKind::Result,
            discriminator: normalize(identifier),
        }
    }

    /// Whether this key addresses the trending listing.
    pub fn is_trending(&self) -> bool {
        self.kind == CacheKind::Trending
    }

    /// The `{prefix}` part of the rendered key.
    pub fn prefix(&self) -> &'static str {
        prefix_for(self.provider, self.domain, self.kind)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == CacheKind::Trending {
            f.write_str(self.prefix())
        } else {
            write!(f, "{}:{}", self.prefix(), self.discriminator)
        }
    }
}

fn prefix_for(provider: Provider, domain: Domain, kind: CacheKind) -> &'static str {
    use CacheKind as K;
    match (provider, domain, kind) {
        (Provider::AniList, Domain::Anime, K::Search) => "aas",
        (Provider::AniList, Domain::Anime, K::Trending) => "aat",
        (Provider::AniList, Domain::Anime, K::Result) => "aar",
        (Provider::AniList, Domain::Anime, K::Selection) => "aAnime",
        (Provider::AniList, Domain::Manga, K::Search) => "ams",
        (Provider::AniList, Domain::Manga, K::Trending) => "amt",
        (Provider::AniList, Domain::Manga, K::Result) => "amr",
        (Provider::AniList, Domain::Manga, K::Selection) => "aManga",
        (Provider::Kitsu, Domain::Anime, K::Search) => "kas",
        (Provider::Kitsu, Domain::Anime, K::Trending) => "kat",
        (Provider::Kitsu, Domain::Anime, K::Result) => "kar",
        (Provider::Kitsu, Domain::Anime, K::Selection) => "kAnime",
        (Provider::Kitsu, Domain::Manga, K::Search) => "kms",
        (Provider::Kitsu, Domain::Manga, K::Trending) => "kmt",
        (Provider::Kitsu, Domain::Manga, K::Result) => "kmr",
        (Provider::Kitsu, Domain::Manga, K::Selection) => "kManga",
    }
}

const SELECTION_PREFIXES: [(Provider, Domain); 4] = [
    (Provider::AniList, Domain::Anime),
    (Provider::AniList, Domain::Manga),
    (Provider::Kitsu, Domain::Anime),
    (Provider::Kitsu, Domain::Manga),
];

/// Autocomplete selection key: `{prefix}:{query}:{index}`.
///
/// Encoded into a choice's value when suggestions are shown and decoded
/// again when the user submits the command. The rendered form never exceeds
/// [`LABEL_LIMIT`] units; long queries are cut to fit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub provider: Provider,
    pub domain: Domain,
    pub query: String,
    pub index: usize,
}

impl Selection {
    pub fn new(provider: Provider, domain: Domain, query: &str, index: usize) -> Self {
        let prefix = prefix_for(provider, domain, CacheKind::Selection);
        let overhead = prefix.len() + 2 + index.to_string().len();
        let query = normalize(query);
        let query = cut_utf16(&query, LABEL_LIMIT.saturating_sub(overhead)).to_string();
        Self {
            provider,
            domain,
            query,
            index,
        }
    }

    /// Decode a previously encoded selection key.
    ///
    /// The prefix ends at the first `:` and the index starts after the last
    /// one, so queries containing `:` survive the round trip.
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || NekokaiError::InvalidSelectionKey(value.to_string());

        let (prefix, rest) = value.split_once(':').ok_or_else(invalid)?;
        let (query, index) = rest.rsplit_once(':').ok_or_else(invalid)?;
        let index = index.parse::<usize>().map_err(|_| invalid())?;
        let (provider, domain) = SELECTION_PREFIXES
            .iter()
            .copied()
            .find(|(p, d)| prefix_for(*p, *d, CacheKind::Selection) == prefix)
            .ok_or_else(invalid)?;

        Ok(Self {
            provider,
            domain,
            query: query.to_string(),
            index,
        })
    }

    /// The cache key this selection is stored under.
    pub fn key(&self) -> CacheKey {
        CacheKey {
            provider: self.provider,
            domain: self.domain,
            kind: CacheKind::Selection,
            discriminator: format!("{}:{}", self.query, self.index),
        }
    }

    /// Rendered form, identical to `self.key().to_string()`.
    pub fn encode(&self) -> String {
        self.key().to_string()
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.key().fmt(f)
    }
}

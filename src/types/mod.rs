//! Public types for the Nekokai API.

mod anilist;
mod key;
mod kitsu;
mod media;

pub use anilist::{AnilistEntry, MediaExternalLink, MediaTitle};
pub use key::{CacheKey, CacheKind, LABEL_LIMIT, Selection, normalize, truncate_utf16};
pub use kitsu::{KitsuEntry, KitsuTitles};
pub use media::{Domain, MediaEntry, Provider};

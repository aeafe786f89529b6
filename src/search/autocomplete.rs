//! Autocomplete choices backed by short-lived selection entries.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::SearchOrchestrator;
use crate::Result;
use crate::providers::MediaSource;
use crate::types::{CacheKey, Domain, MediaEntry, Selection, normalize};

/// Most choices a chat platform accepts in one autocomplete response.
pub const MAX_CHOICES: usize = 25;

/// One suggestion: a label to show and the selection key to send back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub name: String,
    pub value: String,
}

impl<S: MediaSource> SearchOrchestrator<S> {
    /// Suggestions for `query`. Returns no choices when the upstream fails.
    pub async fn autocomplete(&self, domain: Domain, query: &str) -> Vec<Choice> {
        self.try_autocomplete(domain, query).await.unwrap_or_default()
    }

    /// Run a search, cache each shown entry under its selection key with
    /// the selection lifetime, and return at most [`MAX_CHOICES`] choices.
    ///
    /// The choice value, passed back to [`get_single`](Self::get_single),
    /// resolves to exactly the entry that was shown.
    #[instrument(skip(self), fields(provider = %self.provider()))]
    pub async fn try_autocomplete(&self, domain: Domain, query: &str) -> Result<Vec<Choice>> {
        let mut entries = self.try_search(domain, query).await?;
        entries.truncate(MAX_CHOICES);

        let provider = self.provider();
        let mut choices = Vec::with_capacity(entries.len());
        let mut selections = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let selection = Selection::new(provider, domain, query, index);
            choices.push(Choice {
                name: entry.display_name(),
                value: selection.encode(),
            });
            selections.push((selection, entry.clone()));
        }

        // A long query is cut to fit the selection key. Keep the list under
        // the cut query too, so an expired selection re-resolves against the
        // list that was shown.
        let normalized = normalize(query);
        let mut cut_queries: Vec<&str> = Vec::new();
        for (selection, _) in &selections {
            let cut = selection.query.as_str();
            if cut != normalized && !cut_queries.contains(&cut) {
                cut_queries.push(cut);
            }
        }
        for cut in cut_queries {
            debug!(query = cut, "caching list under cut selection query");
            let key = CacheKey::for_query(provider, domain, cut);
            self.cache().save_search_results(&key, &entries).await;
        }

        self.cache().save_selections(&selections).await;
        Ok(choices)
    }
}

//! Autocomplete suggestions for `/play`.
//!
//! A song-search API is asked first. When it fails, times out or comes back
//! empty, a flat extractor search fills in. Results, including empty ones, are
//! memoized briefly so every keystroke does not hit the network.

pub mod deezer;
pub mod itunes;

use serenity::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{ExtractRequest, ExtractionBackend, non_empty};
use crate::commands::music::utils::{
    music_manager::{MusicError, MusicResult},
    suggestion_cache::SuggestionCache,
};
use crate::config::{Config, SearchProvider, SuggestionSettings};
use deezer::DeezerSearch;
use itunes::ItunesSearch;

/// Discord rejects autocomplete names and values longer than this.
pub const MAX_CHOICE_LEN: usize = 100;

/// One autocomplete choice: what the user sees and what `/play` receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub label: String,
    pub value: String,
}

impl Suggestion {
    pub fn new(label: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        Self {
            label: truncate_chars(label.as_ref(), MAX_CHOICE_LEN),
            value: truncate_chars(value.as_ref(), MAX_CHOICE_LEN),
        }
    }

    /// Builds a choice from a catalogue hit: "Title — Artist" shown, a search phrase sent.
    pub fn from_song(title: Option<&str>, artist: Option<&str>) -> Option<Self> {
        let title = title.map(str::trim).filter(|t| !t.is_empty())?;
        let artist = artist.map(str::trim).filter(|a| !a.is_empty());

        let (label, value) = match artist {
            Some(artist) => (
                format!("{title} — {artist}"),
                format!("{title} {artist} audio"),
            ),
            None => (title.to_string(), format!("{title} audio")),
        };
        Some(Self::new(label, value))
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

/// An external catalogue that can be searched for songs by name.
#[async_trait]
pub trait SongSearch: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> MusicResult<Vec<Suggestion>>;
}

/// Builds the configured song-search provider.
pub fn provider_from_config(config: &Config) -> Arc<dyn SongSearch> {
    let client = reqwest::Client::builder()
        .timeout(config.suggestions.api_timeout)
        .user_agent(config.stream_user_agent.clone())
        .build()
        .unwrap_or_default();

    match config.search_provider {
        SearchProvider::Itunes => Arc::new(ItunesSearch::new(client)),
        SearchProvider::Deezer => Arc::new(DeezerSearch::new(client)),
    }
}

pub struct SuggestionService {
    provider: Arc<dyn SongSearch>,
    backend: Arc<dyn ExtractionBackend>,
    cache: SuggestionCache,
    settings: SuggestionSettings,
}

impl SuggestionService {
    pub fn new(
        provider: Arc<dyn SongSearch>,
        backend: Arc<dyn ExtractionBackend>,
        settings: SuggestionSettings,
    ) -> Self {
        Self {
            provider,
            backend,
            cache: SuggestionCache::new(settings.cache_ttl, settings.cache_capacity),
            settings,
        }
    }

    /// Suggestions for a partially typed query. Never fails; worst case is an empty list.
    pub async fn suggest(&self, partial: &str) -> Vec<Suggestion> {
        let query = partial.trim();
        if query.chars().count() < self.settings.min_query_len {
            return Vec::new();
        }

        let key = query.to_lowercase();
        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }

        let mut suggestions = self.from_provider(query).await;
        if suggestions.is_empty() {
            suggestions = self.from_extractor(query).await;
        }
        suggestions.truncate(self.settings.max_results);

        self.cache.insert(key, suggestions.clone());
        suggestions
    }

    async fn from_provider(&self, query: &str) -> Vec<Suggestion> {
        let search = self.provider.search(query, self.settings.max_results);
        match tokio::time::timeout(self.settings.api_timeout, search).await {
            Ok(Ok(suggestions)) => suggestions,
            Ok(Err(e)) => {
                debug!("Song search failed for '{}': {}", query, e);
                Vec::new()
            }
            Err(_) => {
                debug!("Song search timed out for '{}'", query);
                Vec::new()
            }
        }
    }

    async fn from_extractor(&self, query: &str) -> Vec<Suggestion> {
        let timeout = self.settings.fallback_timeout;
        let request = ExtractRequest::new(
            format!("ytsearch{}:{}", self.settings.max_results, query),
            timeout,
        )
        .flat();

        let info = match tokio::time::timeout(timeout, self.backend.extract(&request)).await {
            Ok(Ok(info)) => info,
            Ok(Err(e)) => {
                debug!("Fallback search failed for '{}': {}", query, e);
                return Vec::new();
            }
            Err(_) => {
                debug!("Fallback search timed out for '{}'", query);
                return Vec::new();
            }
        };

        info.into_entries()
            .into_iter()
            .filter_map(|entry| {
                let link = non_empty(entry.url).or_else(|| non_empty(entry.webpage_url))?;
                let title = non_empty(entry.title).unwrap_or_else(|| link.clone());
                Some(Suggestion::new(title, link))
            })
            .collect()
    }
}

/// Shared HTTP plumbing for the catalogue providers.
pub(crate) async fn fetch_json<T: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
    provider: &str,
) -> MusicResult<T> {
    let response = request.send().await.map_err(|e| {
        MusicError::ExternalApiError(format!("Failed to reach {}: {}", provider, e))
    })?;

    if !response.status().is_success() {
        return Err(MusicError::ExternalApiError(format!(
            "{} API error: {}",
            provider,
            response.status()
        )));
    }

    response.json::<T>().await.map_err(|e| {
        MusicError::ExternalApiError(format!("Failed to parse {} response: {}", provider, e))
    })
}

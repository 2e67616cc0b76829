//! Song search against the public iTunes Search API.

use serde::Deserialize;
use serenity::async_trait;
use tracing::debug;

use super::{SongSearch, Suggestion, fetch_json};
use crate::commands::music::utils::music_manager::MusicResult;

pub const ITUNES_SEARCH_URL: &str = "https://itunes.apple.com/search";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    track_name: Option<String>,
    collection_name: Option<String>,
    artist_name: Option<String>,
}

pub struct ItunesSearch {
    client: reqwest::Client,
    endpoint: String,
}

impl ItunesSearch {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_endpoint(client, ITUNES_SEARCH_URL)
    }

    pub fn with_endpoint(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl SongSearch for ItunesSearch {
    async fn search(&self, query: &str, limit: usize) -> MusicResult<Vec<Suggestion>> {
        debug!("Searching iTunes for '{}'", query);
        let limit = limit.to_string();
        let request = self.client.get(&self.endpoint).query(&[
            ("term", query),
            ("media", "music"),
            ("entity", "song"),
            ("limit", limit.as_str()),
        ]);

        let response: SearchResponse = fetch_json(request, "iTunes").await?;

        Ok(response
            .results
            .into_iter()
            .filter_map(|item| {
                let title = item.track_name.or(item.collection_name);
                Suggestion::from_song(title.as_deref(), item.artist_name.as_deref())
            })
            .collect())
    }
}

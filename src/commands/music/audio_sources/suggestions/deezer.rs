//! Song search against the public Deezer API.

use serde::Deserialize;
use serenity::async_trait;
use tracing::debug;

use super::{SongSearch, Suggestion, fetch_json};
use crate::commands::music::utils::music_manager::MusicResult;

pub const DEEZER_SEARCH_URL: &str = "https://api.deezer.com/search";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<DeezerTrack>,
}

#[derive(Debug, Deserialize)]
struct DeezerTrack {
    title: Option<String>,
    artist: Option<DeezerArtist>,
}

#[derive(Debug, Deserialize)]
struct DeezerArtist {
    name: Option<String>,
}

pub struct DeezerSearch {
    client: reqwest::Client,
    endpoint: String,
}

impl DeezerSearch {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_endpoint(client, DEEZER_SEARCH_URL)
    }

    pub fn with_endpoint(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl SongSearch for DeezerSearch {
    async fn search(&self, query: &str, limit: usize) -> MusicResult<Vec<Suggestion>> {
        debug!("Searching Deezer for '{}'", query);
        let limit = limit.to_string();
        let request = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("limit", limit.as_str())]);

        let response: SearchResponse = fetch_json(request, "Deezer").await?;

        Ok(response
            .data
            .into_iter()
            .filter_map(|track| {
                let artist = track.artist.and_then(|a| a.name);
                Suggestion::from_song(track.title.as_deref(), artist.as_deref())
            })
            .collect())
    }
}

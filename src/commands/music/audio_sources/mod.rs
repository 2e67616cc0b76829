//! Turning free text or links into playable tracks.
//!
//! Everything here talks to the media extractor through the [`ExtractionBackend`]
//! trait, so resolution and suggestion logic can be exercised without spawning
//! the real `yt-dlp` binary.

/// Request-to-track resolution with profile and query-form fallbacks.
pub mod resolver;
/// Autocomplete suggestions backed by a song-search API and the extractor.
pub mod suggestions;
/// The `TrackDescriptor` produced by resolution.
pub mod track_descriptor;
/// `ExtractionBackend` implementation that shells out to `yt-dlp`.
pub mod ytdlp;

use regex::Regex;
use serde::Deserialize;
use serenity::async_trait;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

pub use resolver::TrackResolver;
pub use track_descriptor::TrackDescriptor;

/// A leading `scheme://` marks input as a link rather than search text.
static URL_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*://").expect("valid regex"));

/// Failures of a single extractor invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Failed to start extractor: {0}")]
    Spawn(String),

    #[error("Extractor timed out")]
    Timeout,

    #[error("Extractor failed: {0}")]
    Failed(String),

    #[error("Unreadable extractor output: {0}")]
    Malformed(String),
}

/// One extractor invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractRequest {
    /// A link, a search prefix such as `ytsearch1:…`, or bare text.
    pub target: String,
    /// Alternate client identity for the extractor, if any.
    pub profile: Option<String>,
    /// List collection entries without resolving each one.
    pub flat: bool,
    /// How the extractor should interpret a target that is not a link.
    pub default_search: Option<&'static str>,
    pub timeout: Duration,
}

impl ExtractRequest {
    pub fn new(target: impl Into<String>, timeout: Duration) -> Self {
        Self {
            target: target.into(),
            profile: None,
            flat: false,
            default_search: None,
            timeout,
        }
    }

    pub fn profile(mut self, profile: Option<&str>) -> Self {
        self.profile = profile.map(String::from);
        self
    }

    pub fn flat(mut self) -> Self {
        self.flat = true;
        self
    }

    pub fn default_search(mut self, mode: &'static str) -> Self {
        self.default_search = Some(mode);
        self
    }
}

/// The subset of the extractor's JSON document the bot reads.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ExtractedInfo {
    #[serde(default)]
    pub title: Option<String>,
    /// Direct media URL for single items; entry link for flat listings.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub http_headers: Option<BTreeMap<String, String>>,
    /// Present when the target was a playlist or a search.
    #[serde(default)]
    pub entries: Option<Vec<Option<ExtractedInfo>>>,
}

impl ExtractedInfo {
    /// Collapses a collection to its first entry. `None` for an empty collection.
    pub fn into_first_entry(self) -> Option<ExtractedInfo> {
        match self.entries {
            Some(entries) => entries.into_iter().flatten().next(),
            None => Some(self),
        }
    }

    /// All non-null entries of a collection, or the item itself.
    pub fn into_entries(self) -> Vec<ExtractedInfo> {
        match self.entries {
            Some(entries) => entries.into_iter().flatten().collect(),
            None => vec![self],
        }
    }
}

/// Anything able to run the media extractor.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    async fn extract(&self, request: &ExtractRequest) -> Result<ExtractedInfo, ExtractError>;
}

/// A utility struct providing general helper functions related to audio sources.
pub struct AudioSource;

impl AudioSource {
    /// True when the input starts with a URL scheme such as `https://`.
    pub fn is_url(input: &str) -> bool {
        URL_SCHEME.is_match(input)
    }
}

/// Treats empty strings from the extractor as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

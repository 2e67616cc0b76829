//! Defines `TrackDescriptor`, the fully resolved, playable form of a user's request.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder title for tracks whose extractor output carried none.
pub const UNKNOWN_TITLE: &str = "Unknown title";

/// A resolved track. Immutable once produced by the resolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackDescriptor {
    /// Display title.
    pub title: String,
    /// Direct media stream handed to the transcoder. Never empty.
    pub stream_uri: String,
    /// Cover art, if the extractor reported one.
    pub thumbnail_uri: Option<String>,
    /// Human-facing page the track came from.
    pub origin_page_uri: Option<String>,
    /// Headers the stream origin expects, always including a `User-Agent`.
    #[serde(default)]
    pub request_headers: BTreeMap<String, String>,
}

impl TrackDescriptor {
    pub fn new(title: impl Into<String>, stream_uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            stream_uri: stream_uri.into(),
            thumbnail_uri: None,
            origin_page_uri: None,
            request_headers: BTreeMap::new(),
        }
    }

    pub fn with_origin_page(mut self, page: impl Into<String>) -> Self {
        self.origin_page_uri = Some(page.into());
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail_uri = Some(thumbnail.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.insert(name.into(), value.into());
        self
    }

    /// Link shown to users: the origin page when known, the stream otherwise.
    pub fn display_link(&self) -> &str {
        self.origin_page_uri.as_deref().unwrap_or(&self.stream_uri)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request_headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

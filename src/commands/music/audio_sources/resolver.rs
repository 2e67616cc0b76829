//! Resolution of a `/play` query into a [`TrackDescriptor`].
//!
//! A link is handed to the extractor as-is. Free text is tried first as an
//! explicit single-result search and then as a bare query. Each form is tried
//! once per configured client profile, and the first attempt that yields a
//! stream wins.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{
    AudioSource, ExtractError, ExtractRequest, ExtractedInfo, ExtractionBackend, non_empty,
    track_descriptor::{TrackDescriptor, UNKNOWN_TITLE},
};
use crate::config::ResolverSettings;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("The query is empty")]
    EmptyQuery,

    #[error("No playable track found")]
    NotFound,

    #[error("Timed out while looking up the track")]
    Timeout,
}

/// One way of presenting the query to the extractor.
struct QueryForm {
    target: String,
    default_search: Option<&'static str>,
    timeout: Duration,
}

pub struct TrackResolver {
    backend: Arc<dyn ExtractionBackend>,
    settings: ResolverSettings,
    user_agent: String,
}

impl TrackResolver {
    pub fn new(
        backend: Arc<dyn ExtractionBackend>,
        settings: ResolverSettings,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            settings,
            user_agent: user_agent.into(),
        }
    }

    /// Resolves a link or search text to a playable track.
    pub async fn resolve(&self, query: &str) -> Result<TrackDescriptor, ResolutionError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ResolutionError::EmptyQuery);
        }

        let is_url = AudioSource::is_url(query);
        let forms = self.query_forms(query, is_url);
        let profiles = self.profiles();

        let mut attempts = 0usize;
        let mut timeouts = 0usize;

        for form in &forms {
            for profile in &profiles {
                attempts += 1;
                let request = ExtractRequest {
                    target: form.target.clone(),
                    profile: profile.map(String::from),
                    flat: false,
                    default_search: form.default_search,
                    timeout: form.timeout,
                };

                let info = match self.run(&request).await {
                    Ok(info) => info,
                    Err(ExtractError::Timeout) => {
                        timeouts += 1;
                        debug!("Extraction of '{}' timed out ({:?})", form.target, profile);
                        continue;
                    }
                    Err(e) => {
                        debug!("Extraction of '{}' failed ({:?}): {}", form.target, profile, e);
                        continue;
                    }
                };

                let Some(entry) = info.into_first_entry() else {
                    debug!("'{}' returned an empty collection", form.target);
                    continue;
                };

                if let Some(track) = self.complete(entry, query, is_url, *profile).await {
                    info!("Resolved '{}' to '{}'", query, track.title);
                    return Ok(track);
                }
            }
        }

        warn!("Could not resolve '{}' after {} attempts", query, attempts);
        if attempts > 0 && timeouts == attempts {
            Err(ResolutionError::Timeout)
        } else {
            Err(ResolutionError::NotFound)
        }
    }

    fn query_forms(&self, query: &str, is_url: bool) -> Vec<QueryForm> {
        if is_url {
            return vec![QueryForm {
                target: query.to_string(),
                default_search: Some("auto"),
                timeout: self.settings.url_timeout,
            }];
        }

        vec![
            QueryForm {
                target: format!("ytsearch1:{query}"),
                default_search: None,
                timeout: self.settings.search_timeout,
            },
            QueryForm {
                target: query.to_string(),
                default_search: Some("ytsearch"),
                timeout: self.settings.plain_timeout,
            },
        ]
    }

    /// Configured profiles, or a single attempt with the extractor's default client.
    fn profiles(&self) -> Vec<Option<&str>> {
        if self.settings.client_profiles.is_empty() {
            vec![None]
        } else {
            self.settings
                .client_profiles
                .iter()
                .map(|p| Some(p.as_str()))
                .collect()
        }
    }

    /// Bounds every call, even if the backend ignores the request timeout.
    async fn run(&self, request: &ExtractRequest) -> Result<ExtractedInfo, ExtractError> {
        match tokio::time::timeout(request.timeout, self.backend.extract(request)).await {
            Ok(result) => result,
            Err(_) => Err(ExtractError::Timeout),
        }
    }

    /// Turns an entry into a descriptor, chasing the page once if no stream was listed.
    async fn complete(
        &self,
        entry: ExtractedInfo,
        query: &str,
        is_url: bool,
        profile: Option<&str>,
    ) -> Option<TrackDescriptor> {
        let mut stream = non_empty(entry.url);
        let mut title = non_empty(entry.title);
        let mut thumbnail = non_empty(entry.thumbnail);
        let mut headers = entry.http_headers.unwrap_or_default();
        let page = non_empty(entry.webpage_url).or_else(|| is_url.then(|| query.to_string()));

        if stream.is_none() {
            let page = page.as_ref()?;
            let request = ExtractRequest::new(page.clone(), self.settings.follow_up_timeout)
                .profile(profile)
                .default_search("auto");

            match self.run(&request).await.map(ExtractedInfo::into_first_entry) {
                Ok(Some(detail)) => {
                    if let Some(url) = non_empty(detail.url) {
                        stream = Some(url);
                        if let Some(detail_headers) = detail.http_headers {
                            headers = detail_headers;
                        }
                    }
                    title = non_empty(detail.title).or(title);
                    thumbnail = non_empty(detail.thumbnail).or(thumbnail);
                }
                Ok(None) => debug!("Follow-up for '{}' was empty", page),
                Err(e) => debug!("Follow-up for '{}' failed: {}", page, e),
            }
        }

        let stream = stream?;
        if !headers.keys().any(|k| k.eq_ignore_ascii_case("user-agent")) {
            headers.insert("User-Agent".to_string(), self.user_agent.clone());
        }

        Some(TrackDescriptor {
            title: title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            stream_uri: stream,
            thumbnail_uri: thumbnail,
            origin_page_uri: page,
            request_headers: headers,
        })
    }
}

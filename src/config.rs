//! Process configuration, read once from the environment at startup.

use std::env;
use std::time::Duration;
use thiserror::Error;

/// Desktop browser user agent presented to stream origins unless the extractor supplies one.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124 Safari/537.36";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Which external song-search API backs `/play` autocompletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchProvider {
    #[default]
    Itunes,
    Deezer,
}

impl std::str::FromStr for SearchProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "itunes" => Ok(Self::Itunes),
            "deezer" => Ok(Self::Deezer),
            other => Err(ConfigError::Invalid {
                name: "SONG_SEARCH_PROVIDER",
                value: other.to_string(),
            }),
        }
    }
}

/// Timing and limits for per-guild playback sessions.
#[derive(Debug, Clone)]
pub struct PlaybackSettings {
    /// How long an emptied session waits for new tracks before tearing down.
    pub grace_period: Duration,
    /// Consecutive unplayable tracks tolerated before the session gives up and drains.
    pub max_consecutive_failures: usize,
    /// Upcoming tracks listed on the control panel.
    pub panel_preview_len: usize,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(8),
            max_consecutive_failures: 3,
            panel_preview_len: 10,
        }
    }
}

/// Timeouts and extractor profiles used by the track resolver.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub url_timeout: Duration,
    pub search_timeout: Duration,
    pub plain_timeout: Duration,
    pub follow_up_timeout: Duration,
    /// Alternate extractor client profiles, tried in order.
    pub client_profiles: Vec<String>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            url_timeout: Duration::from_secs(14),
            search_timeout: Duration::from_secs(10),
            plain_timeout: Duration::from_secs(12),
            follow_up_timeout: Duration::from_secs(14),
            client_profiles: vec![
                "android".to_string(),
                "android_music".to_string(),
                "web_safari".to_string(),
            ],
        }
    }
}

/// Limits for autocompletion lookups and their cache.
#[derive(Debug, Clone)]
pub struct SuggestionSettings {
    pub min_query_len: usize,
    pub max_results: usize,
    pub api_timeout: Duration,
    pub fallback_timeout: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
}

impl Default for SuggestionSettings {
    fn default() -> Self {
        Self {
            min_query_len: 2,
            max_results: 10,
            api_timeout: Duration::from_millis(1500),
            fallback_timeout: Duration::from_secs(7),
            cache_ttl: Duration::from_secs(120),
            cache_capacity: 512,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub ffmpeg_path: String,
    pub ytdlp_path: String,
    pub stream_user_agent: String,
    pub search_provider: SearchProvider,
    pub playback: PlaybackSettings,
    pub resolver: ResolverSettings,
    pub suggestions: SuggestionSettings,
}

impl Config {
    /// Builds the configuration from environment variables (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let discord_token = get("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        let search_provider = match get("SONG_SEARCH_PROVIDER") {
            Some(value) => value.parse()?,
            None => SearchProvider::default(),
        };

        let mut resolver = ResolverSettings::default();
        if let Some(profiles) = get("YTDLP_CLIENT_PROFILES") {
            let profiles: Vec<String> = profiles
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
            if profiles.is_empty() {
                return Err(ConfigError::Invalid {
                    name: "YTDLP_CLIENT_PROFILES",
                    value: String::new(),
                });
            }
            resolver.client_profiles = profiles;
        }

        Ok(Self {
            discord_token,
            ffmpeg_path: get("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string()),
            ytdlp_path: get("YTDLP_PATH").unwrap_or_else(|| "yt-dlp".to_string()),
            stream_user_agent: get("STREAM_USER_AGENT")
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            search_provider,
            playback: PlaybackSettings::default(),
            resolver,
            suggestions: SuggestionSettings::default(),
        })
    }
}

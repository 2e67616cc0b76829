//! Music bot core: per-guild playback sessions, track resolution and the
//! interactive control panel, wired into Discord through poise and songbird.

pub mod commands;
pub mod config;
#[cfg(feature = "music")]
pub mod events;

use std::sync::Arc;

pub use config::Config;

#[cfg(feature = "music")]
use commands::music::{
    audio_sources::{TrackResolver, suggestions::SuggestionService},
    utils::music_manager::SessionRegistry,
};

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// User data, which is stored and accessible in all command invocations
pub struct Data {
    pub config: Arc<Config>,
    #[cfg(feature = "music")]
    pub registry: Arc<SessionRegistry>,
    #[cfg(feature = "music")]
    pub resolver: Arc<TrackResolver>,
    #[cfg(feature = "music")]
    pub suggestions: Arc<SuggestionService>,
}

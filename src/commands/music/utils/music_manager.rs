use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use poise::serenity_prelude as serenity;
use serenity::client::Context;
use serenity::model::id::{ChannelId, GuildId};
use serenity::prelude::Mutex as SerenityMutex;
use songbird::{Call, Songbird};
use std::sync::{Arc, Weak};
use thiserror::Error;
use tracing::{debug, error, info};

use super::playback_session::{
    EnqueueOutcome, PanelChannel, PlaybackSession, PlayerStatus, VoiceLink,
};
use crate::commands::music::audio_sources::{
    resolver::ResolutionError, track_descriptor::TrackDescriptor,
};
use crate::config::PlaybackSettings;

/// Errors that can occur during music operations
#[derive(Error, Debug)]
pub enum MusicError {
    #[error("Not in a guild")]
    NotInGuild,

    #[error("Failed to join voice channel: {0}")]
    JoinError(String),

    #[error("Failed to get voice manager")]
    NoVoiceManager,

    #[error("User is not in a voice channel")]
    UserNotInVoiceChannel,

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("Failed to start the audio transcoder: {0}")]
    TranscoderError(String),

    #[error("Playback error: {0}")]
    PlaybackError(String),

    #[error("Nothing is playing right now")]
    NothingPlaying,

    #[error("Cannot {action} while the player is {status}")]
    InvalidState {
        action: &'static str,
        status: PlayerStatus,
    },

    #[error("There is no track #{index} in the queue ({len} queued)")]
    QueueIndexOutOfRange { index: usize, len: usize },

    #[error("The player for this server has shut down")]
    SessionClosed,

    #[error("Missing permissions: {0}")]
    PermissionDenied(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

/// Live playback sessions, at most one per guild.
pub struct SessionRegistry {
    sessions: DashMap<GuildId, Arc<PlaybackSession>>,
    settings: PlaybackSettings,
    self_ref: Weak<SessionRegistry>,
}

impl SessionRegistry {
    pub fn new(settings: PlaybackSettings) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            sessions: DashMap::new(),
            settings,
            self_ref: self_ref.clone(),
        })
    }

    pub fn get(&self, guild_id: GuildId) -> Option<Arc<PlaybackSession>> {
        self.sessions.get(&guild_id).map(|entry| entry.value().clone())
    }

    /// Returns the guild's session, creating it if needed. An existing session
    /// is pointed at the given voice link and panel channel.
    pub async fn get_or_create(
        &self,
        guild_id: GuildId,
        voice: Arc<dyn VoiceLink>,
        panel: Arc<dyn PanelChannel>,
    ) -> Arc<PlaybackSession> {
        let session = match self.sessions.entry(guild_id) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                info!("Creating playback session for guild {}", guild_id);
                let session = PlaybackSession::new(
                    guild_id,
                    voice.clone(),
                    panel.clone(),
                    self.settings.clone(),
                    self.self_ref.clone(),
                );
                entry.insert(session.clone());
                return session;
            }
        };

        session.rebind(voice, panel).await;
        session
    }

    /// Forgets the guild's session. Idempotent.
    pub fn remove(&self, guild_id: GuildId) -> Option<Arc<PlaybackSession>> {
        self.sessions.remove(&guild_id).map(|(_, session)| session)
    }

    /// Forgets `session` only if it is still the one registered for the guild.
    pub(crate) fn remove_session(&self, guild_id: GuildId, session: &PlaybackSession) {
        self.sessions
            .remove_if(&guild_id, |_, current| std::ptr::eq(Arc::as_ptr(current), session));
    }

    /// Queues a track on the guild's session, replacing a session that shut
    /// down between lookup and enqueue.
    pub async fn enqueue(
        &self,
        guild_id: GuildId,
        voice: Arc<dyn VoiceLink>,
        panel: Arc<dyn PanelChannel>,
        track: TrackDescriptor,
    ) -> MusicResult<EnqueueOutcome> {
        for _ in 0..2 {
            let session = self
                .get_or_create(guild_id, voice.clone(), panel.clone())
                .await;
            match session.enqueue(track.clone()).await {
                Err(MusicError::SessionClosed) => self.remove_session(guild_id, &session),
                other => return other,
            }
        }
        Err(MusicError::SessionClosed)
    }

    /// Hard-stops the guild's session, if any. Returns whether one existed.
    pub async fn stop(&self, guild_id: GuildId) -> bool {
        match self.get(guild_id) {
            Some(session) => {
                session.stop().await;
                self.remove_session(guild_id, &session);
                true
            }
            None => false,
        }
    }

    /// Leaves voice on behalf of a request that never produced a session,
    /// e.g. a `/play` whose query could not be resolved.
    pub async fn release_if_unused(&self, guild_id: GuildId, voice: &dyn VoiceLink) -> bool {
        if self.sessions.contains_key(&guild_id) {
            return false;
        }
        debug!("No session in guild {}, leaving voice", guild_id);
        voice.release().await;
        true
    }

    /// Stops the guild's session after the bot was disconnected from voice,
    /// unless the guild's call is connected again by the time this runs.
    pub async fn voice_lost(&self, manager: &Songbird, guild_id: GuildId) -> bool {
        if let Some(call) = manager.get(guild_id) {
            if call.lock().await.current_channel().is_some() {
                debug!("Stale voice disconnect in guild {}, call is live", guild_id);
                return false;
            }
        }
        self.stop(guild_id).await
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Get the Songbird voice client from the context
pub async fn get_songbird(ctx: &Context) -> MusicResult<Arc<Songbird>> {
    songbird::get(ctx).await.ok_or(MusicError::NoVoiceManager)
}

/// Join a voice channel, or move to it if already connected elsewhere in the guild
pub async fn join_channel(
    manager: &Songbird,
    guild_id: GuildId,
    channel_id: ChannelId,
) -> MusicResult<Arc<SerenityMutex<Call>>> {
    manager.join(guild_id, channel_id).await.map_err(|e| {
        error!(
            "Failed to join voice channel {} for guild {}: {}",
            channel_id, guild_id, e
        );
        MusicError::JoinError(e.to_string())
    })
}

/// Get the voice channel ID that the user is currently in
pub fn get_user_voice_channel(
    ctx: &Context,
    guild_id: GuildId,
    user_id: serenity::UserId,
) -> MusicResult<ChannelId> {
    let guild = ctx.cache.guild(guild_id).ok_or(MusicError::NotInGuild)?;

    let voice_state = guild
        .voice_states
        .get(&user_id)
        .ok_or(MusicError::UserNotInVoiceChannel)?;

    voice_state
        .channel_id
        .ok_or(MusicError::UserNotInVoiceChannel)
}

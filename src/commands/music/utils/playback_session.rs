//! Per-guild playback state machine.
//!
//! A session owns the track queue, the currently playing track and the handle
//! to its audio output. Every mutation goes through one async mutex, so user
//! commands, panel buttons and track-end notifications are applied one at a
//! time. Each started track gets a generation number; an end notification
//! carrying an old generation is ignored, which is what keeps a skip racing a
//! natural end from advancing the queue twice.

use poise::serenity_prelude as serenity;
use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId, MessageId};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::control_panel::PlayerPanel;
use super::music_manager::{MusicError, MusicResult, SessionRegistry};
use crate::Error;
use crate::commands::music::audio_sources::track_descriptor::TrackDescriptor;
use crate::config::PlaybackSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    /// Created, nothing started yet.
    Idle,
    Playing,
    Paused,
    /// Queue ran dry; waiting out the grace period.
    Draining,
    Terminated,
}

impl PlayerStatus {
    /// A track is loaded on the output.
    pub fn has_track(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Draining => "waiting for tracks",
            Self::Terminated => "stopped",
        })
    }
}

/// Output gain from 0.0 to 2.0 in steps of 0.1, kept as an integer count of steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Volume(u8);

impl Volume {
    const MAX_STEPS: u8 = 20;
    pub const MIN: Volume = Volume(0);
    pub const MAX: Volume = Volume(Self::MAX_STEPS);

    /// Nearest step to a percentage, clamped to 0..=200.
    pub fn from_percent(percent: u32) -> Self {
        let steps = (percent.min(200) + 5) / 10;
        Volume(steps.min(Self::MAX_STEPS as u32) as u8)
    }

    pub fn step_up(self) -> Self {
        Volume((self.0 + 1).min(Self::MAX_STEPS))
    }

    pub fn step_down(self) -> Self {
        Volume(self.0.saturating_sub(1))
    }

    pub fn gain(self) -> f32 {
        f32::from(self.0) / 10.0
    }

    pub fn percent(self) -> u32 {
        u32::from(self.0) * 10
    }
}

impl Default for Volume {
    fn default() -> Self {
        Volume(5)
    }
}

/// How a started track's output came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEnd {
    Finished,
    Errored,
}

/// Live control over one started track.
pub trait TrackControl: Send + Sync {
    fn pause(&self) -> MusicResult<()>;
    fn resume(&self) -> MusicResult<()>;
    fn set_volume(&self, volume: Volume) -> MusicResult<()>;
    /// Terminates the output and its transcoder.
    fn stop(&self) -> MusicResult<()>;
}

/// The guild's voice connection as seen by a session.
#[async_trait]
pub trait VoiceLink: Send + Sync {
    /// Starts `track` and arranges for `on_end` to fire when its output ends.
    async fn start(
        &self,
        track: &TrackDescriptor,
        volume: Volume,
        on_end: TrackEndSignal,
    ) -> MusicResult<Box<dyn TrackControl>>;

    /// Leaves the voice channel.
    async fn release(&self);
}

/// The text channel hosting the session's control panel.
#[async_trait]
pub trait PanelChannel: Send + Sync {
    fn channel_id(&self) -> ChannelId;
    async fn send_panel(&self, panel: &PlayerPanel) -> Result<MessageId, Error>;
    async fn edit_panel(&self, message_id: MessageId, panel: &PlayerPanel) -> Result<(), Error>;
    async fn delete_panel(&self, message_id: MessageId) -> Result<(), Error>;
    async fn send_notice(&self, text: &str) -> Result<(), Error>;
}

struct SignalSlot {
    session: Weak<PlaybackSession>,
    generation: u64,
    fired: AtomicBool,
}

/// Completion notice for one started track. Only the first `fire` counts.
#[derive(Clone)]
pub struct TrackEndSignal {
    slot: Arc<SignalSlot>,
}

impl TrackEndSignal {
    fn new(session: Weak<PlaybackSession>, generation: u64) -> Self {
        Self {
            slot: Arc::new(SignalSlot {
                session,
                generation,
                fired: AtomicBool::new(false),
            }),
        }
    }

    pub fn generation(&self) -> u64 {
        self.slot.generation
    }

    /// Reports the end of the track to its session on a separate task.
    pub fn fire(&self, end: TrackEnd) {
        if self.slot.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some(session) = self.slot.session.upgrade() else {
            return;
        };
        let generation = self.slot.generation;
        tokio::spawn(async move {
            session.track_ended(generation, end).await;
        });
    }
}

/// What `enqueue` did with the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Playback started (with this track or one queued before it).
    Started,
    /// Appended behind the current track at this 1-based queue position.
    Queued { position: usize },
}

/// Point-in-time copy of a session's visible state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub status: PlayerStatus,
    pub current: Option<TrackDescriptor>,
    pub upcoming: Vec<TrackDescriptor>,
    pub volume: Volume,
}

struct SessionState {
    status: PlayerStatus,
    queue: VecDeque<TrackDescriptor>,
    current: Option<TrackDescriptor>,
    volume: Volume,
    voice: Arc<dyn VoiceLink>,
    panel: Arc<dyn PanelChannel>,
    panel_message: Option<MessageId>,
    output: Option<Box<dyn TrackControl>>,
    generation: u64,
    drain_task: Option<JoinHandle<()>>,
    consecutive_failures: usize,
}

pub struct PlaybackSession {
    guild_id: GuildId,
    settings: PlaybackSettings,
    registry: Weak<SessionRegistry>,
    self_ref: Weak<PlaybackSession>,
    /// Generation of the last settled transition, readable without the lock.
    settled_generation: AtomicU64,
    state: Mutex<SessionState>,
}

impl PlaybackSession {
    pub fn new(
        guild_id: GuildId,
        voice: Arc<dyn VoiceLink>,
        panel: Arc<dyn PanelChannel>,
        settings: PlaybackSettings,
        registry: Weak<SessionRegistry>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            guild_id,
            settings,
            registry,
            self_ref: self_ref.clone(),
            settled_generation: AtomicU64::new(0),
            state: Mutex::new(SessionState {
                status: PlayerStatus::Idle,
                queue: VecDeque::new(),
                current: None,
                volume: Volume::default(),
                voice,
                panel,
                panel_message: None,
                output: None,
                generation: 0,
                drain_task: None,
                consecutive_failures: 0,
            }),
        })
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub async fn status(&self) -> PlayerStatus {
        self.state.lock().await.status
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        SessionSnapshot {
            status: state.status,
            current: state.current.clone(),
            upcoming: state.queue.iter().cloned().collect(),
            volume: state.volume,
        }
    }

    /// Appends a track, starting playback if nothing is loaded.
    pub async fn enqueue(&self, track: TrackDescriptor) -> MusicResult<EnqueueOutcome> {
        let mut state = self.state.lock().await;

        match state.status {
            PlayerStatus::Terminated => Err(MusicError::SessionClosed),
            PlayerStatus::Playing | PlayerStatus::Paused => {
                debug!("Queued '{}' in guild {}", track.title, self.guild_id);
                state.queue.push_back(track);
                let position = state.queue.len();
                self.refresh_panel(&mut state).await;
                Ok(EnqueueOutcome::Queued { position })
            }
            PlayerStatus::Idle | PlayerStatus::Draining => {
                if let Some(task) = state.drain_task.take() {
                    debug!("New track for guild {}, cancelling drain", self.guild_id);
                    task.abort();
                }
                state.queue.push_back(track);
                state.consecutive_failures = 0;
                match self.advance(&mut state).await {
                    None => Ok(EnqueueOutcome::Started),
                    Some(err) => Err(err),
                }
            }
        }
    }

    /// Ends the current track and moves to the next one.
    pub async fn skip(&self) -> MusicResult<()> {
        let observed = self.settled_generation.load(Ordering::SeqCst);
        let mut state = self.state.lock().await;

        if !state.status.has_track() {
            return Err(MusicError::NothingPlaying);
        }
        if state.generation != observed {
            debug!("Track in guild {} already moved on, skip ignored", self.guild_id);
            return Ok(());
        }

        info!("Skipping current track in guild {}", self.guild_id);
        state.generation += 1;
        if let Some(output) = state.output.take() {
            if let Err(e) = output.stop() {
                warn!("Failed to stop output in guild {}: {}", self.guild_id, e);
            }
        }
        self.advance(&mut state).await;
        Ok(())
    }

    pub async fn pause(&self) -> MusicResult<()> {
        let mut state = self.state.lock().await;
        self.pause_locked(&mut state).await
    }

    pub async fn resume(&self) -> MusicResult<()> {
        let mut state = self.state.lock().await;
        self.resume_locked(&mut state).await
    }

    /// Pauses a playing track or resumes a paused one. Returns the new status.
    pub async fn toggle_pause(&self) -> MusicResult<PlayerStatus> {
        let mut state = self.state.lock().await;
        match state.status {
            PlayerStatus::Playing => self.pause_locked(&mut state).await?,
            PlayerStatus::Paused => self.resume_locked(&mut state).await?,
            _ => return Err(MusicError::NothingPlaying),
        }
        Ok(state.status)
    }

    async fn pause_locked(&self, state: &mut SessionState) -> MusicResult<()> {
        if state.status != PlayerStatus::Playing {
            return Err(MusicError::InvalidState {
                action: "pause",
                status: state.status,
            });
        }
        if let Some(output) = &state.output {
            output.pause()?;
        }
        state.status = PlayerStatus::Paused;
        self.refresh_panel(state).await;
        Ok(())
    }

    async fn resume_locked(&self, state: &mut SessionState) -> MusicResult<()> {
        if state.status != PlayerStatus::Paused {
            return Err(MusicError::InvalidState {
                action: "resume",
                status: state.status,
            });
        }
        if let Some(output) = &state.output {
            output.resume()?;
        }
        state.status = PlayerStatus::Playing;
        self.refresh_panel(state).await;
        Ok(())
    }

    pub async fn set_volume(&self, volume: Volume) -> MusicResult<Volume> {
        self.adjust_volume(|_| volume).await
    }

    pub async fn volume_up(&self) -> MusicResult<Volume> {
        self.adjust_volume(Volume::step_up).await
    }

    pub async fn volume_down(&self) -> MusicResult<Volume> {
        self.adjust_volume(Volume::step_down).await
    }

    async fn adjust_volume(&self, change: impl FnOnce(Volume) -> Volume) -> MusicResult<Volume> {
        let mut state = self.state.lock().await;
        if state.status == PlayerStatus::Terminated {
            return Err(MusicError::SessionClosed);
        }

        state.volume = change(state.volume);
        if let Some(output) = &state.output {
            if let Err(e) = output.set_volume(state.volume) {
                warn!("Failed to apply volume in guild {}: {}", self.guild_id, e);
            }
        }
        self.refresh_panel(&mut state).await;
        Ok(state.volume)
    }

    /// Removes the queued track at a 1-based position.
    pub async fn remove(&self, position: usize) -> MusicResult<TrackDescriptor> {
        let mut state = self.state.lock().await;
        let len = state.queue.len();
        let track = position
            .checked_sub(1)
            .and_then(|index| state.queue.remove(index))
            .ok_or(MusicError::QueueIndexOutOfRange {
                index: position,
                len,
            })?;

        self.refresh_panel(&mut state).await;
        Ok(track)
    }

    /// Re-renders the control panel.
    pub async fn refresh(&self) {
        let mut state = self.state.lock().await;
        if state.status != PlayerStatus::Terminated {
            self.refresh_panel(&mut state).await;
        }
    }

    /// Points the session at a (possibly new) voice link and panel channel.
    /// A panel left in a different channel is deleted.
    pub async fn rebind(&self, voice: Arc<dyn VoiceLink>, panel: Arc<dyn PanelChannel>) {
        let mut state = self.state.lock().await;
        if state.panel.channel_id() != panel.channel_id() {
            if let Some(message_id) = state.panel_message.take() {
                if let Err(e) = state.panel.delete_panel(message_id).await {
                    debug!("Could not retire old panel in guild {}: {}", self.guild_id, e);
                }
            }
        }
        state.voice = voice;
        state.panel = panel;
    }

    /// Immediate teardown from any state.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        if state.status == PlayerStatus::Terminated {
            return;
        }
        if let Some(task) = state.drain_task.take() {
            task.abort();
        }
        info!("Stopping playback session for guild {}", self.guild_id);
        self.teardown(&mut state).await;
    }

    /// Completion callback for the track started under `generation`.
    pub async fn track_ended(&self, generation: u64, end: TrackEnd) {
        let mut state = self.state.lock().await;
        if state.generation != generation || !state.status.has_track() {
            debug!(
                "Ignoring stale track end in guild {} ({} != {})",
                self.guild_id, generation, state.generation
            );
            return;
        }

        match end {
            TrackEnd::Finished => state.consecutive_failures = 0,
            TrackEnd::Errored => {
                state.consecutive_failures += 1;
                warn!(
                    "Track ended with an error in guild {} ({} in a row)",
                    self.guild_id, state.consecutive_failures
                );
            }
        }
        state.output = None;
        self.advance(&mut state).await;
    }

    /// Starts the next playable track, or begins draining when none is left.
    /// Returns the last start failure if nothing could be started.
    async fn advance(&self, state: &mut SessionState) -> Option<MusicError> {
        state.output = None;
        state.current = None;
        let mut last_error = None;

        loop {
            if state.consecutive_failures >= self.settings.max_consecutive_failures
                && !state.queue.is_empty()
            {
                let dropped = state.queue.len();
                state.queue.clear();
                warn!(
                    "Giving up on {} queued tracks in guild {} after repeated failures",
                    dropped, self.guild_id
                );
                let notice = format!(
                    "⚠️ Several tracks in a row failed to play, so the remaining {dropped} were cleared."
                );
                if let Err(e) = state.panel.send_notice(&notice).await {
                    debug!("Could not post failure notice: {}", e);
                }
                break;
            }

            let Some(track) = state.queue.pop_front() else {
                break;
            };

            state.generation += 1;
            let signal = TrackEndSignal::new(self.self_ref.clone(), state.generation);

            match state.voice.start(&track, state.volume, signal).await {
                Ok(output) => {
                    info!("Now playing '{}' in guild {}", track.title, self.guild_id);
                    state.consecutive_failures = 0;
                    state.current = Some(track);
                    state.output = Some(output);
                    state.status = PlayerStatus::Playing;
                    self.refresh_panel(state).await;
                    self.settle(state);
                    return None;
                }
                Err(e) => {
                    state.consecutive_failures += 1;
                    warn!(
                        "Could not start '{}' in guild {}: {}",
                        track.title, self.guild_id, e
                    );
                    last_error = Some(e);
                }
            }
        }

        self.begin_drain(state).await;
        Some(last_error.unwrap_or(MusicError::NothingPlaying))
    }

    async fn begin_drain(&self, state: &mut SessionState) {
        state.status = PlayerStatus::Draining;
        state.generation += 1;
        let generation = state.generation;

        if let Some(task) = state.drain_task.take() {
            task.abort();
        }

        let session = self.self_ref.clone();
        let grace = self.settings.grace_period;
        debug!(
            "Queue empty in guild {}, leaving in {:?} unless more tracks arrive",
            self.guild_id, grace
        );
        state.drain_task = Some(tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if let Some(session) = session.upgrade() {
                session.finish_drain(generation).await;
            }
        }));

        self.refresh_panel(state).await;
        self.settle(state);
    }

    async fn finish_drain(&self, generation: u64) {
        let mut state = self.state.lock().await;
        if state.status != PlayerStatus::Draining || state.generation != generation {
            return;
        }
        // Running inside the drain task itself; drop the handle, don't abort it.
        state.drain_task = None;
        info!("Grace period over, leaving voice in guild {}", self.guild_id);
        self.teardown(&mut state).await;
    }

    async fn teardown(&self, state: &mut SessionState) {
        state.generation += 1;
        state.status = PlayerStatus::Terminated;
        state.queue.clear();
        state.current = None;

        if let Some(output) = state.output.take() {
            if let Err(e) = output.stop() {
                debug!("Output already gone in guild {}: {}", self.guild_id, e);
            }
        }
        state.voice.release().await;

        if let Some(message_id) = state.panel_message.take() {
            if let Err(e) = state.panel.delete_panel(message_id).await {
                debug!("Could not delete panel in guild {}: {}", self.guild_id, e);
            }
        }

        self.settle(state);
        if let Some(registry) = self.registry.upgrade() {
            registry.remove_session(self.guild_id, self);
        }
    }

    fn settle(&self, state: &SessionState) {
        self.settled_generation
            .store(state.generation, Ordering::SeqCst);
    }

    /// Edits the panel in place, or posts a new one if that fails.
    async fn refresh_panel(&self, state: &mut SessionState) {
        let panel = PlayerPanel::new(
            state.status,
            state.current.as_ref(),
            state.queue.iter(),
            state.volume,
            self.settings.panel_preview_len,
        );

        if let Some(message_id) = state.panel_message {
            match state.panel.edit_panel(message_id, &panel).await {
                Ok(()) => return,
                Err(e) => debug!(
                    "Panel edit failed in guild {}, sending a new one: {}",
                    self.guild_id, e
                ),
            }
        }

        match state.panel.send_panel(&panel).await {
            Ok(message_id) => state.panel_message = Some(message_id),
            Err(e) => {
                warn!("Failed to send player panel in guild {}: {}", self.guild_id, e);
                state.panel_message = None;
            }
        }
    }
}

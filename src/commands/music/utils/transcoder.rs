//! The ffmpeg transcoder and the songbird-backed `VoiceLink`.
//!
//! Each track gets its own ffmpeg child that pulls the remote stream and
//! writes 48 kHz stereo PCM as WAV to stdout, which songbird reads as a live
//! input. Dropping the input kills the child.

use poise::serenity_prelude as serenity;
use serenity::async_trait;
use serenity::model::id::GuildId;
use serenity::prelude::Mutex as SerenityMutex;
use songbird::input::{ChildContainer, Input};
use songbird::tracks::TrackHandle;
use songbird::{Call, Event, Songbird, TrackEvent};
use std::collections::BTreeMap;
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::event_handlers::SongEndNotifier;
use super::music_manager::{MusicError, MusicResult};
use super::playback_session::{TrackControl, TrackEndSignal, VoiceLink, Volume};
use crate::commands::music::audio_sources::track_descriptor::TrackDescriptor;
use crate::config::Config;

#[derive(Debug, Clone)]
pub struct TranscoderConfig {
    pub program: String,
    pub user_agent: String,
}

impl From<&Config> for TranscoderConfig {
    fn from(config: &Config) -> Self {
        Self {
            program: config.ffmpeg_path.clone(),
            user_agent: config.stream_user_agent.clone(),
        }
    }
}

/// The `-headers` value: one `Name: value\r\n` line per non-empty header.
pub fn header_block(headers: &BTreeMap<String, String>, user_agent: &str) -> String {
    let mut headers = headers.clone();
    if !headers.keys().any(|k| k.eq_ignore_ascii_case("user-agent")) {
        headers.insert("User-Agent".to_string(), user_agent.to_string());
    }
    if !headers.keys().any(|k| k.eq_ignore_ascii_case("accept")) {
        headers.insert("Accept".to_string(), "*/*".to_string());
    }

    headers
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| format!("{name}: {value}\r\n"))
        .collect()
}

/// Full ffmpeg argument list for one track.
pub fn transcoder_args(track: &TrackDescriptor, user_agent: &str) -> Vec<String> {
    let input_options = [
        "-nostdin",
        "-reconnect",
        "1",
        "-reconnect_streamed",
        "1",
        "-reconnect_on_network_error",
        "1",
        "-reconnect_at_eof",
        "1",
        "-reconnect_delay_max",
        "5",
    ];
    let tuning = [
        "-protocol_whitelist",
        "file,crypto,http,https,tcp,tls",
        // Microseconds.
        "-rw_timeout",
        "20000000",
        "-fflags",
        "+nobuffer",
        "-flags",
        "low_delay",
        "-probesize",
        "64k",
        "-analyzeduration",
        "0",
    ];
    let output_options = [
        "-vn",
        "-sn",
        "-ar",
        "48000",
        "-ac",
        "2",
        "-loglevel",
        "error",
        "-c:a",
        "pcm_s16le",
        "-f",
        "wav",
        "pipe:1",
    ];

    let mut args: Vec<String> = input_options.iter().map(|s| s.to_string()).collect();
    args.push("-headers".to_string());
    args.push(header_block(&track.request_headers, user_agent));
    args.extend(tuning.iter().map(|s| s.to_string()));
    args.push("-i".to_string());
    args.push(track.stream_uri.clone());
    args.extend(output_options.iter().map(|s| s.to_string()));
    args
}

pub fn spawn_transcoder(
    config: &TranscoderConfig,
    track: &TrackDescriptor,
) -> MusicResult<std::process::Child> {
    Command::new(&config.program)
        .args(transcoder_args(track, &config.user_agent))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| MusicError::TranscoderError(e.to_string()))
}

fn control_error(e: songbird::error::ControlError) -> MusicError {
    MusicError::PlaybackError(e.to_string())
}

/// `TrackControl` over a songbird track handle.
pub struct SongbirdTrack(TrackHandle);

impl TrackControl for SongbirdTrack {
    fn pause(&self) -> MusicResult<()> {
        self.0.pause().map_err(control_error)
    }

    fn resume(&self) -> MusicResult<()> {
        self.0.play().map_err(control_error)
    }

    fn set_volume(&self, volume: Volume) -> MusicResult<()> {
        self.0.set_volume(volume.gain()).map_err(control_error)
    }

    fn stop(&self) -> MusicResult<()> {
        match self.0.stop() {
            Ok(()) | Err(songbird::error::ControlError::Finished) => Ok(()),
            Err(e) => Err(control_error(e)),
        }
    }
}

/// A guild's songbird call, playing tracks through ffmpeg.
pub struct SongbirdLink {
    manager: Arc<Songbird>,
    guild_id: GuildId,
    call: Arc<SerenityMutex<Call>>,
    transcoder: TranscoderConfig,
}

impl SongbirdLink {
    pub fn new(
        manager: Arc<Songbird>,
        guild_id: GuildId,
        call: Arc<SerenityMutex<Call>>,
        transcoder: TranscoderConfig,
    ) -> Self {
        Self {
            manager,
            guild_id,
            call,
            transcoder,
        }
    }
}

#[async_trait]
impl VoiceLink for SongbirdLink {
    async fn start(
        &self,
        track: &TrackDescriptor,
        volume: Volume,
        on_end: TrackEndSignal,
    ) -> MusicResult<Box<dyn TrackControl>> {
        debug!("Spawning {} for '{}'", self.transcoder.program, track.title);
        let child = spawn_transcoder(&self.transcoder, track)?;
        let input: Input = ChildContainer::from(child).into();

        let handle = {
            let mut call = self.call.lock().await;
            call.play_input(input)
        };

        if let Err(e) = handle.set_volume(volume.gain()) {
            warn!("Failed to set initial volume in guild {}: {}", self.guild_id, e);
        }

        for event in [TrackEvent::End, TrackEvent::Error] {
            if let Err(e) = handle.add_event(Event::Track(event), SongEndNotifier::new(on_end.clone())) {
                let _ = handle.stop();
                return Err(control_error(e));
            }
        }

        Ok(Box::new(SongbirdTrack(handle)))
    }

    async fn release(&self) {
        match self.manager.remove(self.guild_id).await {
            Ok(()) => info!("Left voice channel in guild {}", self.guild_id),
            Err(e) => debug!("Voice already released in guild {}: {}", self.guild_id, e),
        }
    }
}

use poise::serenity_prelude as serenity;
use serenity::async_trait;
use songbird::tracks::PlayMode;
use tracing::debug;

use super::playback_session::{TrackEnd, TrackEndSignal};

/// Event handler for when a song ends
pub struct SongEndNotifier {
    signal: TrackEndSignal,
}

impl SongEndNotifier {
    pub fn new(signal: TrackEndSignal) -> Self {
        Self { signal }
    }
}

#[async_trait]
impl songbird::EventHandler for SongEndNotifier {
    async fn act(&self, ctx: &songbird::EventContext<'_>) -> Option<songbird::Event> {
        if let songbird::EventContext::Track(tracks) = ctx {
            let errored = tracks
                .iter()
                .any(|(state, _)| matches!(state.playing, PlayMode::Errored(_)));

            debug!(
                "Track output ended (generation {}, errored: {})",
                self.signal.generation(),
                errored
            );
            self.signal.fire(if errored {
                TrackEnd::Errored
            } else {
                TrackEnd::Finished
            });
        }
        None
    }
}

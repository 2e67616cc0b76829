//! Common test utilities, fixtures, and mocks
//! This module contains shared functionality used across different test categories


use std::sync::Arc;
use std::time::Duration;

use tunedeck::commands::music::utils::{
    music_manager::{MusicResult, SessionRegistry},
    playback_session::{EnqueueOutcome, PlaybackSession},
};
use tunedeck::config::PlaybackSettings;

use fixtures::{guild, track};
use mocks::{FakePanel, FakeVoice};

/// Lets spawned completion tasks run. Under a paused clock this also
/// advances time by a negligible amount.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

/// A registry wired to one fake voice link and one fake panel channel.
pub struct Harness {
    pub registry: Arc<SessionRegistry>,
    pub voice: Arc<FakeVoice>,
    pub panel: Arc<FakePanel>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(PlaybackSettings::default())
    }

    pub fn with_settings(settings: PlaybackSettings) -> Self {
        crate::test_utils::init();
        Self {
            registry: SessionRegistry::new(settings),
            voice: FakeVoice::new(),
            panel: FakePanel::new(fixtures::CHANNEL_ID),
        }
    }

    /// Enqueues a fixture track the way `/play` does.
    pub async fn play(&self, title: &str) -> MusicResult<EnqueueOutcome> {
        self.registry
            .enqueue(guild(), self.voice.clone(), self.panel.clone(), track(title))
            .await
    }

    pub fn session(&self) -> Arc<PlaybackSession> {
        self.registry
            .get(guild())
            .expect("a session should be registered")
    }

    pub async fn current_title(&self) -> Option<String> {
        self.session()
            .snapshot()
            .await
            .current
            .map(|t| t.title)
    }

    pub async fn upcoming_titles(&self) -> Vec<String> {
        self.session()
            .snapshot()
            .await
            .upcoming
            .into_iter()
            .map(|t| t.title)
            .collect()
    }
}

//! Plain-data view of a session, rendered into the control panel message.

use super::playback_session::{PlayerStatus, SessionSnapshot, Volume};
use crate::commands::music::audio_sources::track_descriptor::TrackDescriptor;

/// Tracks listed per `/queue` page.
pub const QUEUE_PAGE_SIZE: usize = 20;

/// Everything the control panel shows.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerPanel {
    pub status: PlayerStatus,
    pub now_playing: Option<String>,
    pub now_playing_link: Option<String>,
    pub thumbnail: Option<String>,
    /// Titles of the first few queued tracks.
    pub upcoming: Vec<String>,
    pub queue_len: usize,
    pub volume: Volume,
}

impl PlayerPanel {
    pub fn new<'a>(
        status: PlayerStatus,
        current: Option<&TrackDescriptor>,
        queue: impl ExactSizeIterator<Item = &'a TrackDescriptor>,
        volume: Volume,
        preview_len: usize,
    ) -> Self {
        let queue_len = queue.len();
        Self {
            status,
            now_playing: current.map(|t| t.title.clone()),
            now_playing_link: current.map(|t| t.display_link().to_string()),
            thumbnail: current.and_then(|t| t.thumbnail_uri.clone()),
            upcoming: queue.take(preview_len).map(|t| t.title.clone()).collect(),
            queue_len,
            volume,
        }
    }

    pub fn status_label(&self) -> &'static str {
        match self.status {
            PlayerStatus::Playing => "▶️ Playing",
            PlayerStatus::Paused => "⏸️ Paused",
            PlayerStatus::Draining => "⏳ Waiting for tracks",
            PlayerStatus::Idle | PlayerStatus::Terminated => "⏹️ Stopped",
        }
    }

    pub fn title(&self) -> String {
        format!("🎶 Music player · {}", self.status_label())
    }

    pub fn description(&self) -> String {
        let mut description = String::new();

        match (&self.now_playing, &self.now_playing_link) {
            (Some(title), Some(link)) => {
                description.push_str(&format!("**Now playing:** [{}]({})\n", title, link));
            }
            (Some(title), None) => description.push_str(&format!("**Now playing:** {}\n", title)),
            _ => description.push_str("**🔇 Nothing playing**\n"),
        }
        description.push_str(&format!("**Volume:** {}%\n\n", self.volume.percent()));

        if self.upcoming.is_empty() {
            description.push_str("**📭 Queue is empty**");
            return description;
        }

        description.push_str(&format!("**📋 Up next ({}):**\n", self.queue_len));
        for (index, title) in self.upcoming.iter().enumerate() {
            description.push_str(&format!("{}. {}\n", index + 1, title));
        }
        let hidden = self.queue_len.saturating_sub(self.upcoming.len());
        if hidden > 0 {
            description.push_str(&format!("…and {} more", hidden));
        }
        description
    }
}

/// One page of the `/queue` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuePage {
    /// 1-based, clamped to the available pages.
    pub page: usize,
    pub total_pages: usize,
    pub total_tracks: usize,
    /// `(queue position, title, link)` for each listed track.
    pub entries: Vec<(usize, String, String)>,
}

impl QueuePage {
    pub fn from_snapshot(snapshot: &SessionSnapshot, page: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total_tracks = snapshot.upcoming.len();
        let total_pages = total_tracks.div_ceil(page_size).max(1);
        let page = page.clamp(1, total_pages);

        let entries = snapshot
            .upcoming
            .iter()
            .enumerate()
            .skip((page - 1) * page_size)
            .take(page_size)
            .map(|(index, track)| {
                (
                    index + 1,
                    track.title.clone(),
                    track.display_link().to_string(),
                )
            })
            .collect();

        Self {
            page,
            total_pages,
            total_tracks,
            entries,
        }
    }
}

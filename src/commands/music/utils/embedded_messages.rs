use poise::{CreateReply, serenity_prelude as serenity};
use serenity::all::CreateEmbed;

use super::{
    control_panel::{PlayerPanel, QueuePage},
    music_manager::MusicError,
    playback_session::Volume,
};
use crate::commands::music::audio_sources::{
    resolver::ResolutionError, track_descriptor::TrackDescriptor,
};

const GREEN: u32 = 0x00ff00;
const RED: u32 = 0xff0000;
const AMBER: u32 = 0xffa500;

fn track_link(track: &TrackDescriptor) -> String {
    format!("[{}]({})", track.title, track.display_link())
}

fn success(title: &str, description: impl Into<String>) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title(title)
                .description(description)
                .color(GREEN),
        )
        .ephemeral(true)
}

fn failure(description: impl Into<String>) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description(description)
                .color(RED),
        )
        .ephemeral(true)
}

/// Embed for the control panel message
pub fn player_embed(panel: &PlayerPanel) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(panel.title())
        .description(panel.description())
        .color(GREEN);
    if let Some(thumbnail) = &panel.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }
    embed
}

/// Embed for warnings posted to the panel's channel
pub fn notice_embed(text: &str) -> CreateEmbed {
    CreateEmbed::new().description(text).color(AMBER)
}

/// Create an embed for when a song is now playing
pub fn now_playing(track: &TrackDescriptor) -> CreateReply {
    let mut embed = CreateEmbed::new()
        .title("🎵 Now Playing")
        .description(track_link(track))
        .color(GREEN);
    if let Some(thumbnail) = &track.thumbnail_uri {
        embed = embed.thumbnail(thumbnail);
    }
    CreateReply::default().embed(embed).ephemeral(true)
}

/// Create an embed for when a song is added to the queue
pub fn added_to_queue(track: &TrackDescriptor, position: usize) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("🎵 Added to Queue")
                .description(track_link(track))
                .field("Position", format!("`#{}`", position), true)
                .color(GREEN),
        )
        .ephemeral(true)
}

pub fn queue_page(current: Option<&TrackDescriptor>, page: &QueuePage) -> CreateReply {
    let mut description = String::new();

    match current {
        Some(track) => {
            description.push_str("**🎵 Now Playing**\n");
            description.push_str(&format!("**{}**\n\n", track_link(track)));
        }
        None => description.push_str("**🔇 Nothing playing**\n\n"),
    }

    if page.entries.is_empty() {
        description.push_str("**📭 Queue is empty**");
    } else {
        description.push_str(&format!("**📋 Queue - {} tracks**\n", page.total_tracks));
        for (position, title, link) in &page.entries {
            description.push_str(&format!("`{}.` [{}]({})\n", position, title, link));
        }
    }

    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("Music Queue")
                .description(description)
                .footer(serenity::CreateEmbedFooter::new(format!(
                    "Page {}/{}",
                    page.page, page.total_pages
                )))
                .color(GREEN),
        )
        .ephemeral(true)
}

pub fn paused() -> CreateReply {
    success("⏸️ Paused", "Playback paused")
}

pub fn resumed() -> CreateReply {
    success("▶️ Resumed", "Playback resumed")
}

pub fn skipped() -> CreateReply {
    success("⏭️ Skipped", "Skipped to the next track")
}

pub fn stopped() -> CreateReply {
    success("⏹️ Stopped", "Stopped playback, cleared the queue and left the channel")
}

pub fn volume_set(volume: Volume) -> CreateReply {
    success("🔊 Volume", format!("Volume set to {}%", volume.percent()))
}

pub fn track_removed(track: &TrackDescriptor, position: usize) -> CreateReply {
    success(
        "🗑️ Removed",
        format!("Removed {} from position #{}", track_link(track), position),
    )
}

pub fn nothing_playing() -> CreateReply {
    failure("Nothing is playing right now")
}

pub fn queue_is_empty() -> CreateReply {
    failure("The queue is empty")
}

pub fn invalid_queue_position(len: usize) -> CreateReply {
    failure(format!("Invalid position. The queue has {} tracks.", len))
}

pub fn user_not_in_voice_channel(err: MusicError) -> CreateReply {
    failure(format!("You need to be in a voice channel to use this command: {}", err))
}

pub fn failed_to_join_voice_channel(err: MusicError) -> CreateReply {
    failure(format!("Failed to join voice channel: {}", err))
}

pub fn resolution_failed(err: &ResolutionError) -> CreateReply {
    let description = match err {
        ResolutionError::EmptyQuery => "Please provide a song name or a link.",
        ResolutionError::NotFound => "Couldn't find anything playable for that request.",
        ResolutionError::Timeout => "Looking up that track took too long. Please try again.",
    };
    failure(description)
}

pub fn generic_error(msg: &str) -> CreateReply {
    failure(msg.to_string())
}

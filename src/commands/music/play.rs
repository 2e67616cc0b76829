use super::*;
use crate::commands::music::utils::{
    discord_panel::DiscordPanel,
    music_manager::{get_songbird, get_user_voice_channel, join_channel},
    playback_session::EnqueueOutcome,
    transcoder::{SongbirdLink, TranscoderConfig},
};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{info, warn};

/// Offers catalogue matches while the user types a query
async fn autocomplete_query(
    ctx: Context<'_>,
    partial: &str,
) -> impl Iterator<Item = serenity::AutocompleteChoice> {
    ctx.data()
        .suggestions
        .suggest(partial)
        .await
        .into_iter()
        .map(|s| serenity::AutocompleteChoice::new(s.label, s.value))
}

/// Play a song from a search query or a direct URL
#[poise::command(slash_command, category = "Music")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "Song name or link"]
    #[autocomplete = "autocomplete_query"]
    query: String,
) -> CommandResult {
    info!("Received play command with query: {}", query);
    let guild_id = ctx.guild_id().ok_or(MusicError::NotInGuild)?;

    let channel_id =
        match get_user_voice_channel(ctx.serenity_context(), guild_id, ctx.author().id) {
            Ok(channel_id) => channel_id,
            Err(err) => {
                ctx.send(embedded_messages::user_not_in_voice_channel(err))
                    .await?;
                return Ok(());
            }
        };

    // Resolution can take several seconds
    ctx.defer_ephemeral().await?;

    let manager = get_songbird(ctx.serenity_context()).await?;
    let call = match join_channel(&manager, guild_id, channel_id).await {
        Ok(call) => call,
        Err(err) => {
            ctx.send(embedded_messages::failed_to_join_voice_channel(err))
                .await?;
            return Ok(());
        }
    };

    let voice = Arc::new(SongbirdLink::new(
        manager,
        guild_id,
        call,
        TranscoderConfig::from(ctx.data().config.as_ref()),
    ));

    let track = match ctx.data().resolver.resolve(&query).await {
        Ok(track) => track,
        Err(err) => {
            warn!("Failed to resolve '{}': {}", query, err);
            ctx.data()
                .registry
                .release_if_unused(guild_id, voice.as_ref())
                .await;
            ctx.send(embedded_messages::resolution_failed(&err)).await?;
            return Ok(());
        }
    };
    let panel = Arc::new(DiscordPanel::new(
        ctx.serenity_context().http.clone(),
        ctx.channel_id(),
    ));

    let reply = match ctx
        .data()
        .registry
        .enqueue(guild_id, voice, panel, track.clone())
        .await
    {
        Ok(EnqueueOutcome::Started) => embedded_messages::now_playing(&track),
        Ok(EnqueueOutcome::Queued { position }) => {
            embedded_messages::added_to_queue(&track, position)
        }
        Err(err) => embedded_messages::generic_error(&err.to_string()),
    };
    ctx.send(reply).await?;

    Ok(())
}

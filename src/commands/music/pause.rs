use super::*;
use crate::commands::music::utils::playback_session::PlayerStatus;

/// Pause or resume the current track
#[poise::command(slash_command, category = "Music")]
pub async fn pause(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or(MusicError::NotInGuild)?;

    let Some(session) = ctx.data().registry.get(guild_id) else {
        ctx.send(embedded_messages::nothing_playing()).await?;
        return Ok(());
    };

    let reply = match session.toggle_pause().await {
        Ok(PlayerStatus::Paused) => embedded_messages::paused(),
        Ok(_) => embedded_messages::resumed(),
        Err(MusicError::NothingPlaying) => embedded_messages::nothing_playing(),
        Err(err) => embedded_messages::generic_error(&err.to_string()),
    };
    ctx.send(reply).await?;

    Ok(())
}

use super::*;

/// Stop the music, clear the queue and leave the voice channel
#[poise::command(slash_command, category = "Music")]
pub async fn stop(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or(MusicError::NotInGuild)?;

    if ctx.data().registry.stop(guild_id).await {
        ctx.send(embedded_messages::stopped()).await?;
    } else {
        ctx.send(embedded_messages::nothing_playing()).await?;
    }

    Ok(())
}

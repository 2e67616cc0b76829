use super::*;

/// Skip the currently playing song
#[poise::command(slash_command, category = "Music")]
pub async fn skip(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or(MusicError::NotInGuild)?;

    let Some(session) = ctx.data().registry.get(guild_id) else {
        ctx.send(embedded_messages::nothing_playing()).await?;
        return Ok(());
    };

    let reply = match session.skip().await {
        Ok(()) => embedded_messages::skipped(),
        Err(MusicError::NothingPlaying) => embedded_messages::nothing_playing(),
        Err(err) => embedded_messages::generic_error(&err.to_string()),
    };
    ctx.send(reply).await?;

    Ok(())
}

use super::*;
use crate::commands::music::utils::playback_session::Volume;

/// Set the playback volume
#[poise::command(slash_command, category = "Music")]
pub async fn volume(
    ctx: Context<'_>,
    #[description = "Volume in percent (0-200)"]
    #[min = 0]
    #[max = 200]
    percent: u32,
) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or(MusicError::NotInGuild)?;

    let Some(session) = ctx.data().registry.get(guild_id) else {
        ctx.send(embedded_messages::nothing_playing()).await?;
        return Ok(());
    };

    let reply = match session.set_volume(Volume::from_percent(percent)).await {
        Ok(volume) => embedded_messages::volume_set(volume),
        Err(err) => embedded_messages::generic_error(&err.to_string()),
    };
    ctx.send(reply).await?;

    Ok(())
}

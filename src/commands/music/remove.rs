use super::*;

/// Remove a track from the queue by its position
#[poise::command(slash_command, category = "Music")]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Position of the track to remove (1-based)"]
    #[min = 1]
    position: usize,
) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or(MusicError::NotInGuild)?;

    let Some(session) = ctx.data().registry.get(guild_id) else {
        ctx.send(embedded_messages::queue_is_empty()).await?;
        return Ok(());
    };

    let reply = match session.remove(position).await {
        Ok(track) => embedded_messages::track_removed(&track, position),
        Err(MusicError::QueueIndexOutOfRange { len: 0, .. }) => {
            embedded_messages::queue_is_empty()
        }
        Err(MusicError::QueueIndexOutOfRange { len, .. }) => {
            embedded_messages::invalid_queue_position(len)
        }
        Err(err) => embedded_messages::generic_error(&err.to_string()),
    };
    ctx.send(reply).await?;

    Ok(())
}

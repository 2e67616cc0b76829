use super::*;
use crate::commands::music::utils::control_panel::{QUEUE_PAGE_SIZE, QueuePage};

/// Show the current queue
#[poise::command(slash_command, category = "Music")]
pub async fn queue(
    ctx: Context<'_>,
    #[description = "Page to show"]
    #[min = 1]
    page: Option<usize>,
) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or(MusicError::NotInGuild)?;

    let snapshot = match ctx.data().registry.get(guild_id) {
        Some(session) => session.snapshot().await,
        None => {
            ctx.send(embedded_messages::queue_is_empty()).await?;
            return Ok(());
        }
    };

    if snapshot.current.is_none() && snapshot.upcoming.is_empty() {
        ctx.send(embedded_messages::queue_is_empty()).await?;
        return Ok(());
    }

    let page = QueuePage::from_snapshot(&snapshot, page.unwrap_or(1), QUEUE_PAGE_SIZE);
    ctx.send(embedded_messages::queue_page(snapshot.current.as_ref(), &page))
        .await?;

    Ok(())
}

use ::serenity::all::{ComponentInteraction, CreateInteractionResponseFollowup, GuildId};
use poise::serenity_prelude::Context;
use tracing::{debug, error, info};

use super::{
    button_controls::PanelAction,
    music_manager::{MusicError, SessionRegistry},
    playback_session::{PlayerStatus, Volume},
};

type ButtonInteractionResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Result of applying a panel button to a guild's session.
#[derive(Debug)]
pub enum ActionOutcome {
    NothingPlaying,
    Paused,
    Resumed,
    Skipped,
    Volume(Volume),
    Stopped,
    Failed(MusicError),
}

impl ActionOutcome {
    /// Short text acknowledging the click to the user who made it.
    pub fn acknowledgement(&self) -> String {
        match self {
            ActionOutcome::NothingPlaying => "Nothing is playing right now.".to_string(),
            ActionOutcome::Paused => "⏸️ Paused.".to_string(),
            ActionOutcome::Resumed => "▶️ Resumed.".to_string(),
            ActionOutcome::Skipped => "⏭️ Skipped.".to_string(),
            ActionOutcome::Volume(volume) => format!("🔊 Volume: {}%", volume.percent()),
            ActionOutcome::Stopped => "⏹️ Stopped and left the channel.".to_string(),
            ActionOutcome::Failed(e) => format!("❌ {}", e),
        }
    }
}

/// Applies a panel action to the guild's session. Every outcome but `Stopped`
/// leaves the panel re-rendered.
pub async fn apply_action(
    registry: &SessionRegistry,
    guild_id: GuildId,
    action: PanelAction,
) -> ActionOutcome {
    let Some(session) = registry.get(guild_id) else {
        return ActionOutcome::NothingPlaying;
    };

    let result = match action {
        PanelAction::Stop => {
            registry.stop(guild_id).await;
            return ActionOutcome::Stopped;
        }
        PanelAction::TogglePause => session.toggle_pause().await.map(|status| {
            if status == PlayerStatus::Paused {
                ActionOutcome::Paused
            } else {
                ActionOutcome::Resumed
            }
        }),
        PanelAction::Skip => session.skip().await.map(|()| ActionOutcome::Skipped),
        PanelAction::VolumeDown => session.volume_down().await.map(ActionOutcome::Volume),
        PanelAction::VolumeUp => session.volume_up().await.map(ActionOutcome::Volume),
    };

    match result {
        Ok(outcome) => outcome,
        Err(e) => {
            debug!("Panel action {:?} rejected in guild {}: {}", action, guild_id, e);
            session.refresh().await;
            match e {
                MusicError::NothingPlaying | MusicError::SessionClosed => {
                    ActionOutcome::NothingPlaying
                }
                other => ActionOutcome::Failed(other),
            }
        }
    }
}

/// Handle a button interaction on the control panel
pub async fn handle_interaction(
    ctx: &Context,
    interaction: &ComponentInteraction,
    registry: &SessionRegistry,
) -> ButtonInteractionResult {
    let guild_id = interaction.guild_id.ok_or(MusicError::NotInGuild)?;

    interaction.defer_ephemeral(ctx).await?;

    let Some(action) = PanelAction::from_custom_id(&interaction.data.custom_id) else {
        error!("Unknown button ID: {}", interaction.data.custom_id);
        return followup(ctx, interaction, "Unknown button action.").await;
    };

    info!(
        "Panel action {:?} from {} in guild {}",
        action, interaction.user.name, guild_id
    );
    let outcome = apply_action(registry, guild_id, action).await;
    followup(ctx, interaction, &outcome.acknowledgement()).await
}

/// Send an ephemeral followup to the user who clicked
async fn followup(
    ctx: &Context,
    interaction: &ComponentInteraction,
    content: &str,
) -> ButtonInteractionResult {
    interaction
        .create_followup(
            &ctx.http,
            CreateInteractionResponseFollowup::new()
                .content(content)
                .ephemeral(true),
        )
        .await?;
    Ok(())
}

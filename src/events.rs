use serenity::all::{ComponentInteraction, VoiceState};
use serenity::async_trait;
use serenity::model::application::Interaction;
use serenity::prelude::*;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::commands::music::utils::{
    component_handlers,
    music_manager::{SessionRegistry, get_songbird},
};

pub struct Handler {
    registry: Arc<SessionRegistry>,
}

impl Handler {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl serenity::prelude::EventHandler for Handler {
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Component(component) = interaction {
            if component.data.custom_id.starts_with("music_") {
                self.music_component_interaction(&ctx, &component).await;
            }
        }
    }

    /// Tears the session down when the bot is disconnected from voice by someone else.
    async fn voice_state_update(&self, ctx: Context, _old: Option<VoiceState>, new: VoiceState) {
        if new.channel_id.is_some() || new.user_id != ctx.cache.current_user().id {
            return;
        }
        let Some(guild_id) = new.guild_id else {
            return;
        };

        let stopped = match get_songbird(&ctx).await {
            Ok(manager) => self.registry.voice_lost(&manager, guild_id).await,
            Err(e) => {
                warn!("{}, stopping session in guild {} anyway", e, guild_id);
                self.registry.stop(guild_id).await
            }
        };
        if stopped {
            info!("Disconnected from voice in guild {}, session stopped", guild_id);
        }
    }
}

impl Handler {
    /// Handle component interactions for components with identities starting with "music_"
    async fn music_component_interaction(&self, ctx: &Context, component: &ComponentInteraction) {
        if let Err(e) = component_handlers::handle_interaction(ctx, component, &self.registry).await
        {
            error!("Error handling component interaction: {}", e);
        }
    }
}

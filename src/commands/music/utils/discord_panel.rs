use ::serenity::all::{CreateMessage, EditMessage, MessageId};
use poise::serenity_prelude as serenity;
use serenity::async_trait;
use serenity::model::id::ChannelId;
use std::sync::Arc;

use super::{
    button_controls::create_music_control_buttons,
    control_panel::PlayerPanel,
    embedded_messages::{notice_embed, player_embed},
    music_manager::MusicError,
    playback_session::PanelChannel,
};
use crate::Error;

/// The control panel as a message in a Discord text channel.
pub struct DiscordPanel {
    http: Arc<serenity::Http>,
    channel_id: ChannelId,
}

impl DiscordPanel {
    pub fn new(http: Arc<serenity::Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }

    /// A 403 from Discord means the bot may not post here.
    fn classify(&self, err: serenity::Error) -> Error {
        if let serenity::Error::Http(http) = &err {
            if http.status_code().map(|status| status.as_u16()) == Some(403) {
                return Box::new(MusicError::PermissionDenied(format!(
                    "cannot post in channel {}",
                    self.channel_id
                )));
            }
        }
        Box::new(err)
    }
}

#[async_trait]
impl PanelChannel for DiscordPanel {
    fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    async fn send_panel(&self, panel: &PlayerPanel) -> Result<MessageId, Error> {
        let message = CreateMessage::new()
            .embed(player_embed(panel))
            .components(create_music_control_buttons(panel.status));

        let message = self
            .channel_id
            .send_message(self.http.clone(), message)
            .await
            .map_err(|e| self.classify(e))?;
        Ok(message.id)
    }

    async fn edit_panel(&self, message_id: MessageId, panel: &PlayerPanel) -> Result<(), Error> {
        let message = EditMessage::new()
            .embed(player_embed(panel))
            .components(create_music_control_buttons(panel.status));

        self.channel_id
            .edit_message(self.http.clone(), message_id, message)
            .await?;
        Ok(())
    }

    async fn delete_panel(&self, message_id: MessageId) -> Result<(), Error> {
        self.http
            .delete_message(self.channel_id, message_id, None)
            .await?;
        Ok(())
    }

    async fn send_notice(&self, text: &str) -> Result<(), Error> {
        self.channel_id
            .send_message(self.http.clone(), CreateMessage::new().embed(notice_embed(text)))
            .await
            .map_err(|e| self.classify(e))?;
        Ok(())
    }
}

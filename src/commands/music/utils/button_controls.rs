use serenity::all::{ButtonStyle, CreateActionRow, CreateButton, ReactionType};

use super::playback_session::PlayerStatus;

/// The control panel's buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    TogglePause,
    Skip,
    VolumeDown,
    VolumeUp,
    Stop,
}

impl PanelAction {
    pub const ALL: [PanelAction; 5] = [
        PanelAction::TogglePause,
        PanelAction::Skip,
        PanelAction::VolumeDown,
        PanelAction::VolumeUp,
        PanelAction::Stop,
    ];

    pub fn custom_id(self) -> &'static str {
        match self {
            PanelAction::TogglePause => "music_toggle",
            PanelAction::Skip => "music_skip",
            PanelAction::VolumeDown => "music_volume_down",
            PanelAction::VolumeUp => "music_volume_up",
            PanelAction::Stop => "music_stop",
        }
    }

    pub fn from_custom_id(custom_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.custom_id() == custom_id)
    }
}

/// Creates music control buttons based on player status
pub fn create_music_control_buttons(status: PlayerStatus) -> Vec<CreateActionRow> {
    let is_paused = status == PlayerStatus::Paused;
    let has_track = status.has_track();

    let toggle = CreateButton::new(PanelAction::TogglePause.custom_id())
        .emoji(ReactionType::Unicode(
            if is_paused { "▶️" } else { "⏸️" }.to_string(),
        ))
        .style(ButtonStyle::Primary)
        .label(if is_paused { "Resume" } else { "Pause" })
        .disabled(!has_track);

    let skip = CreateButton::new(PanelAction::Skip.custom_id())
        .emoji(ReactionType::Unicode("⏭️".to_string()))
        .style(ButtonStyle::Secondary)
        .label("Skip")
        .disabled(!has_track);

    let volume_down = CreateButton::new(PanelAction::VolumeDown.custom_id())
        .emoji(ReactionType::Unicode("🔉".to_string()))
        .style(ButtonStyle::Secondary);

    let volume_up = CreateButton::new(PanelAction::VolumeUp.custom_id())
        .emoji(ReactionType::Unicode("🔊".to_string()))
        .style(ButtonStyle::Secondary);

    let stop = CreateButton::new(PanelAction::Stop.custom_id())
        .emoji(ReactionType::Unicode("⏹️".to_string()))
        .style(ButtonStyle::Danger)
        .label("Stop");

    vec![CreateActionRow::Buttons(vec![
        toggle,
        skip,
        volume_down,
        volume_up,
        stop,
    ])]
}

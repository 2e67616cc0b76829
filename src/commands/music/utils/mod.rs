// Export music utilities
pub mod button_controls;
pub mod component_handlers;
pub mod control_panel;
pub mod discord_panel;
pub mod embedded_messages;
pub mod event_handlers;
pub mod music_manager;
pub mod playback_session;
pub mod suggestion_cache;
pub mod transcoder;

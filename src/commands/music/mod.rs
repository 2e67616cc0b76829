pub mod pause;
pub mod play;
pub mod queue;
pub mod remove;
pub mod skip;
pub mod stop;
pub mod volume;

pub mod audio_sources;
pub mod utils;

use crate::{CommandResult, Context};
use utils::{embedded_messages, music_manager::MusicError};

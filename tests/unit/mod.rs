//! Unit tests for track resolution and query suggestions

pub mod suggestions;
pub mod track_resolver;

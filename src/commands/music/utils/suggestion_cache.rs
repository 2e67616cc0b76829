use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::commands::music::audio_sources::suggestions::Suggestion;

struct CacheEntry {
    stored_at: Instant,
    suggestions: Vec<Suggestion>,
}

/// Short-lived, bounded memo of autocomplete results keyed by normalized query.
pub struct SuggestionCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    capacity: usize,
}

impl SuggestionCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Returns a fresh entry. Expired entries are dropped on the way.
    pub fn get(&self, key: &str) -> Option<Vec<Suggestion>> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() <= self.ttl => {
                debug!("Suggestion cache hit for '{}'", key);
                return Some(entry.suggestions.clone());
            }
            Some(_) => true,
            None => false,
        };

        // A fresh entry may have replaced the stale one since the read.
        if expired {
            let ttl = self.ttl;
            self.entries
                .remove_if(key, |_, entry| entry.stored_at.elapsed() > ttl);
        }
        None
    }

    pub fn insert(&self, key: String, suggestions: Vec<Suggestion>) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.make_room();
        }
        self.entries.insert(
            key,
            CacheEntry {
                stored_at: Instant::now(),
                suggestions,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Purges expired entries, then the oldest one if still full.
    fn make_room(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.stored_at.elapsed() <= ttl);

        if self.entries.len() < self.capacity {
            return;
        }

        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.stored_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            debug!("Suggestion cache full, evicting '{}'", key);
            self.entries.remove(&key);
        }
    }
}

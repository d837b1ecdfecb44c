//! Persisted best score
//!
//! Stored under the `score` key as a bare number string. A `{"score": N}`
//! record is also accepted on load.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::persistence::KeyValueStore;

/// Best score across rounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScore {
    /// Best score reached
    pub score: u64,
}

impl HighScore {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "score";

    pub fn new() -> Self {
        Self::default()
    }

    /// True when `score` strictly beats the stored best
    pub fn beaten_by(&self, score: u64) -> bool {
        score > self.score
    }

    /// Record `score` if it strictly beats the best. Returns whether it did.
    pub fn submit(&mut self, score: u64) -> bool {
        if !self.beaten_by(score) {
            return false;
        }
        self.score = score;
        true
    }

    fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if let Ok(score) = raw.parse::<u64>() {
            return Ok(Self { score });
        }
        serde_json::from_str(raw).context("parsing stored high score")
    }

    /// Load from the store, starting fresh when missing or unreadable
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let loaded = store
            .get(Self::STORAGE_KEY)
            .and_then(|raw| raw.map(|raw| Self::parse(&raw)).transpose());

        match loaded {
            Ok(Some(best)) => {
                log::info!("Loaded high score {}", best.score);
                best
            }
            Ok(None) => {
                log::info!("No high score found, starting fresh");
                Self::new()
            }
            Err(e) => {
                log::warn!("Discarding unreadable high score: {e:#}");
                Self::new()
            }
        }
    }

    /// Persist to the store
    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<()> {
        store.set(Self::STORAGE_KEY, &self.score.to_string())?;
        log::info!("High score saved ({})", self.score);
        Ok(())
    }
}

//! Player preferences
//!
//! Persisted separately from tuning and high score.

use serde::{Deserialize, Serialize};

use crate::persistence::KeyValueStore;

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Listen for touchmove/touchend in addition to mouse events
    pub touch_input: bool,
    /// Show FPS counter
    pub show_fps: bool,
    /// Draw rank numbers on balls
    pub show_ranks: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Touch is off until the drop gesture is tuned for it
            touch_input: false,
            show_fps: false,
            show_ranks: true,
        }
    }
}

impl Settings {
    /// Storage key
    const STORAGE_KEY: &'static str = "suika_settings";

    /// Load settings, using defaults when missing or unreadable
    pub fn load(store: &dyn KeyValueStore) -> Self {
        if let Ok(Some(json)) = store.get(Self::STORAGE_KEY) {
            match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring stored settings: {e}"),
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Flip the FPS counter (bound to the `F` key in the browser)
    pub fn toggle_fps(&mut self) -> bool {
        self.show_fps = !self.show_fps;
        self.show_fps
    }

    /// Save settings
    pub fn save(&self, store: &mut dyn KeyValueStore) {
        match serde_json::to_string(self) {
            Ok(json) => match store.set(Self::STORAGE_KEY, &json) {
                Ok(()) => log::info!("Settings saved"),
                Err(e) => log::warn!("Settings not saved: {e:#}"),
            },
            Err(e) => log::warn!("Settings not serialized: {e}"),
        }
    }
}

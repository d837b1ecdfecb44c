//! Data-driven gameplay constants
//!
//! Every number that shapes a round lives here so it can be overridden from
//! JSON (LocalStorage key `suika_tuning` on web) without a rebuild.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::persistence::KeyValueStore;

/// Gameplay tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === Pit geometry (screen pixels, y grows downward) ===
    /// Inner width of the pit
    pub pit_width: f32,
    /// Inner height of the pit
    pub pit_height: f32,
    /// Thickness of the boundary walls and floor
    pub wall_thickness: f32,
    /// Y of the held ball's center
    pub drop_height: f32,
    /// A settled ball whose top edge is above this line ends the round
    pub drop_line_y: f32,
    /// X of the held ball at round start
    pub spawn_x: f32,

    // === Timing (milliseconds) ===
    /// Minimum age since last topology change before a ball can end the round
    pub quiet_window_ms: f64,
    /// Delay between a drop and the next held ball
    pub spawn_delay_ms: f64,

    // === Balls ===
    /// Multiplier applied to the rank size table
    pub ball_scale: f32,
    pub restitution: f32,
    pub mass: f32,
    /// Downward acceleration (pixels/s²)
    pub gravity: f32,
    /// Number of low ranks a held ball is drawn from
    pub spawn_ranks: u8,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            pit_width: 900.0,
            pit_height: 900.0,
            wall_thickness: 20.0,
            drop_height: 140.0,
            drop_line_y: 140.0,
            spawn_x: 512.0,

            quiet_window_ms: 1000.0,
            spawn_delay_ms: 500.0,

            ball_scale: 0.85,
            restitution: 0.1,
            mass: 8.0,
            gravity: 1000.0,
            spawn_ranks: crate::consts::SPAWN_RANKS,
        }
    }
}

impl GameConfig {
    /// LocalStorage key for overrides
    pub const STORAGE_KEY: &'static str = "suika_tuning";

    /// Parse a (possibly partial) JSON override; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("parsing tuning JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject geometry and timings the session cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.pit_width <= 0.0 || self.pit_height <= 0.0 {
            bail!("pit dimensions must be positive");
        }
        if self.wall_thickness <= 0.0 {
            bail!("wall thickness must be positive");
        }
        if self.ball_scale <= 0.0 || self.mass <= 0.0 {
            bail!("ball scale and mass must be positive");
        }
        if self.quiet_window_ms < 0.0 || self.spawn_delay_ms < 0.0 {
            bail!("timings must not be negative");
        }
        if self.spawn_ranks == 0 {
            bail!("spawn_ranks must be at least 1");
        }
        if !(0.0..=self.pit_height).contains(&self.drop_line_y) {
            bail!("drop line must lie inside the pit");
        }
        Ok(())
    }

    /// Load an override from the store, falling back to defaults.
    /// A rejected override is removed so it is not retried every start.
    pub fn load(store: &mut dyn KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded tuning override");
                    config
                }
                Err(e) => {
                    log::warn!("Discarding tuning override: {e:#}");
                    if let Err(e) = store.remove(Self::STORAGE_KEY) {
                        log::warn!("Tuning override not removed: {e:#}");
                    }
                    Self::default()
                }
            },
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("Tuning override unreadable: {e:#}");
                Self::default()
            }
        }
    }
}

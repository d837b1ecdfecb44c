//! Suika Pit - A merging ball drop game
//!
//! Core modules:
//! - `sim`: Gameplay core (ball factory, merge arbiter, game-over monitor, session)
//! - `renderer`: Canvas drawing and palette
//! - `persistence`: Key-value storage (LocalStorage on web, memory on native)
//! - `highscores`: Persisted best score
//! - `tuning`: Data-driven gameplay constants
//! - `settings`: Player preferences

pub mod highscores;
pub mod persistence;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use highscores::HighScore;
pub use settings::Settings;
pub use tuning::GameConfig;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matches the engine's default step)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Points per merge are `MERGE_POINTS * (rank + 1)` of the consumed pair
    pub const MERGE_POINTS: u64 = 10;

    /// Number of low ranks the next held ball is drawn from
    pub const SPAWN_RANKS: u8 = 5;
}

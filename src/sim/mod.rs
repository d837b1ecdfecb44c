//! Gameplay simulation module
//!
//! All gameplay logic lives here. Physics itself is rapier2d's job; this
//! module decides what the physics world contains:
//! - Fixed timestep only, clock advanced by stepping
//! - Seeded RNG only
//! - Stable iteration order (by ball ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod drop;
pub mod factory;
pub mod game_over;
pub mod merge;
pub mod rank;
pub mod schedule;
pub mod session;
pub mod state;
pub mod world;

pub use collision::{CollisionPair, CollisionTag};
pub use drop::DropController;
pub use factory::{BallFactory, SpawnKind};
pub use game_over::GameOverRule;
pub use merge::{MergePlan, plan_merges};
pub use rank::{Rank, SIZES};
pub use schedule::{Scheduler, Task};
pub use session::{BallView, Session};
pub use state::{Ball, BallId, GameEvent, GamePhase, Outcome, Roster, Score};
pub use world::PitWorld;

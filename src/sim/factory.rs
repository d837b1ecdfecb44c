//! Ball construction
//!
//! Creates the physics body and the roster entry together so the two never
//! disagree about which balls exist.

use glam::Vec2;

use super::collision::CollisionTag;
use super::rank::Rank;
use super::state::{Ball, BallId, Roster};
use super::world::PitWorld;

/// How a new ball enters the pit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnKind {
    /// Preview above the pit: passive, static, not yet timestamped
    Held,
    /// Gameplay ball (merge product or placed): collidable, dynamic, touched at `now_ms`
    Live { now_ms: f64 },
}

/// Builds balls from the rank table
#[derive(Debug, Clone, Copy)]
pub struct BallFactory {
    scale: f32,
}

impl BallFactory {
    pub fn new(scale: f32) -> Self {
        Self { scale }
    }

    pub fn radius(&self, rank: Rank) -> f32 {
        rank.radius(self.scale)
    }

    /// Create a ball of `rank` centered at `pos`
    pub fn spawn(
        &self,
        world: &mut PitWorld,
        roster: &mut Roster,
        rank: Rank,
        pos: Vec2,
        kind: SpawnKind,
    ) -> BallId {
        let id = roster.next_ball_id();
        let radius = self.radius(rank);

        let (tag, is_static, touched_at) = match kind {
            SpawnKind::Held => (CollisionTag::Passive, true, None),
            SpawnKind::Live { now_ms } => (CollisionTag::Collidable, false, Some(now_ms)),
        };

        world.insert_ball(id, radius, pos, tag, is_static);
        roster.insert(Ball {
            id,
            rank,
            radius,
            tag,
            is_static,
            touched_at,
        });
        id
    }

    /// Destroy a ball in both the world and the roster
    pub fn despawn(world: &mut PitWorld, roster: &mut Roster, id: BallId) -> Option<Ball> {
        world.remove_ball(id);
        roster.remove(id)
    }
}

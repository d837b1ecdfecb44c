//! Drop controller: the held ball above the pit

use glam::Vec2;

use super::collision::CollisionTag;
use super::factory::{BallFactory, SpawnKind};
use super::rank::Rank;
use super::state::{BallId, Roster};
use super::world::PitWorld;

/// Owns the single held ball
#[derive(Debug, Clone)]
pub struct DropController {
    held: Option<BallId>,
    drop_height: f32,
}

impl DropController {
    pub fn new(drop_height: f32) -> Self {
        Self {
            held: None,
            drop_height,
        }
    }

    pub fn held(&self) -> Option<BallId> {
        self.held
    }

    /// Put a new held ball at `x`. No-op (None) if one is already held.
    pub fn spawn_held(
        &mut self,
        factory: &BallFactory,
        world: &mut PitWorld,
        roster: &mut Roster,
        rank: Rank,
        x: f32,
    ) -> Option<BallId> {
        if self.held.is_some() {
            return None;
        }
        let id = factory.spawn(world, roster, rank, Vec2::new(x, self.drop_height), SpawnKind::Held);
        self.held = Some(id);
        Some(id)
    }

    /// Follow the pointer horizontally
    pub fn pointer_move(&mut self, world: &mut PitWorld, x: f32) {
        if let Some(id) = self.held {
            world.set_position(id, Vec2::new(x, self.drop_height));
        }
    }

    /// Release the held ball into the pit. Returns the dropped ball.
    pub fn release(&mut self, world: &mut PitWorld, roster: &mut Roster, now_ms: f64) -> Option<BallId> {
        let id = self.held.take()?;

        world.set_tag(id, CollisionTag::Collidable);
        world.set_static(id, false);
        if let Some(ball) = roster.get_mut(id) {
            ball.tag = CollisionTag::Collidable;
            ball.is_static = false;
            ball.touched_at = Some(now_ms);
        }
        Some(id)
    }

    /// Forget the held ball (its body is cleared elsewhere)
    pub fn clear(&mut self) {
        self.held = None;
    }
}

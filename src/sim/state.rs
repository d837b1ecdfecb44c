//! Round state and core gameplay types

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionPair, CollisionTag};
use super::rank::Rank;

/// Stable ball identifier (never reused within a session)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BallId(pub u32);

/// Current phase of the round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Stepping, accepting input
    Playing,
    /// Round ended, stepper halted until restart
    GameOver,
}

/// Gameplay metadata for a ball. Position and velocity live in the physics world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: BallId,
    pub rank: Rank,
    pub radius: f32,
    pub tag: CollisionTag,
    /// Held pre-drop ball
    pub is_static: bool,
    /// Session time (ms) of the last topology change; None until dropped
    pub touched_at: Option<f64>,
}

impl Ball {
    /// Settled-ball eligibility: counts for merges and game-over
    pub fn is_live(&self) -> bool {
        !self.is_static && self.tag == CollisionTag::Collidable
    }

    /// Milliseconds since the last topology change
    pub fn age_ms(&self, now_ms: f64) -> Option<f64> {
        self.touched_at.map(|t| now_ms - t)
    }
}

/// All balls in the pit, keyed by id for stable iteration
#[derive(Debug, Clone, Default)]
pub struct Roster {
    balls: BTreeMap<BallId, Ball>,
    next_id: u32,
}

impl Roster {
    pub fn new() -> Self {
        Self {
            balls: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Allocate a new ball ID
    pub fn next_ball_id(&mut self) -> BallId {
        // 0 marks non-ball bodies in the physics world
        self.next_id = self.next_id.max(1);
        let id = BallId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn insert(&mut self, ball: Ball) {
        self.balls.insert(ball.id, ball);
    }

    pub fn remove(&mut self, id: BallId) -> Option<Ball> {
        self.balls.remove(&id)
    }

    pub fn get(&self, id: BallId) -> Option<&Ball> {
        self.balls.get(&id)
    }

    pub fn get_mut(&mut self, id: BallId) -> Option<&mut Ball> {
        self.balls.get_mut(&id)
    }

    pub fn contains(&self, id: BallId) -> bool {
        self.balls.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ball> {
        self.balls.values()
    }

    pub fn len(&self) -> usize {
        self.balls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balls.is_empty()
    }

    pub fn clear(&mut self) {
        self.balls.clear();
    }
}

/// Round score with change tracking for the HUD
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    value: u64,
}

impl Score {
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Accumulate points; the score never decreases within a round
    pub fn add(&mut self, points: u64) -> u64 {
        self.value = self.value.saturating_add(points);
        self.value
    }

    pub fn reset(&mut self) {
        self.value = 0;
    }
}

/// Typed input consumed by the session
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Pointer moved over the play field (x in field coordinates)
    PointerMove { x: f32 },
    /// Pointer released over the play field
    PointerUp { x: f32 },
    /// Contacts that started during the last physics step, in engine order
    StepCollision { pairs: Vec<CollisionPair> },
    /// Physics step finished
    StepAfter,
    /// Restart control activated
    RestartRequested,
}

/// What the session did in response to events, drained by the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A new held ball appeared
    HeldSpawned { id: BallId, rank: Rank, x: f32 },
    /// The held ball was released into the pit
    Dropped { id: BallId, rank: Rank },
    /// Two balls of `from` merged into one of `into` at `pos`
    Merged {
        consumed: [BallId; 2],
        produced: BallId,
        from: Rank,
        into: Rank,
        pos: Vec2,
    },
    /// Score changed (mirror to counter and end-of-round summary)
    ScoreChanged { score: u64 },
    /// Round ended
    GameOver {
        score: u64,
        high_score: u64,
        new_high_score: bool,
    },
    /// Round reset
    Restarted,
}

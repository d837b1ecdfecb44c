//! Ball ranks and the size table

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Base radius per rank, before `ball_scale`
pub const SIZES: [f32; 11] = [
    30.0, 45.0, 60.0, 80.0, 100.0, 120.0, 140.0, 160.0, 180.0, 200.0, 220.0,
];

/// Rank tier of a ball. Always indexes into [`SIZES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rank(u8);

impl Rank {
    pub const MIN: Rank = Rank(0);
    /// Terminal rank: never merges
    pub const MAX: Rank = Rank(SIZES.len() as u8 - 1);

    /// Checked constructor
    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX.0).then_some(Rank(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Rank produced by merging two balls of this rank (None at the terminal rank)
    pub fn next(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }

    pub fn is_terminal(self) -> bool {
        self == Self::MAX
    }

    /// Collider radius for this rank
    pub fn radius(self, scale: f32) -> f32 {
        SIZES[self.0 as usize] * scale
    }

    /// Points awarded for merging two balls of this rank
    pub fn merge_points(self) -> u64 {
        crate::consts::MERGE_POINTS * (self.0 as u64 + 1)
    }

    /// Uniform pick among the lowest `span` ranks
    pub fn random_spawn<R: Rng>(rng: &mut R, span: u8) -> Self {
        let span = span.clamp(1, Self::MAX.0 + 1);
        Rank(rng.random_range(0..span))
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

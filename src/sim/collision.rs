//! Collision filter policy
//!
//! Two categories: settled gameplay balls and boundaries are `Collidable`;
//! the held preview ball is `Passive` and only ever matches other passive
//! bodies, so it never touches the pile before it is dropped.

use rapier2d::prelude::{Group, InteractionGroups};
use serde::{Deserialize, Serialize};

use super::state::BallId;

/// Collision category of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionTag {
    Collidable,
    Passive,
}

impl CollisionTag {
    /// Engine interaction groups for this tag
    pub fn groups(self) -> InteractionGroups {
        match self {
            CollisionTag::Collidable => InteractionGroups::new(Group::GROUP_1, Group::GROUP_1),
            CollisionTag::Passive => InteractionGroups::new(Group::GROUP_2, Group::GROUP_2),
        }
    }
}

/// Two balls that started touching during a step, in engine order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub a: BallId,
    pub b: BallId,
}

impl CollisionPair {
    pub fn new(a: BallId, b: BallId) -> Self {
        Self { a, b }
    }

    pub fn involves(&self, id: BallId) -> bool {
        self.a == id || self.b == id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passive_never_meets_collidable() {
        let on = CollisionTag::Collidable.groups();
        let off = CollisionTag::Passive.groups();
        assert!(on.test(on));
        assert!(off.test(off));
        assert!(!on.test(off));
        assert!(!off.test(on));
    }

    #[test]
    fn test_pair_involves() {
        let pair = CollisionPair::new(BallId(1), BallId(2));
        assert!(pair.involves(BallId(2)));
        assert!(!pair.involves(BallId(3)));
    }
}

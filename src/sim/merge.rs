//! Merge arbitration
//!
//! Runs once per physics step over the contacts that started during it.
//! Pairs are taken in engine order; the first pair to claim a ball wins and
//! the ball is skipped for the rest of the pass.

use std::collections::HashSet;

use glam::Vec2;

use super::collision::CollisionPair;
use super::rank::Rank;
use super::state::{BallId, Roster};

/// A merge decided for this pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergePlan {
    pub consumed: [BallId; 2],
    pub from: Rank,
    pub into: Rank,
    /// Midpoint of the two consumed balls
    pub at: Vec2,
}

impl MergePlan {
    pub fn points(&self) -> u64 {
        self.from.merge_points()
    }
}

/// Decide which pairs merge this pass.
///
/// A pair merges when both balls are known, live (dropped and collidable),
/// of equal non-terminal rank, and neither was claimed earlier in the pass.
pub fn plan_merges<F>(pairs: &[CollisionPair], roster: &Roster, position_of: F) -> Vec<MergePlan>
where
    F: Fn(BallId) -> Option<Vec2>,
{
    let mut merged: HashSet<BallId> = HashSet::new();
    let mut plans = Vec::new();

    for pair in pairs {
        if pair.a == pair.b || merged.contains(&pair.a) || merged.contains(&pair.b) {
            continue;
        }
        let (Some(a), Some(b)) = (roster.get(pair.a), roster.get(pair.b)) else {
            continue;
        };
        if !a.is_live() || !b.is_live() || a.rank != b.rank {
            continue;
        }
        let Some(into) = a.rank.next() else {
            continue;
        };
        let (Some(pa), Some(pb)) = (position_of(a.id), position_of(b.id)) else {
            continue;
        };

        merged.insert(a.id);
        merged.insert(b.id);
        plans.push(MergePlan {
            consumed: [a.id, b.id],
            from: a.rank,
            into,
            at: (pa + pb) * 0.5,
        });
    }

    plans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::CollisionTag;
    use crate::sim::state::Ball;
    use proptest::prelude::*;

    fn live(id: u32, rank: u8) -> Ball {
        Ball {
            id: BallId(id),
            rank: Rank::new(rank).unwrap(),
            radius: 10.0,
            tag: CollisionTag::Collidable,
            is_static: false,
            touched_at: Some(0.0),
        }
    }

    fn pos(id: BallId) -> Option<Vec2> {
        Some(Vec2::new(id.0 as f32 * 10.0, 100.0 + id.0 as f32))
    }

    fn pair(a: u32, b: u32) -> CollisionPair {
        CollisionPair::new(BallId(a), BallId(b))
    }

    fn roster(balls: Vec<Ball>) -> Roster {
        let mut roster = Roster::new();
        for ball in balls {
            roster.insert(ball);
        }
        roster
    }

    #[test]
    fn test_same_rank_merges_at_midpoint() {
        let roster = roster(vec![live(1, 0), live(2, 0)]);
        let plans = plan_merges(&[pair(1, 2)], &roster, pos);

        assert_eq!(plans.len(), 1);
        let plan = plans[0];
        assert_eq!(plan.consumed, [BallId(1), BallId(2)]);
        assert_eq!(plan.into, Rank::new(1).unwrap());
        assert_eq!(plan.at, Vec2::new(15.0, 101.5));
        assert_eq!(plan.points(), 10);
    }

    #[test]
    fn test_different_ranks_do_not_merge() {
        let roster = roster(vec![live(1, 0), live(2, 1)]);
        assert!(plan_merges(&[pair(1, 2)], &roster, pos).is_empty());
    }

    #[test]
    fn test_terminal_rank_never_merges() {
        let roster = roster(vec![live(1, 10), live(2, 10)]);
        assert!(plan_merges(&[pair(1, 2)], &roster, pos).is_empty());
    }

    #[test]
    fn test_held_ball_never_merges() {
        let mut held = live(2, 0);
        held.tag = CollisionTag::Passive;
        held.is_static = true;
        held.touched_at = None;
        let roster = roster(vec![live(1, 0), held]);
        assert!(plan_merges(&[pair(1, 2)], &roster, pos).is_empty());
    }

    #[test]
    fn test_three_way_contact_merges_once() {
        // 1-2, 2-3, 1-3 all touching: only the first pair wins
        let roster = roster(vec![live(1, 3), live(2, 3), live(3, 3)]);
        let plans = plan_merges(&[pair(1, 2), pair(2, 3), pair(1, 3)], &roster, pos);

        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].consumed, [BallId(1), BallId(2)]);
    }

    #[test]
    fn test_two_independent_merges_in_one_pass() {
        let roster = roster(vec![live(1, 2), live(2, 2), live(3, 2), live(4, 2)]);
        let plans = plan_merges(&[pair(1, 2), pair(3, 4)], &roster, pos);

        assert_eq!(plans.len(), 2);
        assert!(plans.iter().all(|p| p.into == Rank::new(3).unwrap()));
        assert_eq!(plans.iter().map(MergePlan::points).sum::<u64>(), 60);
    }

    #[test]
    fn test_unknown_ids_skipped() {
        let roster = roster(vec![live(1, 0)]);
        assert!(plan_merges(&[pair(1, 9)], &roster, pos).is_empty());
        assert!(plan_merges(&[pair(1, 1)], &roster, pos).is_empty());
    }

    proptest! {
        #[test]
        fn prop_no_ball_merges_twice(
            ranks in prop::collection::vec(0u8..=10, 2..12),
            raw_pairs in prop::collection::vec((0usize..12, 0usize..12), 0..40),
        ) {
            let n = ranks.len();
            let balls: Vec<Ball> = ranks
                .iter()
                .enumerate()
                .map(|(i, r)| live(i as u32 + 1, *r))
                .collect();
            let roster = roster(balls);
            let pairs: Vec<CollisionPair> = raw_pairs
                .iter()
                .map(|(a, b)| pair((a % n) as u32 + 1, (b % n) as u32 + 1))
                .collect();

            let plans = plan_merges(&pairs, &roster, pos);

            let mut seen = HashSet::new();
            for plan in &plans {
                for id in plan.consumed {
                    prop_assert!(seen.insert(id), "ball {:?} merged twice", id);
                }
                let a = roster.get(plan.consumed[0]).unwrap();
                let b = roster.get(plan.consumed[1]).unwrap();
                prop_assert_eq!(a.rank, b.rank);
                prop_assert!(!a.rank.is_terminal());
                prop_assert_eq!(plan.into.value(), a.rank.value() + 1);
                let mid = (pos(a.id).unwrap() + pos(b.id).unwrap()) * 0.5;
                prop_assert_eq!(plan.at, mid);
            }
        }

        #[test]
        fn prop_first_eligible_pair_always_merges(rank in 0u8..10) {
            let roster = roster(vec![live(1, rank), live(2, rank), live(3, rank)]);
            let plans = plan_merges(&[pair(3, 1), pair(1, 2)], &roster, pos);
            prop_assert_eq!(plans.len(), 1);
            prop_assert_eq!(plans[0].consumed, [BallId(3), BallId(1)]);
        }
    }
}

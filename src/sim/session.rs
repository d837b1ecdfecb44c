//! Game session controller
//!
//! Owns every piece of round state and is the only thing that mutates it.
//! Input arrives as [`GameEvent`]s; the fixed-step driver ([`Session::step`])
//! runs due tasks, steps the physics world, then dispatches
//! `StepCollision` followed by `StepAfter`, so merges made in a step are
//! settled before the game-over scan of that same step.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::drop::DropController;
use super::factory::{BallFactory, SpawnKind};
use super::game_over::GameOverRule;
use super::merge::{MergePlan, plan_merges};
use super::rank::Rank;
use super::schedule::{Scheduler, Task};
use super::state::{BallId, GameEvent, GamePhase, Outcome, Roster, Score};
use super::world::PitWorld;
use crate::highscores::HighScore;
use crate::persistence::KeyValueStore;
use crate::tuning::GameConfig;

/// Read-only view of a ball for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallView {
    pub id: BallId,
    pub rank: Rank,
    pub pos: Vec2,
    pub radius: f32,
    pub held: bool,
}

/// A single game session (one pit, many rounds)
pub struct Session {
    config: GameConfig,
    world: PitWorld,
    roster: Roster,
    factory: BallFactory,
    drop: DropController,
    scheduler: Scheduler,
    rule: GameOverRule,
    phase: GamePhase,
    score: Score,
    high_score: HighScore,
    store: Box<dyn KeyValueStore>,
    rng: Pcg32,
    /// Session clock, advanced only by stepping
    now_ms: f64,
    outcomes: Vec<Outcome>,
}

impl Session {
    /// Start a session; the high score is re-hydrated from `store`
    pub fn new(config: GameConfig, store: Box<dyn KeyValueStore>, seed: u64) -> Self {
        let high_score = HighScore::load(&*store);
        let mut session = Self {
            world: PitWorld::new(&config),
            roster: Roster::new(),
            factory: BallFactory::new(config.ball_scale),
            drop: DropController::new(config.drop_height),
            scheduler: Scheduler::new(),
            rule: GameOverRule {
                drop_line_y: config.drop_line_y,
                quiet_window_ms: config.quiet_window_ms,
            },
            phase: GamePhase::Playing,
            score: Score::default(),
            high_score,
            store,
            rng: Pcg32::seed_from_u64(seed),
            now_ms: 0.0,
            outcomes: Vec::new(),
            config,
        };

        log::info!("Session started with seed {seed}");
        session.spawn_held(Rank::MIN, session.config.spawn_x);
        session
    }

    /// Advance one fixed physics step. Returns false while the round is over.
    pub fn step(&mut self) -> bool {
        if self.phase == GamePhase::GameOver {
            return false;
        }

        self.now_ms += self.world.step_ms();
        for task in self.scheduler.take_due(self.now_ms) {
            self.run_task(task);
        }

        let pairs = self.world.step();
        self.handle(GameEvent::StepCollision { pairs });
        self.handle(GameEvent::StepAfter);
        true
    }

    /// Dispatch one event
    pub fn handle(&mut self, event: GameEvent) {
        if self.phase == GamePhase::GameOver && event != GameEvent::RestartRequested {
            return;
        }

        match event {
            GameEvent::PointerMove { x } => self.drop.pointer_move(&mut self.world, x),
            GameEvent::PointerUp { x } => self.release(x),
            GameEvent::StepCollision { pairs } => {
                let world = &self.world;
                let plans = plan_merges(&pairs, &self.roster, |id| world.position(id));
                for plan in plans {
                    self.apply_merge(plan);
                }
            }
            GameEvent::StepAfter => {
                let world = &self.world;
                let offender = self
                    .rule
                    .offender(&self.roster, self.now_ms, |id| world.position(id));
                if let Some(id) = offender {
                    self.end_round(id);
                }
            }
            GameEvent::RestartRequested => self.restart(),
        }
    }

    /// Take everything that happened since the last drain
    pub fn drain_outcomes(&mut self) -> Vec<Outcome> {
        std::mem::take(&mut self.outcomes)
    }

    /// Put a settled gameplay ball into the pit (round setup, demos)
    pub fn place_ball(&mut self, rank: Rank, pos: Vec2) -> BallId {
        self.factory.spawn(
            &mut self.world,
            &mut self.roster,
            rank,
            pos,
            SpawnKind::Live { now_ms: self.now_ms },
        )
    }

    fn release(&mut self, x: f32) {
        let Some(id) = self
            .drop
            .release(&mut self.world, &mut self.roster, self.now_ms)
        else {
            return;
        };
        if let Some(ball) = self.roster.get(id) {
            self.outcomes.push(Outcome::Dropped { id, rank: ball.rank });
        }
        self.scheduler
            .schedule(self.now_ms, self.config.spawn_delay_ms, Task::SpawnHeld { x });
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::SpawnHeld { x } => {
                let rank = Rank::random_spawn(&mut self.rng, self.config.spawn_ranks);
                self.spawn_held(rank, x);
            }
        }
    }

    fn spawn_held(&mut self, rank: Rank, x: f32) {
        if let Some(id) =
            self.drop
                .spawn_held(&self.factory, &mut self.world, &mut self.roster, rank, x)
        {
            log::debug!("Held ball {} (rank {rank}) at x={x}", id.0);
            self.outcomes.push(Outcome::HeldSpawned { id, rank, x });
        }
    }

    fn apply_merge(&mut self, plan: MergePlan) {
        for id in plan.consumed {
            BallFactory::despawn(&mut self.world, &mut self.roster, id);
        }
        let produced = self.factory.spawn(
            &mut self.world,
            &mut self.roster,
            plan.into,
            plan.at,
            SpawnKind::Live { now_ms: self.now_ms },
        );
        let score = self.score.add(plan.points());

        log::debug!(
            "Merged rank {} -> {} at ({:.1}, {:.1}), +{} (score {score})",
            plan.from,
            plan.into,
            plan.at.x,
            plan.at.y,
            plan.points()
        );
        self.outcomes.push(Outcome::Merged {
            consumed: plan.consumed,
            produced,
            from: plan.from,
            into: plan.into,
            pos: plan.at,
        });
        self.outcomes.push(Outcome::ScoreChanged { score });
    }

    fn end_round(&mut self, offender: BallId) {
        self.phase = GamePhase::GameOver;
        // Pending spawns belong to the round that just ended
        self.scheduler.advance_epoch();

        let score = self.score.value();
        let new_high_score = self.high_score.submit(score);
        if new_high_score {
            if let Err(e) = self.high_score.save(&mut *self.store) {
                log::warn!("High score not persisted: {e:#}");
            }
        }

        log::info!(
            "Game over: ball {} crossed the drop line, score {score}, high score {}",
            offender.0,
            self.high_score.score
        );
        self.outcomes.push(Outcome::GameOver {
            score,
            high_score: self.high_score.score,
            new_high_score,
        });
    }

    fn restart(&mut self) {
        self.world.clear_balls();
        self.roster.clear();
        self.drop.clear();
        self.scheduler.advance_epoch();
        self.score.reset();
        self.phase = GamePhase::Playing;

        log::info!("Round restarted");
        self.outcomes.push(Outcome::Restarted);
        self.outcomes.push(Outcome::ScoreChanged { score: 0 });
        self.spawn_held(Rank::MIN, self.config.spawn_x);
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn score(&self) -> u64 {
        self.score.value()
    }

    pub fn high_score(&self) -> u64 {
        self.high_score.score
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The held ball, if one is waiting above the pit
    pub fn held(&self) -> Option<BallView> {
        self.drop.held().and_then(|id| self.ball(id))
    }

    pub fn ball(&self, id: BallId) -> Option<BallView> {
        let ball = self.roster.get(id)?;
        Some(BallView {
            id,
            rank: ball.rank,
            pos: self.world.position(id)?,
            radius: ball.radius,
            held: ball.is_static,
        })
    }

    /// Every ball in id order
    pub fn balls(&self) -> impl Iterator<Item = BallView> + '_ {
        self.roster.iter().filter_map(|ball| self.ball(ball.id))
    }

    pub fn ball_count(&self) -> usize {
        self.roster.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::sim::collision::CollisionPair;

    fn session() -> Session {
        Session::new(GameConfig::default(), Box::new(MemoryStore::default()), 12345)
    }

    fn rank(value: u8) -> Rank {
        Rank::new(value).unwrap()
    }

    fn collide(session: &mut Session, pairs: &[(BallId, BallId)]) {
        let pairs = pairs.iter().map(|(a, b)| CollisionPair::new(*a, *b)).collect();
        session.handle(GameEvent::StepCollision { pairs });
    }

    fn non_held(session: &Session) -> Vec<BallView> {
        session.balls().filter(|b| !b.held).collect()
    }

    #[test]
    fn test_new_session_has_one_held_ball() {
        let session = session();
        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(session.ball_count(), 1);

        let held = session.held().unwrap();
        assert_eq!(held.rank, Rank::MIN);
        assert_eq!(held.pos, Vec2::new(512.0, 140.0));
    }

    #[test]
    fn test_pointer_move_tracks_x() {
        let mut session = session();
        session.handle(GameEvent::PointerMove { x: 300.0 });
        assert_eq!(session.held().unwrap().pos, Vec2::new(300.0, 140.0));
    }

    #[test]
    fn test_drop_then_respawn_after_delay() {
        let mut session = session();
        session.handle(GameEvent::PointerUp { x: 450.0 });
        assert!(session.held().is_none());

        // 29 steps ≈ 483 ms: still waiting
        for _ in 0..29 {
            session.step();
        }
        assert!(session.held().is_none());

        // 31 steps ≈ 517 ms: next ball is up at the release x
        session.step();
        session.step();
        let held = session.held().unwrap();
        assert!(held.rank.value() < 5);
        assert_eq!(held.pos.x, 450.0);
        assert!(
            session
                .drain_outcomes()
                .iter()
                .any(|o| matches!(o, Outcome::Dropped { .. }))
        );
    }

    #[test]
    fn test_release_without_held_is_noop() {
        let mut session = session();
        session.handle(GameEvent::PointerUp { x: 450.0 });
        session.drain_outcomes();
        session.handle(GameEvent::PointerUp { x: 450.0 });
        assert!(session.drain_outcomes().is_empty());
    }

    #[test]
    fn test_merge_produces_next_rank_at_midpoint() {
        let mut session = session();
        let a = session.place_ball(Rank::MIN, Vec2::new(100.0, 500.0));
        let b = session.place_ball(Rank::MIN, Vec2::new(150.0, 500.0));

        collide(&mut session, &[(a, b)]);

        let balls = non_held(&session);
        assert_eq!(balls.len(), 1);
        assert_eq!(balls[0].rank, rank(1));
        assert_eq!(balls[0].pos, Vec2::new(125.0, 500.0));
        assert!(session.ball(a).is_none() && session.ball(b).is_none());
        assert_eq!(session.score(), 10);
        assert!(
            session
                .drain_outcomes()
                .contains(&Outcome::ScoreChanged { score: 10 })
        );
    }

    #[test]
    fn test_two_simultaneous_merges() {
        let mut session = session();
        let a = session.place_ball(rank(2), Vec2::new(100.0, 600.0));
        let b = session.place_ball(rank(2), Vec2::new(200.0, 600.0));
        let c = session.place_ball(rank(2), Vec2::new(500.0, 700.0));
        let d = session.place_ball(rank(2), Vec2::new(600.0, 700.0));

        collide(&mut session, &[(a, b), (c, d)]);

        let balls = non_held(&session);
        assert_eq!(balls.len(), 2);
        assert!(balls.iter().all(|b| b.rank == rank(3)));
        assert_eq!(balls[0].pos, Vec2::new(150.0, 600.0));
        assert_eq!(balls[1].pos, Vec2::new(550.0, 700.0));
        assert_eq!(session.score(), 60);

        let scores: Vec<u64> = session
            .drain_outcomes()
            .into_iter()
            .filter_map(|o| match o {
                Outcome::ScoreChanged { score } => Some(score),
                _ => None,
            })
            .collect();
        assert_eq!(scores, vec![30, 60]);
    }

    #[test]
    fn test_simultaneous_triple_merges_once() {
        let mut session = session();
        let a = session.place_ball(rank(1), Vec2::new(100.0, 600.0));
        let b = session.place_ball(rank(1), Vec2::new(150.0, 600.0));
        let c = session.place_ball(rank(1), Vec2::new(125.0, 560.0));

        collide(&mut session, &[(a, b), (b, c), (a, c)]);

        let balls = non_held(&session);
        assert_eq!(balls.len(), 2);
        assert!(session.ball(c).is_some());
        assert_eq!(session.score(), 20);
    }

    #[test]
    fn test_held_ball_never_merges() {
        let mut session = session();
        let held = session.held().unwrap().id;
        let settled = session.place_ball(Rank::MIN, Vec2::new(512.0, 170.0));

        collide(&mut session, &[(held, settled)]);

        assert_eq!(session.ball_count(), 2);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn test_score_accumulates_across_merges() {
        let mut session = session();
        let a = session.place_ball(Rank::MIN, Vec2::new(100.0, 600.0));
        let b = session.place_ball(Rank::MIN, Vec2::new(150.0, 600.0));
        collide(&mut session, &[(a, b)]);

        let c = session.place_ball(rank(1), Vec2::new(300.0, 600.0));
        let merged = non_held(&session)
            .into_iter()
            .find(|v| v.id != c)
            .unwrap()
            .id;
        collide(&mut session, &[(merged, c)]);

        assert_eq!(session.score(), 10 + 20);
        let balls = non_held(&session);
        assert_eq!(balls.len(), 1);
        assert_eq!(balls[0].rank, rank(2));
    }

    #[test]
    fn test_game_over_waits_for_quiet_window() {
        let mut session = session();
        // Top edge at 100 - 25.5, well above the 140 line
        session.place_ball(Rank::MIN, Vec2::new(300.0, 100.0));

        session.handle(GameEvent::StepAfter);
        assert_eq!(session.phase(), GamePhase::Playing);

        session.now_ms = 999.0;
        session.handle(GameEvent::StepAfter);
        assert_eq!(session.phase(), GamePhase::Playing);

        session.now_ms = 1001.0;
        session.handle(GameEvent::StepAfter);
        assert_eq!(session.phase(), GamePhase::GameOver);
    }

    #[test]
    fn test_dropped_ball_above_line_ends_round_after_quiet_window() {
        // Without gravity the released ball stays where it was dropped,
        // top edge at 140 - 25.5
        let config = GameConfig {
            gravity: 0.0,
            ..GameConfig::default()
        };
        let mut session = Session::new(config, Box::new(MemoryStore::default()), 7);
        let dropped = session.held().unwrap().id;
        session.handle(GameEvent::PointerUp { x: 512.0 });

        // 59 steps ≈ 983 ms since release
        for _ in 0..59 {
            assert!(session.step());
        }
        assert_eq!(session.phase(), GamePhase::Playing);
        assert!(session.ball(dropped).unwrap().pos.y < 140.0 + 1.0);

        let mut steps = 0;
        while session.step() {
            steps += 1;
            assert!(steps < 3, "round should end once the window has passed");
        }
        assert!(session.is_over());
        assert!(session.now_ms() > 1000.0);
        assert!(
            session
                .drain_outcomes()
                .iter()
                .any(|o| matches!(o, Outcome::GameOver { score: 0, .. }))
        );
    }

    #[test]
    fn test_game_over_freezes_round_and_records_high_score() {
        let mut session = session();
        let a = session.place_ball(rank(2), Vec2::new(100.0, 600.0));
        let b = session.place_ball(rank(2), Vec2::new(200.0, 600.0));
        collide(&mut session, &[(a, b)]);
        session.place_ball(Rank::MIN, Vec2::new(300.0, 100.0));
        session.now_ms = 5000.0;
        session.handle(GameEvent::StepAfter);

        let outcomes = session.drain_outcomes();
        assert!(outcomes.contains(&Outcome::GameOver {
            score: 30,
            high_score: 30,
            new_high_score: true,
        }));
        assert_eq!(HighScore::load(&*session.store).score, 30);

        // Everything but restart is ignored now
        let count = session.ball_count();
        assert!(!session.step());
        assert_eq!(session.now_ms(), 5000.0);
        session.handle(GameEvent::PointerUp { x: 10.0 });
        session.handle(GameEvent::StepAfter);
        assert_eq!(session.ball_count(), count);
        assert!(session.drain_outcomes().is_empty());
    }

    #[test]
    fn test_high_score_only_when_strictly_exceeded() {
        let mut store = MemoryStore::default();
        store.set(HighScore::STORAGE_KEY, "30").unwrap();
        let mut session = Session::new(GameConfig::default(), Box::new(store), 1);
        assert_eq!(session.high_score(), 30);

        let a = session.place_ball(rank(2), Vec2::new(100.0, 600.0));
        let b = session.place_ball(rank(2), Vec2::new(200.0, 600.0));
        collide(&mut session, &[(a, b)]);
        session.place_ball(Rank::MIN, Vec2::new(300.0, 100.0));
        session.now_ms = 5000.0;
        session.handle(GameEvent::StepAfter);

        assert!(session.drain_outcomes().contains(&Outcome::GameOver {
            score: 30,
            high_score: 30,
            new_high_score: false,
        }));
    }

    #[test]
    fn test_restart_resets_round() {
        let mut session = session();
        let a = session.place_ball(Rank::MIN, Vec2::new(100.0, 600.0));
        let b = session.place_ball(Rank::MIN, Vec2::new(150.0, 600.0));
        collide(&mut session, &[(a, b)]);
        session.place_ball(rank(4), Vec2::new(300.0, 100.0));
        session.now_ms = 5000.0;
        session.handle(GameEvent::StepAfter);
        assert!(session.is_over());

        session.handle(GameEvent::RestartRequested);

        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(session.score(), 0);
        assert_eq!(session.ball_count(), 1);
        let held = session.held().unwrap();
        assert_eq!(held.rank, Rank::MIN);
        assert_eq!(held.pos, Vec2::new(512.0, 140.0));
        assert!(session.step());
    }

    #[test]
    fn test_stale_spawn_does_not_leak_into_next_round() {
        let mut session = session();
        session.handle(GameEvent::PointerUp { x: 200.0 });

        // End the round before the 500 ms spawn comes due
        let tall = session.place_ball(rank(3), Vec2::new(700.0, 100.0));
        if let Some(ball) = session.roster.get_mut(tall) {
            ball.touched_at = Some(-5000.0);
        }
        session.handle(GameEvent::StepAfter);
        assert!(session.is_over());

        session.handle(GameEvent::RestartRequested);
        let held = session.held().unwrap().id;

        for _ in 0..60 {
            session.step();
        }
        assert_eq!(session.held().map(|b| b.id), Some(held));
        assert_eq!(session.balls().filter(|b| b.held).count(), 1);
    }

    #[test]
    fn test_drop_onto_resting_ball_merges() {
        let mut session = session();
        // Resting on the floor right under the held ball
        let resting = session.place_ball(Rank::MIN, Vec2::new(512.0, 874.0));
        session.handle(GameEvent::PointerUp { x: 512.0 });

        let mut merged = None;
        for _ in 0..300 {
            session.step();
            merged = session.drain_outcomes().into_iter().find_map(|o| match o {
                Outcome::Merged { consumed, into, .. } => Some((consumed, into)),
                _ => None,
            });
            if merged.is_some() {
                break;
            }
        }

        let (consumed, into) = merged.expect("dropped ball should merge with the resting one");
        assert!(consumed.contains(&resting));
        assert_eq!(into, rank(1));
        assert_eq!(session.score(), 10);
        assert!(!session.is_over());
    }
}

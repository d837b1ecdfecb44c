//! Physics world adapter
//!
//! Wraps the rapier2d pipeline for the pit: three fixed boundaries plus one
//! rigid circle per ball. Screen coordinates throughout (y grows downward,
//! gravity points +y). Bodies carry their [`BallId`] in `user_data`; 0 marks
//! boundaries.

use std::collections::HashMap;
use std::sync::Mutex;

use glam::Vec2;
use rapier2d::prelude::*;

use super::collision::{CollisionPair, CollisionTag};
use super::state::BallId;
use crate::tuning::GameConfig;

/// Gathers contacts that started during one step
#[derive(Default)]
struct StartedContacts {
    pairs: Mutex<Vec<(u128, u128)>>,
}

impl StartedContacts {
    fn into_pairs(self) -> Vec<CollisionPair> {
        let pairs = self.pairs.into_inner().unwrap_or_else(|e| e.into_inner());
        pairs
            .into_iter()
            .map(|(a, b)| CollisionPair::new(BallId(a as u32), BallId(b as u32)))
            .collect()
    }
}

impl EventHandler for StartedContacts {
    fn handle_collision_event(
        &self,
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if !event.started() {
            return;
        }
        let owner = |handle: ColliderHandle| {
            colliders
                .get(handle)
                .and_then(|c| c.parent())
                .and_then(|b| bodies.get(b))
                .map_or(0, |b| b.user_data)
        };
        let (a, b) = (owner(event.collider1()), owner(event.collider2()));
        // Ball against boundary
        if a == 0 || b == 0 {
            return;
        }
        if let Ok(mut pairs) = self.pairs.lock() {
            pairs.push((a, b));
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// The pit: boundaries and ball bodies
pub struct PitWorld {
    gravity: Vector<Real>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    balls: HashMap<BallId, RigidBodyHandle>,
    restitution: f32,
    mass: f32,
}

impl PitWorld {
    /// Build an empty pit with its boundaries
    pub fn new(config: &GameConfig) -> Self {
        let params = IntegrationParameters {
            dt: crate::consts::SIM_DT,
            // Pixels, not meters
            length_unit: 100.0,
            ..Default::default()
        };

        let mut world = Self {
            gravity: vector![0.0, config.gravity],
            params,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            balls: HashMap::new(),
            restitution: config.restitution,
            mass: config.mass,
        };
        world.build_boundaries(config);
        world
    }

    fn build_boundaries(&mut self, config: &GameConfig) {
        let w = config.pit_width;
        let h = config.pit_height;
        let t = config.wall_thickness;

        // (center, half extents, friction)
        let walls = [
            (vector![-t / 2.0, h / 2.0], vector![t / 2.0, h / 2.0], 0.5),
            (vector![w + t / 2.0, h / 2.0], vector![t / 2.0, h / 2.0], 0.5),
            (vector![w / 2.0, h + t / 2.0], vector![w / 2.0 + t, t / 2.0], 0.0),
        ];

        for (center, half, friction) in walls {
            let body = self
                .bodies
                .insert(RigidBodyBuilder::fixed().translation(center).build());
            let collider = ColliderBuilder::cuboid(half.x, half.y)
                .friction(friction)
                .collision_groups(CollisionTag::Collidable.groups())
                .build();
            self.colliders
                .insert_with_parent(collider, body, &mut self.bodies);
        }
    }

    /// Add a circular body for a ball
    pub fn insert_ball(
        &mut self,
        id: BallId,
        radius: f32,
        pos: Vec2,
        tag: CollisionTag,
        is_static: bool,
    ) {
        let builder = if is_static {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic()
        };
        let body = builder
            .translation(vector![pos.x, pos.y])
            .user_data(id.0 as u128)
            .build();
        let handle = self.bodies.insert(body);

        let collider = ColliderBuilder::ball(radius)
            .restitution(self.restitution)
            .mass(self.mass)
            .collision_groups(tag.groups())
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        self.balls.insert(id, handle);
    }

    /// Remove a ball's body. Returns false if it was already gone.
    pub fn remove_ball(&mut self, id: BallId) -> bool {
        let Some(handle) = self.balls.remove(&id) else {
            return false;
        };
        self.bodies
            .remove(
                handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    /// Remove every ball, keeping the boundaries
    pub fn clear_balls(&mut self) {
        let ids: Vec<BallId> = self.balls.keys().copied().collect();
        for id in ids {
            self.remove_ball(id);
        }
    }

    pub fn contains(&self, id: BallId) -> bool {
        self.balls.contains_key(&id)
    }

    pub fn ball_count(&self) -> usize {
        self.balls.len()
    }

    /// Center of a ball
    pub fn position(&self, id: BallId) -> Option<Vec2> {
        let body = self.bodies.get(*self.balls.get(&id)?)?;
        let t = body.translation();
        Some(Vec2::new(t.x, t.y))
    }

    /// Teleport a ball (used for the held ball)
    pub fn set_position(&mut self, id: BallId, pos: Vec2) {
        let Some(handle) = self.balls.get(&id) else {
            return;
        };
        if let Some(body) = self.bodies.get_mut(*handle) {
            body.set_translation(vector![pos.x, pos.y], true);
        }
    }

    /// Switch a ball between fixed and dynamic
    pub fn set_static(&mut self, id: BallId, is_static: bool) {
        let Some(handle) = self.balls.get(&id) else {
            return;
        };
        if let Some(body) = self.bodies.get_mut(*handle) {
            let kind = if is_static {
                RigidBodyType::Fixed
            } else {
                RigidBodyType::Dynamic
            };
            body.set_body_type(kind, true);
        }
    }

    /// Move a ball's colliders into the given collision category
    pub fn set_tag(&mut self, id: BallId, tag: CollisionTag) {
        let Some(handle) = self.balls.get(&id) else {
            return;
        };
        let Some(body) = self.bodies.get(*handle) else {
            return;
        };
        for collider in body.colliders().to_vec() {
            if let Some(collider) = self.colliders.get_mut(collider) {
                collider.set_collision_groups(tag.groups());
            }
        }
    }

    /// Advance one fixed step. Returns ball/ball contacts that started, in engine order.
    pub fn step(&mut self) -> Vec<CollisionPair> {
        let contacts = StartedContacts::default();
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &contacts,
        );
        contacts.into_pairs()
    }

    /// Step duration in milliseconds
    pub fn step_ms(&self) -> f64 {
        self.params.dt as f64 * 1000.0
    }
}

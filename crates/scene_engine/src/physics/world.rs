//! Rigid-body world backed by Rapier

use rapier2d::prelude::*;

use crate::foundation::math::Vec2;
use crate::scene::entity::BodyType;

/// Parameters of one box-shaped body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySpec {
    /// Body flavour
    pub body_type: BodyType,
    /// Spawn position
    pub position: Vec2,
    /// Spawn angle in radians
    pub angle: f32,
    /// Half width and half height of the box fixture
    pub half_extents: Vec2,
    /// Fixture density
    pub density: f32,
    /// Fixture friction
    pub friction: f32,
    /// Fixture restitution
    pub restitution: f32,
    /// Lock rotation
    pub fixed_rotation: bool,
}

/// Position and angle of a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyPose {
    /// Horizontal position
    pub x: f32,
    /// Vertical position
    pub y: f32,
    /// Angle in radians
    pub angle: f32,
}

/// Owns every Rapier structure of one simulation
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    gravity: Vector<Real>,
    steps: u64,
}

impl PhysicsWorld {
    /// Create an empty world
    pub fn new(gravity: Vec2) -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity: vector![gravity.x, gravity.y],
            steps: 0,
        }
    }

    /// Change gravity
    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = vector![gravity.x, gravity.y];
    }

    /// Advance the simulation by `dt` seconds; non-positive steps are ignored
    pub fn step(&mut self, dt: f32) {
        if dt.is_nan() || dt <= 0.0 {
            return;
        }
        let integration_parameters = IntegrationParameters {
            dt,
            ..IntegrationParameters::default()
        };
        self.pipeline.step(
            &self.gravity,
            &integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
        self.steps += 1;
    }

    /// Insert a body with a single box fixture
    pub fn create_body(&mut self, spec: &BodySpec) -> RigidBodyHandle {
        let body_type = match spec.body_type {
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Static => RigidBodyType::Fixed,
            BodyType::Kinematic => RigidBodyType::KinematicPositionBased,
        };
        let mut builder = RigidBodyBuilder::new(body_type)
            .translation(vector![spec.position.x, spec.position.y])
            .rotation(spec.angle);
        if spec.fixed_rotation {
            builder = builder.lock_rotations();
        }
        let handle = self.bodies.insert(builder.build());

        let collider = ColliderBuilder::cuboid(spec.half_extents.x, spec.half_extents.y)
            .density(spec.density)
            .friction(spec.friction)
            .restitution(spec.restitution)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        handle
    }

    /// Remove a body and its colliders
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        let removed = self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        if removed.is_none() {
            log::debug!("Body {handle:?} was already gone");
        }
    }

    /// Current pose of a body
    pub fn pose(&self, handle: RigidBodyHandle) -> Option<BodyPose> {
        let body = self.bodies.get(handle)?;
        let translation = body.translation();
        Some(BodyPose {
            x: translation.x,
            y: translation.y,
            angle: body.rotation().angle(),
        })
    }

    /// Number of bodies in the world
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of colliders in the world
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Steps taken so far
    pub fn steps(&self) -> u64 {
        self.steps
    }
}

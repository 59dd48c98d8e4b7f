//! Keeps the physics world in step with entity physics components
//!
//! Every entity with a physics component is shadowed by exactly one body,
//! keyed by the entity's visible id. Each reconcile pass:
//!
//! 1. (re)builds a body when none exists or the component's fingerprint
//!    changed, then copies the body's pose back onto the entity
//! 2. destroys bodies whose entity dropped its physics component
//! 3. destroys bodies whose entity is no longer in the set (orphan sweep)
//!
//! Unchanged components never rebuild, so a pass over a stable set creates
//! and destroys nothing. A component that failed to build is not retried
//! until its fingerprint or the entity's bounding box changes.

use std::collections::{HashMap, HashSet};

use rapier2d::prelude::RigidBodyHandle;

use super::world::{BodySpec, PhysicsWorld};
use super::PhysicsError;
use crate::foundation::collections::{new_key_type, KeyedArena};
use crate::foundation::math::Vec2;
use crate::scene::entity::{BodyType, Entity, EntityPatch, PhysicsComponent, Point};

new_key_type! {
    /// Handle to a shadow body record
    pub struct BodyKey;
}

/// Identity of a physics component's numeric configuration
///
/// Floats are compared bit for bit, so any edit (even `0.0` to `-0.0`)
/// triggers a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyFingerprint {
    body_type: BodyType,
    density: u32,
    friction: u32,
    restitution: u32,
    fixed_rotation: bool,
}

impl From<&PhysicsComponent> for BodyFingerprint {
    fn from(component: &PhysicsComponent) -> Self {
        Self {
            body_type: component.body_type,
            density: component.density.to_bits(),
            friction: component.friction.to_bits(),
            restitution: component.restitution.to_bits(),
            fixed_rotation: component.fixed_rotation,
        }
    }
}

/// Inputs of a spawn attempt that was rejected
type FailedSpawn = (BodyFingerprint, [u32; 2]);

#[derive(Debug)]
struct ShadowBody {
    handle: RigidBodyHandle,
    fingerprint: BodyFingerprint,
}

/// Outcome of one reconcile pass
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Bodies built this pass
    pub created: usize,
    /// Bodies destroyed this pass, for any reason
    pub destroyed: usize,
    /// Bodies destroyed because their entity vanished
    pub orphans: usize,
    /// Entity pose updates copied back from bodies
    pub updates: Vec<(String, EntityPatch)>,
    /// Bodies that could not be built
    pub failures: Vec<PhysicsError>,
}

/// Shadows entity physics components with simulation bodies
pub struct PhysicsBridge {
    world: PhysicsWorld,
    bodies: KeyedArena<BodyKey, ShadowBody>,
    failed: HashMap<String, FailedSpawn>,
    min_spawn_y: f32,
}

impl PhysicsBridge {
    /// Create a bridge over an empty world
    pub fn new(gravity: Vec2, min_spawn_y: f32) -> Self {
        Self {
            world: PhysicsWorld::new(gravity),
            bodies: KeyedArena::new(),
            failed: HashMap::new(),
            min_spawn_y,
        }
    }

    /// Advance the simulation
    pub fn step(&mut self, dt: f32) {
        self.world.step(dt);
    }

    /// The underlying world
    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    /// Number of shadow bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Whether an entity id currently owns a body
    pub fn has_body(&self, entity_id: &str) -> bool {
        self.bodies.contains(entity_id)
    }

    /// Whether an entity id is waiting on an edit after a failed spawn
    pub fn has_failed(&self, entity_id: &str) -> bool {
        self.failed.contains_key(entity_id)
    }

    /// Reconcile bodies against `entities`
    pub fn reconcile<'a>(
        &mut self,
        entities: impl IntoIterator<Item = &'a mut Entity>,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut seen = HashSet::new();

        for entity in entities {
            seen.insert(entity.id.clone());
            let Some(component) = entity.physics() else {
                self.failed.remove(&entity.id);
                if let Some(stale) = self.bodies.remove(&entity.id) {
                    log::debug!("Entity '{}' dropped its physics component", entity.id);
                    self.world.remove_body(stale.handle);
                    report.destroyed += 1;
                }
                continue;
            };

            let fingerprint = BodyFingerprint::from(component);
            let (hx, hy) = entity.half_extents();
            let attempt = (fingerprint, [hx.to_bits(), hy.to_bits()]);
            if self.failed.get(&entity.id) == Some(&attempt) {
                continue;
            }
            let current = self
                .bodies
                .get(&entity.id)
                .filter(|body| body.fingerprint == fingerprint)
                .map(|body| body.handle);

            let handle = match current {
                Some(handle) => handle,
                None => {
                    if let Some(stale) = self.bodies.remove(&entity.id) {
                        self.world.remove_body(stale.handle);
                        report.destroyed += 1;
                    }
                    match self.spawn(entity, component) {
                        Ok(handle) => {
                            self.failed.remove(&entity.id);
                            self.bodies.insert(entity.id.clone(), ShadowBody { handle, fingerprint });
                            report.created += 1;
                            handle
                        }
                        Err(e) => {
                            log::warn!("{e}");
                            self.failed.insert(entity.id.clone(), attempt);
                            report.failures.push(e);
                            continue;
                        }
                    }
                }
            };

            if let Some(patch) = self.copy_back(entity, handle) {
                report.updates.push((entity.id.clone(), patch));
            }
        }

        self.failed.retain(|id, _| seen.contains(id));
        let orphans: Vec<String> = self
            .bodies
            .ids()
            .into_iter()
            .filter(|id| !seen.contains(id))
            .collect();
        for id in orphans {
            if let Some(orphan) = self.bodies.remove(&id) {
                log::debug!("Sweeping orphan body of '{id}'");
                self.world.remove_body(orphan.handle);
                report.destroyed += 1;
                report.orphans += 1;
            }
        }

        report
    }

    /// Destroy every body
    pub fn clear(&mut self) {
        for body in self.bodies.values() {
            self.world.remove_body(body.handle);
        }
        self.bodies.clear();
        self.failed.clear();
    }

    fn spawn(
        &mut self,
        entity: &Entity,
        component: &PhysicsComponent,
    ) -> Result<RigidBodyHandle, PhysicsError> {
        if let Some(reason) = component.invalid_reason() {
            return Err(PhysicsError::BodyCreation {
                entity: entity.id.clone(),
                reason,
            });
        }
        let (hx, hy) = entity.half_extents();
        if !(hx.is_finite() && hy.is_finite() && hx > 0.0 && hy > 0.0) {
            return Err(PhysicsError::BodyCreation {
                entity: entity.id.clone(),
                reason: format!("bounding box {}x{} is not positive", hx * 2.0, hy * 2.0),
            });
        }

        let spec = BodySpec {
            body_type: component.body_type,
            position: Vec2::new(entity.position.x, entity.position.y.max(self.min_spawn_y)),
            angle: entity.rotation.unwrap_or(0.0),
            half_extents: Vec2::new(hx, hy),
            density: component.density,
            friction: component.friction,
            restitution: component.restitution,
            fixed_rotation: component.fixed_rotation,
        };
        log::trace!("Spawning {:?} body for '{}'", spec.body_type, entity.id);
        Ok(self.world.create_body(&spec))
    }

    /// Write the body's pose onto the entity; `None` if nothing changed
    fn copy_back(&self, entity: &mut Entity, handle: RigidBodyHandle) -> Option<EntityPatch> {
        let pose = self.world.pose(handle)?;
        let position = Point::new(pose.x, pose.y);
        if entity.position == position && entity.rotation == Some(pose.angle) {
            return None;
        }
        let patch = EntityPatch {
            position: Some(position),
            rotation: Some(pose.angle),
            ..EntityPatch::default()
        };
        entity.apply_patch(&patch);
        Some(patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bridge() -> PhysicsBridge {
        PhysicsBridge::new(Vec2::new(0.0, -9.81), 0.0)
    }

    fn scene() -> Vec<Entity> {
        vec![
            Entity::sprite("ball")
                .at(0.0, 10.0)
                .with_size(1.0, 1.0)
                .with_physics(PhysicsComponent::dynamic()),
            Entity::sprite("floor")
                .at(0.0, -50.0)
                .with_size(200.0, 2.0)
                .with_physics(PhysicsComponent::fixed()),
            Entity::sprite("decor"),
        ]
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut bridge = bridge();
        let mut entities = scene();

        let first = bridge.reconcile(entities.iter_mut());
        let second = bridge.reconcile(entities.iter_mut());

        assert_eq!(first.created, 2);
        assert_eq!(second.created, 0);
        assert_eq!(second.destroyed, 0);
        assert_eq!(bridge.body_count(), 2);
    }

    #[test]
    fn test_no_body_without_component() {
        let mut bridge = bridge();
        let mut entities = scene();
        bridge.reconcile(entities.iter_mut());

        entities[0].remove_physics();
        let report = bridge.reconcile(entities.iter_mut());

        assert_eq!(report.destroyed, 1);
        assert!(!bridge.has_body("ball"));
        assert!(!bridge.has_body("decor"));
        for entity in &entities {
            assert_eq!(bridge.has_body(&entity.id), entity.physics().is_some());
        }
    }

    #[test]
    fn test_fingerprint_change_rebuilds() {
        let mut bridge = bridge();
        let mut entities = scene();
        bridge.reconcile(entities.iter_mut());

        if let Some(crate::scene::entity::Component::Physics(p)) = entities[0].components.first_mut() {
            p.restitution = 0.8;
        }
        let report = bridge.reconcile(entities.iter_mut());

        assert_eq!(report.created, 1);
        assert_eq!(report.destroyed, 1);
        assert_eq!(bridge.world().body_count(), 2);
    }

    #[test]
    fn test_orphans_are_swept() {
        let mut bridge = bridge();
        let mut entities = scene();
        bridge.reconcile(entities.iter_mut());

        let mut remaining = vec![entities.remove(1)];
        let report = bridge.reconcile(remaining.iter_mut());

        assert_eq!(report.orphans, 1);
        assert!(!bridge.has_body("ball"));
        assert_eq!(bridge.world().body_count(), 1);
    }

    #[test]
    fn test_spawn_clamps_y_and_copies_pose_back() {
        let mut bridge = PhysicsBridge::new(Vec2::zeros(), 5.0);
        let mut entities = vec![Entity::sprite("low")
            .at(3.0, -20.0)
            .with_physics(PhysicsComponent::dynamic())];
        entities[0].rotation = Some(0.25);

        let report = bridge.reconcile(entities.iter_mut());

        assert_relative_eq!(entities[0].position.y, 5.0);
        assert_relative_eq!(entities[0].position.x, 3.0);
        assert_relative_eq!(entities[0].rotation.unwrap(), 0.25, epsilon = 1e-6);
        assert_eq!(report.updates.len(), 1);
        assert_eq!(report.updates[0].0, "low");
    }

    #[test]
    fn test_step_moves_dynamic_bodies() {
        let mut bridge = bridge();
        let mut entities = scene();
        bridge.reconcile(entities.iter_mut());

        for _ in 0..10 {
            bridge.step(1.0 / 60.0);
        }
        let report = bridge.reconcile(entities.iter_mut());

        assert!(entities[0].position.y < 10.0);
        assert!(report.updates.iter().any(|(id, _)| id == "ball"));
        assert!(!report.updates.iter().any(|(id, _)| id == "floor"));
    }

    #[test]
    fn test_invalid_parameters_fail_without_body() {
        let mut bridge = bridge();
        let mut broken = PhysicsComponent::dynamic();
        broken.density = -2.0;
        let mut entities = vec![
            Entity::sprite("bad").with_physics(broken),
            Entity::sprite("flat").with_size(0.0, 10.0).with_physics(PhysicsComponent::dynamic()),
        ];

        let report = bridge.reconcile(entities.iter_mut());

        assert_eq!(report.failures.len(), 2);
        assert_eq!(bridge.body_count(), 0);
        assert!(matches!(report.failures[0], PhysicsError::BodyCreation { ref entity, .. } if entity == "bad"));
    }

    #[test]
    fn test_failed_spawn_waits_for_an_edit() {
        let mut bridge = bridge();
        let mut broken = PhysicsComponent::dynamic();
        broken.density = -2.0;
        let mut entities = vec![Entity::sprite("bad").with_physics(broken)];

        let failures: usize = (0..5)
            .map(|_| bridge.reconcile(entities.iter_mut()).failures.len())
            .sum();
        assert_eq!(failures, 1);
        assert!(bridge.has_failed("bad"));

        if let Some(crate::scene::entity::Component::Physics(p)) = entities[0].components.first_mut() {
            p.density = 1.0;
        }
        let report = bridge.reconcile(entities.iter_mut());

        assert_eq!(report.created, 1);
        assert!(report.failures.is_empty());
        assert!(bridge.has_body("bad"));
        assert!(!bridge.has_failed("bad"));
    }

    #[test]
    fn test_failed_spawn_retries_after_resize_and_forgets_vanished_entities() {
        let mut bridge = bridge();
        let mut entities =
            vec![Entity::sprite("flat").with_size(0.0, 10.0).with_physics(PhysicsComponent::dynamic())];
        assert_eq!(bridge.reconcile(entities.iter_mut()).failures.len(), 1);
        assert!(bridge.reconcile(entities.iter_mut()).failures.is_empty());

        entities[0] = entities[0].clone().with_size(4.0, 10.0);
        assert_eq!(bridge.reconcile(entities.iter_mut()).created, 1);

        let mut broken = PhysicsComponent::dynamic();
        broken.friction = -1.0;
        let mut others = vec![Entity::sprite("gone").with_physics(broken)];
        bridge.reconcile(others.iter_mut());
        assert!(bridge.has_failed("gone"));

        bridge.reconcile(std::iter::empty::<&mut Entity>());
        assert!(!bridge.has_failed("gone"));
    }
}

//! Throttled entity update dispatch
//!
//! Physics and animation mutate entities every tick; the external state
//! store only needs to hear about it at a bounded rate. Patches are merged
//! per entity and handed to an [`EntityUpdateSink`] at most once per
//! configured interval.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::foundation::time::Throttle;
use crate::scene::entity::EntityPatch;

/// Consumer of entity updates (the external state store)
///
/// Delivery is fire-and-forget: the sink has no way to reject an update.
pub trait EntityUpdateSink {
    /// Apply a partial update to `entity_id` in `scene_id`
    fn update_entity(&mut self, scene_id: &str, entity_id: &str, patch: &EntityPatch);
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EntityUpdateSink for NullSink {
    fn update_entity(&mut self, _scene_id: &str, _entity_id: &str, _patch: &EntityPatch) {}
}

/// One delivered update
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchedUpdate {
    /// Owning scene
    pub scene_id: String,
    /// Entity id within the scene
    pub entity_id: String,
    /// Merged patch
    pub patch: EntityPatch,
}

/// Sink that keeps every update it receives
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    updates: Vec<DispatchedUpdate>,
}

impl RecordingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Every update received so far
    pub fn updates(&self) -> &[DispatchedUpdate] {
        &self.updates
    }

    /// Latest update received for an entity
    pub fn latest(&self, scene_id: &str, entity_id: &str) -> Option<&EntityPatch> {
        self.updates
            .iter()
            .rev()
            .find(|u| u.scene_id == scene_id && u.entity_id == entity_id)
            .map(|u| &u.patch)
    }
}

impl EntityUpdateSink for RecordingSink {
    fn update_entity(&mut self, scene_id: &str, entity_id: &str, patch: &EntityPatch) {
        self.updates.push(DispatchedUpdate {
            scene_id: scene_id.to_string(),
            entity_id: entity_id.to_string(),
            patch: patch.clone(),
        });
    }
}

/// Merges patches and releases them at a bounded rate
#[derive(Debug)]
pub struct ThrottledDispatcher {
    throttle: Throttle,
    pending: BTreeMap<(String, String), EntityPatch>,
    flushes: u64,
}

impl ThrottledDispatcher {
    /// Create a dispatcher that flushes at most once per `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            throttle: Throttle::new(interval),
            pending: BTreeMap::new(),
            flushes: 0,
        }
    }

    /// Queue a patch; later fields win over earlier queued ones
    pub fn queue(&mut self, scene_id: &str, entity_id: &str, patch: EntityPatch) {
        if patch.is_empty() {
            return;
        }
        self.pending
            .entry((scene_id.to_string(), entity_id.to_string()))
            .or_default()
            .merge(patch);
    }

    /// Drop queued patches for a scene
    pub fn forget_scene(&mut self, scene_id: &str) {
        self.pending.retain(|(scene, _), _| scene != scene_id);
    }

    /// Number of entities with queued changes
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Flushes performed so far
    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    /// Deliver queued patches if the interval has elapsed
    ///
    /// Returns the number of entities delivered; zero when throttled or
    /// when nothing is queued.
    pub fn flush(&mut self, now: Duration, sink: &mut dyn EntityUpdateSink) -> usize {
        if self.pending.is_empty() || !self.throttle.try_fire(now) {
            return 0;
        }
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        for ((scene_id, entity_id), patch) in &pending {
            sink.update_entity(scene_id, entity_id, patch);
        }
        self.flushes += 1;
        log::trace!("Dispatched {count} entity updates");
        count
    }
}

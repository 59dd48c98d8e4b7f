//! Editor-level entity resolution
//!
//! Decides, per frame, which entities are visible and where they come from.
//! Entities borrowed from scenes other than the current one get their ids
//! remapped so they cannot collide with the current scene's ids.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scene::entity::Entity;
use crate::scene::lifecycle::SceneLifecycleManager;
use crate::scene::model::Scene;

/// How entities from several scenes are merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositionMode {
    /// Current scene only
    #[default]
    Default,
    /// Current scene plus every selected scene
    Overlay,
    /// Current scene plus every locked scene
    Mixed,
}

/// Composition selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompositionState {
    /// Merge policy
    pub mode: CompositionMode,
    /// Scenes merged in overlay mode, in selection order
    pub selected_scenes: Vec<String>,
    /// Scenes merged in mixed mode
    pub locked_scenes: BTreeMap<String, bool>,
}

impl CompositionState {
    /// Overlay the given scenes
    pub fn overlay<I, S>(scenes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = Self {
            mode: CompositionMode::Overlay,
            ..Self::default()
        };
        for scene in scenes {
            state.select(scene);
        }
        state
    }

    /// Mixed mode with nothing locked yet
    pub fn mixed() -> Self {
        Self {
            mode: CompositionMode::Mixed,
            ..Self::default()
        }
    }

    /// Add a scene to the selection; selecting twice is a no-op
    pub fn select(&mut self, scene: impl Into<String>) {
        let scene = scene.into();
        if !self.selected_scenes.contains(&scene) {
            self.selected_scenes.push(scene);
        }
    }

    /// Remove a scene from the selection
    pub fn deselect(&mut self, scene: &str) {
        self.selected_scenes.retain(|s| s != scene);
    }

    /// Lock or unlock a scene
    pub fn set_locked(&mut self, scene: impl Into<String>, locked: bool) {
        self.locked_scenes.insert(scene.into(), locked);
    }

    /// Whether a scene is locked
    pub fn is_locked(&self, scene: &str) -> bool {
        self.locked_scenes.get(scene).copied().unwrap_or(false)
    }
}

/// A visible entity and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntity {
    /// The entity, id possibly remapped
    pub entity: Entity,
    /// Scene the entity belongs to
    pub source_scene: String,
    /// Id inside the source scene
    pub source_id: String,
    /// True for the current scene's entities
    pub live: bool,
}

impl ResolvedEntity {
    fn live(scene: &Scene, entity: &Entity) -> Self {
        Self {
            entity: entity.clone(),
            source_scene: scene.id().to_string(),
            source_id: entity.id.clone(),
            live: true,
        }
    }

    fn remapped(scene: &Scene, entity: &Entity, prefix: &str) -> Self {
        let mut copy = entity.clone();
        copy.id = format!("{prefix}_{}_{}", scene.id(), entity.id);
        Self {
            entity: copy,
            source_scene: scene.id().to_string(),
            source_id: entity.id.clone(),
            live: false,
        }
    }

    /// Id the entity is visible under this frame
    pub fn id(&self) -> &str {
        &self.entity.id
    }
}

/// Resolve the visible entity set
///
/// - `Default`: the current scene's entities
/// - `Overlay`: the current scene's entities, then every other selected scene
///   with ids remapped to `scene_<sceneId>_<entityId>`
/// - `Mixed`: the current scene's entities, then every locked scene other than
///   the current one with ids remapped to `locked_<sceneId>_<entityId>`
///
/// Selected or locked ids that are not registered are skipped.
pub fn resolve_entities(
    state: &CompositionState,
    current_scene: Option<&str>,
    scenes: &SceneLifecycleManager,
) -> Vec<ResolvedEntity> {
    let current = current_scene.and_then(|id| {
        let scene = scenes.get_scene(id);
        if scene.is_none() {
            log::debug!("Current scene '{id}' is not registered");
        }
        scene
    });

    let mut resolved: Vec<ResolvedEntity> = current
        .map(|scene| {
            scene
                .entities()
                .values()
                .map(|entity| ResolvedEntity::live(scene, entity))
                .collect()
        })
        .unwrap_or_default();

    let borrowed: Vec<(&str, &'static str)> = match state.mode {
        CompositionMode::Default => Vec::new(),
        CompositionMode::Overlay => state
            .selected_scenes
            .iter()
            .map(|id| (id.as_str(), "scene"))
            .collect(),
        CompositionMode::Mixed => state
            .locked_scenes
            .iter()
            .filter(|(_, locked)| **locked)
            .map(|(id, _)| (id.as_str(), "locked"))
            .collect(),
    };

    for (scene_id, prefix) in borrowed {
        if Some(scene_id) == current_scene {
            continue;
        }
        let Some(scene) = scenes.get_scene(scene_id) else {
            log::debug!("Skipping unregistered scene '{scene_id}' in {:?} composition", state.mode);
            continue;
        };
        resolved.extend(
            scene
                .entities()
                .values()
                .map(|entity| ResolvedEntity::remapped(scene, entity, prefix)),
        );
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::model::SceneDescriptor;

    fn registry() -> SceneLifecycleManager {
        let mut scenes = SceneLifecycleManager::new();
        scenes.create_scene(
            SceneDescriptor::new("A")
                .with_entity(Entity::sprite("a1"))
                .with_entity(Entity::sprite("a2")),
        );
        scenes.create_scene(SceneDescriptor::new("B").with_entity(Entity::sprite("b1")));
        scenes.create_scene(SceneDescriptor::new("C").with_entity(Entity::sprite("c1")));
        scenes
    }

    fn ids(resolved: &[ResolvedEntity]) -> Vec<&str> {
        resolved.iter().map(ResolvedEntity::id).collect()
    }

    #[test]
    fn test_default_returns_current_scene_only() {
        let scenes = registry();
        let resolved = resolve_entities(&CompositionState::default(), Some("A"), &scenes);
        assert_eq!(ids(&resolved), vec!["a1", "a2"]);
        assert!(resolved.iter().all(|r| r.live));
    }

    #[test]
    fn test_overlay_prefixes_other_selected_scenes() {
        let scenes = registry();
        let state = CompositionState::overlay(["A", "B"]);

        let resolved = resolve_entities(&state, Some("A"), &scenes);

        assert_eq!(ids(&resolved), vec!["a1", "a2", "scene_B_b1"]);
        assert_eq!(resolved[2].source_scene, "B");
        assert_eq!(resolved[2].source_id, "b1");
        assert!(!resolved[2].live);
    }

    #[test]
    fn test_overlay_includes_current_scene_even_if_unselected() {
        let scenes = registry();
        let state = CompositionState::overlay(["C", "ghost"]);

        let resolved = resolve_entities(&state, Some("A"), &scenes);

        assert_eq!(ids(&resolved), vec!["a1", "a2", "scene_C_c1"]);
    }

    #[test]
    fn test_mixed_adds_locked_scenes_except_current() {
        let scenes = registry();
        let mut state = CompositionState::mixed();
        state.set_locked("A", true);
        state.set_locked("B", false);
        state.set_locked("C", true);

        let resolved = resolve_entities(&state, Some("A"), &scenes);

        assert_eq!(ids(&resolved), vec!["a1", "a2", "locked_C_c1"]);
    }

    #[test]
    fn test_no_current_scene() {
        let scenes = registry();
        let state = CompositionState::overlay(["B"]);
        assert_eq!(ids(&resolve_entities(&state, None, &scenes)), vec!["scene_B_b1"]);
        assert!(resolve_entities(&CompositionState::default(), None, &scenes).is_empty());
    }

    #[test]
    fn test_selection_is_a_set() {
        let mut state = CompositionState::overlay(["B", "B"]);
        assert_eq!(state.selected_scenes, vec!["B"]);
        state.deselect("B");
        assert!(state.selected_scenes.is_empty());
    }
}

//! Scene data model

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKey, EntityPatch};
use super::error::SceneError;
use super::hooks::{self, HookContext, HookKind, SceneHooks};
use crate::animation::AnimationClip;
use crate::assets::{AssetRef, LoadedAsset};
use crate::composition::CompositionModes;
use crate::foundation::collections::{new_key_type, KeyedArena};
use crate::foundation::time::unix_millis;

new_key_type! {
    /// Generation-checked handle to a registered scene
    pub struct SceneKey;
}

/// Entities of one scene, addressable by id and by key
pub type EntityTable = KeyedArena<EntityKey, Entity>;

/// Lifecycle state of a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SceneState {
    /// Registered, nothing fetched yet
    Created,
    /// Dependencies and assets are being fetched
    Loading,
    /// Ready to activate
    Loaded,
    /// Receiving ticks
    Active,
    /// Activated but not receiving ticks
    Paused,
    /// Switched off; may be activated again
    Deactivated,
    /// Torn down
    Destroyed,
}

impl SceneState {
    /// Every state in lifecycle order
    pub const ALL: [Self; 7] = [
        Self::Created,
        Self::Loading,
        Self::Loaded,
        Self::Active,
        Self::Paused,
        Self::Deactivated,
        Self::Destroyed,
    ];

    /// Upper-case name as used in logs
    pub fn name(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Loading => "LOADING",
            Self::Loaded => "LOADED",
            Self::Active => "ACTIVE",
            Self::Paused => "PAUSED",
            Self::Deactivated => "DEACTIVATED",
            Self::Destroyed => "DESTROYED",
        }
    }
}

impl fmt::Display for SceneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a scene's pixels combine with what is already drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Source-over alpha blending
    #[default]
    Normal,
    /// Colors add up
    Additive,
    /// Colors multiply
    Multiply,
    /// Inverse multiply
    Screen,
}

/// How a scene takes part in composition
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionMetadata {
    /// Draw order among layered scenes; lower draws first
    pub layer_priority: i32,
    /// Hidden scenes are not drawn
    pub visible: bool,
    /// Multiplies the alpha of everything the scene draws
    pub opacity: f32,
    /// Blend mode used when compositing the scene
    pub blend_mode: BlendMode,
    /// Composition groups the scene declares
    pub composition_modes: CompositionModes,
}

impl Default for CompositionMetadata {
    fn default() -> Self {
        Self {
            layer_priority: 0,
            visible: true,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            composition_modes: CompositionModes::LAYERED,
        }
    }
}

/// Everything needed to create a scene
pub struct SceneDescriptor {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) entities: Vec<Entity>,
    pub(crate) animations: HashMap<String, AnimationClip>,
    pub(crate) composition: CompositionMetadata,
    pub(crate) dependencies: Vec<String>,
    pub(crate) assets: Vec<AssetRef>,
    pub(crate) auto_start: bool,
    pub(crate) hooks: Option<Box<dyn SceneHooks>>,
    pub(crate) created_at: Option<u64>,
}

impl SceneDescriptor {
    /// Describe a scene named after its id
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            entities: Vec::new(),
            animations: HashMap::new(),
            composition: CompositionMetadata::default(),
            dependencies: Vec::new(),
            assets: Vec::new(),
            auto_start: false,
            hooks: None,
            created_at: None,
        }
    }

    /// Set the display name (builder pattern)
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add an entity (builder pattern)
    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Add several entities (builder pattern)
    pub fn with_entities(mut self, entities: impl IntoIterator<Item = Entity>) -> Self {
        self.entities.extend(entities);
        self
    }

    /// Add an animation clip (builder pattern)
    pub fn with_animation(mut self, name: impl Into<String>, clip: AnimationClip) -> Self {
        self.animations.insert(name.into(), clip);
        self
    }

    /// Set composition metadata (builder pattern)
    pub fn with_composition(mut self, composition: CompositionMetadata) -> Self {
        self.composition = composition;
        self
    }

    /// Declare a scene that must load first (builder pattern)
    pub fn with_dependency(mut self, scene_id: impl Into<String>) -> Self {
        self.dependencies.push(scene_id.into());
        self
    }

    /// Declare an asset to preload (builder pattern)
    pub fn with_asset(mut self, asset: AssetRef) -> Self {
        self.assets.push(asset);
        self
    }

    /// Activate right after loading (builder pattern)
    pub fn auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    /// Attach lifecycle hooks (builder pattern)
    pub fn with_hooks(mut self, hooks: impl SceneHooks + 'static) -> Self {
        self.hooks = Some(Box::new(hooks));
        self
    }

    /// Scene id
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// A registered scene
pub struct Scene {
    id: String,
    name: String,
    entities: EntityTable,
    animations: HashMap<String, AnimationClip>,
    composition: CompositionMetadata,
    state: SceneState,
    dependencies: Vec<String>,
    assets: Vec<AssetRef>,
    loaded_assets: HashMap<String, LoadedAsset>,
    auto_start: bool,
    hooks: Option<Box<dyn SceneHooks>>,
    created_at: u64,
    updated_at: u64,
    loaded_at: Option<u64>,
    activated_at: Option<u64>,
    unusable: bool,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("entities", &self.entities.len())
            .field("animations", &self.animations.len())
            .field("composition", &self.composition)
            .field("has_hooks", &self.hooks.is_some())
            .field("unusable", &self.unusable)
            .finish()
    }
}

impl Scene {
    pub(crate) fn from_descriptor(descriptor: SceneDescriptor) -> Self {
        let now = unix_millis();
        let mut entities = EntityTable::new();
        for entity in descriptor.entities {
            let id = entity.id.clone();
            if entities.insert(id.clone(), entity).1.is_some() {
                log::warn!("Scene '{}' declares entity '{id}' twice; keeping the last", descriptor.id);
            }
        }
        Self {
            id: descriptor.id,
            name: descriptor.name,
            entities,
            animations: descriptor.animations,
            composition: descriptor.composition,
            state: SceneState::Created,
            dependencies: descriptor.dependencies,
            assets: descriptor.assets,
            loaded_assets: HashMap::new(),
            auto_start: descriptor.auto_start,
            hooks: descriptor.hooks,
            created_at: descriptor.created_at.unwrap_or(now),
            updated_at: now,
            loaded_at: None,
            activated_at: None,
            unusable: false,
        }
    }

    /// Scene id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state
    pub fn state(&self) -> SceneState {
        self.state
    }

    /// Whether a failed destroy left the scene unusable
    pub fn is_unusable(&self) -> bool {
        self.unusable
    }

    /// Whether the scene activates itself once loaded
    pub fn auto_starts(&self) -> bool {
        self.auto_start
    }

    /// Ids of scenes loaded before this one
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Declared preload assets
    pub fn assets(&self) -> &[AssetRef] {
        &self.assets
    }

    /// A preloaded asset by id
    pub fn loaded_asset(&self, id: &str) -> Option<&LoadedAsset> {
        self.loaded_assets.get(id)
    }

    /// Number of assets fetched during the last load
    pub fn loaded_asset_count(&self) -> usize {
        self.loaded_assets.len()
    }

    /// Composition metadata
    pub fn composition(&self) -> &CompositionMetadata {
        &self.composition
    }

    /// Composition metadata, mutably
    pub fn composition_mut(&mut self) -> &mut CompositionMetadata {
        &mut self.composition
    }

    /// Creation time in Unix milliseconds
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Last modification time in Unix milliseconds
    pub fn updated_at(&self) -> u64 {
        self.updated_at
    }

    /// When loading last completed
    pub fn loaded_at(&self) -> Option<u64> {
        self.loaded_at
    }

    /// When the scene was last activated
    pub fn activated_at(&self) -> Option<u64> {
        self.activated_at
    }

    /// The entity table
    pub fn entities(&self) -> &EntityTable {
        &self.entities
    }

    /// The entity table, mutably
    pub fn entities_mut(&mut self) -> &mut EntityTable {
        &mut self.entities
    }

    /// Number of entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Look up an entity
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Look up an entity, mutably
    pub fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Add or replace an entity
    pub fn insert_entity(&mut self, entity: Entity) -> EntityKey {
        self.touch();
        let id = entity.id.clone();
        self.entities.insert(id, entity).0
    }

    /// Remove an entity
    pub fn remove_entity(&mut self, id: &str) -> Option<Entity> {
        let removed = self.entities.remove(id);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    /// Apply a partial update to an entity; false if it does not exist
    pub fn apply_patch(&mut self, id: &str, patch: &EntityPatch) -> bool {
        let Some(entity) = self.entities.get_mut(id) else {
            return false;
        };
        entity.apply_patch(patch);
        self.touch();
        true
    }

    /// Animation clip table
    pub fn animations(&self) -> &HashMap<String, AnimationClip> {
        &self.animations
    }

    /// Add or replace an animation clip
    pub fn insert_animation(&mut self, name: impl Into<String>, clip: AnimationClip) {
        self.animations.insert(name.into(), clip);
        self.touch();
    }

    /// Refresh the modification timestamp
    pub fn touch(&mut self) {
        self.updated_at = unix_millis();
    }

    pub(crate) fn set_state(&mut self, state: SceneState) {
        log::info!("Scene '{}': {} -> {}", self.id, self.state, state);
        self.state = state;
    }

    pub(crate) fn mark_loaded(&mut self) {
        self.set_state(SceneState::Loaded);
        self.loaded_at = Some(unix_millis());
    }

    pub(crate) fn mark_activated(&mut self) {
        self.set_state(SceneState::Active);
        self.activated_at = Some(unix_millis());
    }

    pub(crate) fn mark_unusable(&mut self) {
        self.unusable = true;
    }

    pub(crate) fn store_asset(&mut self, asset: LoadedAsset) {
        self.loaded_assets.insert(asset.id.clone(), asset);
    }

    pub(crate) fn clear_loaded_assets(&mut self) {
        self.loaded_assets.clear();
    }

    /// Drop entities, clips and assets
    pub(crate) fn clear_contents(&mut self) {
        self.entities.clear();
        self.animations.clear();
        self.assets.clear();
        self.loaded_assets.clear();
    }

    /// Run one lifecycle hook through [`hooks::invoke`]
    pub(crate) fn run_hook(&mut self, kind: HookKind, delta: f32) -> Result<(), SceneError> {
        let mut ctx = HookContext {
            scene_id: &self.id,
            entities: &mut self.entities,
            delta,
        };
        hooks::invoke(self.hooks.as_deref_mut(), kind, &mut ctx)
    }
}

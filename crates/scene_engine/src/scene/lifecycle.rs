//! Scene lifecycle manager
//!
//! Owns the scene registry and drives every scene through
//! `CREATED → LOADING → LOADED → ACTIVE ⇄ PAUSED → DEACTIVATED → DESTROYED`.
//! `DEACTIVATED` scenes may be activated again.
//!
//! Failure policy:
//! - load: dependencies load first; any error rolls the scene back to
//!   `CREATED` and is returned, so the load can be retried
//! - preload assets: the scene's and every pending dependency's assets are
//!   fetched in one concurrent batch before any load hook runs; individual
//!   failures are logged
//! - destroy: a failing destroy hook is returned and leaves the scene
//!   unusable until it is evicted
//! - every other hook failure is logged and the scene keeps running

use std::collections::{BTreeMap, HashMap, HashSet};

use futures::executor::block_on;
use futures::future;

use super::error::SceneError;
use super::hooks::HookKind;
use super::model::{Scene, SceneDescriptor, SceneKey, SceneState};
use crate::assets::{load_all, AssetError, AssetLoader, AssetRef, LoadedAsset, MemoryAssetLoader};
use crate::foundation::collections::KeyedArena;

/// Registry statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneStats {
    /// Registered scenes
    pub total: usize,
    /// Scenes currently receiving ticks
    pub active: usize,
    /// Scene count per lifecycle state
    pub by_state: BTreeMap<SceneState, usize>,
    /// Entities across every registered scene
    pub total_entities: usize,
}

impl SceneStats {
    /// Number of scenes in `state`
    pub fn count(&self, state: SceneState) -> usize {
        self.by_state.get(&state).copied().unwrap_or(0)
    }
}

/// Fetch results per scene id, waiting to be stored by the scene's load
type Prefetched = HashMap<String, Vec<(AssetRef, Result<LoadedAsset, AssetError>)>>;

/// Owns every scene and its lifecycle
pub struct SceneLifecycleManager {
    scenes: KeyedArena<SceneKey, Scene>,
    active: Vec<String>,
    loader: Box<dyn AssetLoader>,
}

impl Default for SceneLifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneLifecycleManager {
    /// Create a manager whose preloads resolve against an empty memory store
    pub fn new() -> Self {
        Self::with_loader(Box::new(MemoryAssetLoader::new()))
    }

    /// Create a manager fetching preload assets through `loader`
    pub fn with_loader(loader: Box<dyn AssetLoader>) -> Self {
        Self {
            scenes: KeyedArena::new(),
            active: Vec::new(),
            loader,
        }
    }

    /// Replace the asset loader
    pub fn set_loader(&mut self, loader: Box<dyn AssetLoader>) {
        self.loader = loader;
    }

    /// Register a scene in `CREATED`
    ///
    /// Never fails: a failing preload hook is logged. Registering an id that
    /// already exists replaces the old scene without running its hooks.
    pub fn create_scene(&mut self, descriptor: SceneDescriptor) -> SceneKey {
        let mut scene = Scene::from_descriptor(descriptor);
        let id = scene.id().to_string();

        // Preload is non-fatal, so this only ever logs
        if let Err(e) = scene.run_hook(HookKind::Preload, 0.0) {
            log::warn!("{e}");
        }

        let (key, previous) = self.scenes.insert(id.clone(), scene);
        if let Some(previous) = previous {
            log::warn!("Scene '{id}' re-registered; dropping previous ({})", previous.state());
            self.active.retain(|a| *a != id);
        }
        log::info!("Scene '{id}' created");
        key
    }

    /// Load a `CREATED` scene
    ///
    /// The preload assets of this scene and of every dependency still in
    /// `CREATED` are fetched concurrently, then those dependencies load first
    /// and the load hook runs. On success the scene is `LOADED` (or `ACTIVE`
    /// when it auto-starts). On failure the scene is back in `CREATED` and the
    /// error is returned.
    pub fn load_scene(&mut self, id: &str) -> Result<(), SceneError> {
        let order = self.pending_load_order(id);
        let mut prefetched = self.prefetch(&order);
        self.load_prefetched(id, &mut prefetched)
    }

    /// `CREATED` scenes reachable from `id` through dependencies, dependencies
    /// before dependents
    fn pending_load_order(&self, id: &str) -> Vec<String> {
        fn visit(
            manager: &SceneLifecycleManager,
            id: &str,
            seen: &mut HashSet<String>,
            order: &mut Vec<String>,
        ) {
            if !seen.insert(id.to_string()) {
                return;
            }
            let Some(scene) = manager.scenes.get(id) else {
                return;
            };
            if scene.state() != SceneState::Created || scene.is_unusable() {
                return;
            }
            for dependency in scene.dependencies() {
                visit(manager, dependency, seen, order);
            }
            order.push(id.to_string());
        }

        let mut order = Vec::new();
        visit(self, id, &mut HashSet::new(), &mut order);
        order
    }

    /// Fetch the preload assets of every scene in `order` as one batch
    fn prefetch(&self, order: &[String]) -> Prefetched {
        let requests: Vec<(&str, Vec<AssetRef>)> = order
            .iter()
            .filter_map(|id| Some((id.as_str(), self.scenes.get(id)?.assets().to_vec())))
            .collect();
        let loader = self.loader.as_ref();
        let fetched = block_on(future::join_all(
            requests.iter().map(|(_, assets)| load_all(loader, assets)),
        ));
        log::trace!("Prefetched assets for {} scene(s)", requests.len());
        requests
            .into_iter()
            .map(|(id, _)| id.to_string())
            .zip(fetched)
            .collect()
    }

    fn load_prefetched(&mut self, id: &str, prefetched: &mut Prefetched) -> Result<(), SceneError> {
        let scene = self.usable_scene_mut(id)?;
        if scene.state() != SceneState::Created {
            return Err(transition_error(scene, "load"));
        }
        scene.set_state(SceneState::Loading);

        if let Err(e) = self.run_load(id, prefetched) {
            log::error!("Loading scene '{id}' failed, rolling back: {e}");
            if let Some(scene) = self.scenes.get_mut(id) {
                scene.clear_loaded_assets();
                scene.set_state(SceneState::Created);
            }
            return Err(e);
        }

        let scene = self.usable_scene_mut(id)?;
        scene.mark_loaded();
        if scene.auto_starts() {
            self.activate_scene(id)?;
        }
        Ok(())
    }

    fn run_load(&mut self, id: &str, prefetched: &mut Prefetched) -> Result<(), SceneError> {
        let dependencies = self.usable_scene_mut(id)?.dependencies().to_vec();
        for dependency in dependencies {
            let Some(dep) = self.scenes.get(&dependency) else {
                return Err(SceneError::DependencyNotFound {
                    scene: id.to_string(),
                    dependency,
                });
            };
            if dep.state() == SceneState::Created {
                log::debug!("Scene '{id}' loads dependency '{dependency}' first");
                self.load_prefetched(&dependency, prefetched)?;
            }
        }

        let assets = self.usable_scene_mut(id)?.assets().to_vec();
        let results = match prefetched.remove(id) {
            Some(results) => results,
            None => block_on(load_all(self.loader.as_ref(), &assets)),
        };

        let scene = self.usable_scene_mut(id)?;
        for (asset, result) in results {
            match result {
                Ok(loaded) => scene.store_asset(loaded),
                Err(e) => log::warn!("Scene '{id}' skipped asset '{}': {e}", asset.id),
            }
        }
        log::debug!(
            "Scene '{id}' preloaded {}/{} assets",
            scene.loaded_asset_count(),
            assets.len()
        );

        scene.run_hook(HookKind::Load, 0.0)
    }

    /// Activate a `LOADED` or `DEACTIVATED` scene
    ///
    /// The start hook runs only on the first activation after loading; the
    /// enable hook runs on every activation.
    pub fn activate_scene(&mut self, id: &str) -> Result<(), SceneError> {
        let scene = self.usable_scene_mut(id)?;
        let from = scene.state();
        if !matches!(from, SceneState::Loaded | SceneState::Deactivated) {
            return Err(transition_error(scene, "activate"));
        }

        if from == SceneState::Loaded {
            scene.run_hook(HookKind::Start, 0.0)?;
        }
        scene.run_hook(HookKind::Enable, 0.0)?;
        scene.mark_activated();

        if !self.active.iter().any(|a| a == id) {
            self.active.push(id.to_string());
        }
        Ok(())
    }

    /// Pause an `ACTIVE` scene
    pub fn pause_scene(&mut self, id: &str) -> Result<(), SceneError> {
        let scene = self.usable_scene_mut(id)?;
        if scene.state() != SceneState::Active {
            return Err(transition_error(scene, "pause"));
        }
        scene.run_hook(HookKind::Pause, 0.0)?;
        scene.set_state(SceneState::Paused);
        Ok(())
    }

    /// Resume a `PAUSED` scene
    pub fn resume_scene(&mut self, id: &str) -> Result<(), SceneError> {
        let scene = self.usable_scene_mut(id)?;
        if scene.state() != SceneState::Paused {
            return Err(transition_error(scene, "resume"));
        }
        scene.run_hook(HookKind::Resume, 0.0)?;
        scene.set_state(SceneState::Active);
        Ok(())
    }

    /// Deactivate an `ACTIVE` or `PAUSED` scene
    pub fn deactivate_scene(&mut self, id: &str) -> Result<(), SceneError> {
        let scene = self.usable_scene_mut(id)?;
        if !matches!(scene.state(), SceneState::Active | SceneState::Paused) {
            return Err(transition_error(scene, "deactivate"));
        }
        scene.run_hook(HookKind::Disable, 0.0)?;
        scene.set_state(SceneState::Deactivated);
        self.active.retain(|a| a != id);
        Ok(())
    }

    /// Tear a scene down and remove it from the registry
    ///
    /// Active or paused scenes are deactivated first. A failing destroy hook
    /// is returned and the scene stays registered but unusable. On success the
    /// removed scene is returned, emptied and in `DESTROYED`.
    pub fn destroy_scene(&mut self, id: &str) -> Result<Scene, SceneError> {
        let state = self.usable_scene_mut(id)?.state();
        if matches!(state, SceneState::Active | SceneState::Paused) {
            self.deactivate_scene(id)?;
        }

        let scene = self.usable_scene_mut(id)?;
        if let Err(e) = scene.run_hook(HookKind::Destroy, 0.0) {
            log::error!("Scene '{id}' left unusable: {e}");
            scene.mark_unusable();
            return Err(e);
        }

        self.active.retain(|a| a != id);
        let mut scene = self
            .scenes
            .remove(id)
            .ok_or_else(|| SceneError::SceneNotFound(id.to_string()))?;
        scene.clear_contents();
        scene.set_state(SceneState::Destroyed);
        Ok(scene)
    }

    /// Drop a scene without running any hooks
    ///
    /// The only way to get rid of a scene whose destroy hook failed.
    pub fn evict_scene(&mut self, id: &str) -> Option<Scene> {
        self.active.retain(|a| a != id);
        let scene = self.scenes.remove(id);
        if scene.is_some() {
            log::warn!("Scene '{id}' evicted without teardown");
        }
        scene
    }

    /// Run update then late-update hooks of every `ACTIVE` scene
    ///
    /// Scenes are visited in activation order. Hook failures are logged.
    pub fn update(&mut self, delta: f32) {
        for kind in [HookKind::Update, HookKind::LateUpdate] {
            for id in &self.active {
                let Some(scene) = self.scenes.get_mut(id) else {
                    continue;
                };
                if scene.state() != SceneState::Active || scene.is_unusable() {
                    continue;
                }
                // Update hooks are non-fatal; errors are logged inside
                let _ = scene.run_hook(kind, delta);
            }
        }
    }

    /// Look up a scene
    pub fn get_scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.get(id)
    }

    /// Look up a scene, mutably
    pub fn get_scene_mut(&mut self, id: &str) -> Option<&mut Scene> {
        self.scenes.get_mut(id)
    }

    /// Look up a scene by key; stale keys resolve to `None`
    pub fn get_scene_by_key(&self, key: SceneKey) -> Option<&Scene> {
        self.scenes.get_by_key(key)
    }

    /// Every registered scene in creation order
    pub fn get_all_scenes(&self) -> Vec<&Scene> {
        self.scenes.values().collect()
    }

    /// `ACTIVE` scenes in activation order
    pub fn get_active_scenes(&self) -> Vec<&Scene> {
        self.active
            .iter()
            .filter_map(|id| self.scenes.get(id))
            .filter(|scene| scene.state() == SceneState::Active)
            .collect()
    }

    /// Current state of a scene
    pub fn scene_state(&self, id: &str) -> Option<SceneState> {
        self.scenes.get(id).map(Scene::state)
    }

    /// Number of registered scenes
    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Registry statistics
    pub fn get_scene_stats(&self) -> SceneStats {
        let mut stats = SceneStats::default();
        for state in SceneState::ALL {
            stats.by_state.insert(state, 0);
        }
        for scene in self.scenes.values() {
            stats.total += 1;
            stats.total_entities += scene.entity_count();
            *stats.by_state.entry(scene.state()).or_insert(0) += 1;
        }
        stats.active = stats.count(SceneState::Active);
        stats
    }

    fn usable_scene_mut(&mut self, id: &str) -> Result<&mut Scene, SceneError> {
        let scene = self
            .scenes
            .get_mut(id)
            .ok_or_else(|| SceneError::SceneNotFound(id.to_string()))?;
        if scene.is_unusable() {
            return Err(SceneError::Unusable(id.to_string()));
        }
        Ok(scene)
    }
}

fn transition_error(scene: &Scene, action: &'static str) -> SceneError {
    SceneError::StateTransition {
        id: scene.id().to_string(),
        from: scene.state(),
        action,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetKind, AssetRef};
    use crate::scene::entity::Entity;
    use crate::scene::hooks::{HookContext, HookError, HookResult, SceneHooks};
    use std::cell::RefCell;
    use std::rc::Rc;

    type CallLog = Rc<RefCell<Vec<String>>>;

    /// Records every hook call; fails the ones listed in `fail`
    struct Recorder {
        calls: CallLog,
        fail: Vec<HookKind>,
    }

    impl Recorder {
        fn new(calls: &CallLog) -> Self {
            Self {
                calls: Rc::clone(calls),
                fail: Vec::new(),
            }
        }

        fn failing(mut self, kind: HookKind) -> Self {
            self.fail.push(kind);
            self
        }

        fn record(&self, kind: HookKind, ctx: &HookContext<'_>) -> HookResult {
            self.calls.borrow_mut().push(format!("{}:{kind}", ctx.scene_id));
            if self.fail.contains(&kind) {
                return Err(HookError::new(format!("{kind} failed")));
            }
            Ok(())
        }
    }

    impl SceneHooks for Recorder {
        fn on_load(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
            self.record(HookKind::Load, ctx)
        }
        fn on_start(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
            self.record(HookKind::Start, ctx)
        }
        fn on_enable(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
            self.record(HookKind::Enable, ctx)
        }
        fn on_update(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
            self.record(HookKind::Update, ctx)
        }
        fn on_late_update(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
            self.record(HookKind::LateUpdate, ctx)
        }
        fn on_pause(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
            self.record(HookKind::Pause, ctx)
        }
        fn on_destroy(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
            self.record(HookKind::Destroy, ctx)
        }
    }

    fn calls() -> CallLog {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn test_create_load_activate_yields_active() {
        let mut manager = SceneLifecycleManager::new();
        manager.create_scene(SceneDescriptor::new("a"));
        assert_eq!(manager.scene_state("a"), Some(SceneState::Created));

        manager.load_scene("a").unwrap();
        assert_eq!(manager.scene_state("a"), Some(SceneState::Loaded));
        assert!(manager.get_scene("a").unwrap().loaded_at().is_some());

        manager.activate_scene("a").unwrap();
        assert_eq!(manager.scene_state("a"), Some(SceneState::Active));
        assert_eq!(manager.get_active_scenes().len(), 1);
    }

    #[test]
    fn test_auto_start_activates_after_load() {
        let mut manager = SceneLifecycleManager::new();
        manager.create_scene(SceneDescriptor::new("a").auto_start(true));
        manager.load_scene("a").unwrap();
        assert_eq!(manager.scene_state("a"), Some(SceneState::Active));
    }

    #[test]
    fn test_invalid_transitions_are_rejected() {
        let mut manager = SceneLifecycleManager::new();
        manager.create_scene(SceneDescriptor::new("a"));

        let err = manager.activate_scene("a").unwrap_err();
        assert!(matches!(
            err,
            SceneError::StateTransition {
                from: SceneState::Created,
                action: "activate",
                ..
            }
        ));
        assert!(matches!(manager.pause_scene("a"), Err(SceneError::StateTransition { .. })));
        assert!(matches!(manager.load_scene("nope"), Err(SceneError::SceneNotFound(_))));

        manager.load_scene("a").unwrap();
        assert!(matches!(manager.load_scene("a"), Err(SceneError::StateTransition { .. })));
    }

    #[test]
    fn test_pause_resume_and_reactivation() {
        let log = calls();
        let mut manager = SceneLifecycleManager::new();
        manager.create_scene(SceneDescriptor::new("a").with_hooks(Recorder::new(&log)));
        manager.load_scene("a").unwrap();
        manager.activate_scene("a").unwrap();

        manager.pause_scene("a").unwrap();
        assert_eq!(manager.scene_state("a"), Some(SceneState::Paused));
        assert!(manager.get_active_scenes().is_empty());
        manager.resume_scene("a").unwrap();
        assert_eq!(manager.scene_state("a"), Some(SceneState::Active));

        manager.deactivate_scene("a").unwrap();
        manager.activate_scene("a").unwrap();

        let starts = log.borrow().iter().filter(|c| c.ends_with(":start")).count();
        let enables = log.borrow().iter().filter(|c| c.ends_with(":enable")).count();
        assert_eq!(starts, 1);
        assert_eq!(enables, 2);
    }

    #[test]
    fn test_non_fatal_hook_failure_keeps_scene_running() {
        let log = calls();
        let mut manager = SceneLifecycleManager::new();
        manager.create_scene(
            SceneDescriptor::new("a").with_hooks(Recorder::new(&log).failing(HookKind::Pause)),
        );
        manager.load_scene("a").unwrap();
        manager.activate_scene("a").unwrap();

        manager.pause_scene("a").unwrap();
        assert_eq!(manager.scene_state("a"), Some(SceneState::Paused));
    }

    #[test]
    fn test_dependencies_load_first() {
        let log = calls();
        let mut manager = SceneLifecycleManager::new();
        manager.create_scene(SceneDescriptor::new("shared").with_hooks(Recorder::new(&log)));
        manager.create_scene(
            SceneDescriptor::new("level")
                .with_dependency("shared")
                .with_hooks(Recorder::new(&log)),
        );

        manager.load_scene("level").unwrap();

        assert_eq!(manager.scene_state("shared"), Some(SceneState::Loaded));
        assert_eq!(*log.borrow(), vec!["shared:load", "level:load"]);
    }

    /// Logs each fetch into the shared call log as it is issued
    struct LoggingLoader {
        calls: CallLog,
        inner: MemoryAssetLoader,
    }

    impl AssetLoader for LoggingLoader {
        fn load<'a>(
            &'a self,
            asset: &'a AssetRef,
        ) -> futures::future::BoxFuture<'a, Result<LoadedAsset, AssetError>> {
            self.calls.borrow_mut().push(format!("fetch:{}", asset.uri));
            self.inner.load(asset)
        }
    }

    #[test]
    fn test_dependency_assets_are_fetched_in_one_batch() {
        let log = calls();
        let loader = LoggingLoader {
            calls: Rc::clone(&log),
            inner: MemoryAssetLoader::new()
                .with_asset("base.png", vec![1])
                .with_asset("shared.png", vec![2])
                .with_asset("level.png", vec![3]),
        };
        let mut manager = SceneLifecycleManager::with_loader(Box::new(loader));
        manager.create_scene(
            SceneDescriptor::new("base")
                .with_asset(AssetRef::new("base", AssetKind::Texture, "base.png"))
                .with_hooks(Recorder::new(&log)),
        );
        manager.create_scene(
            SceneDescriptor::new("shared")
                .with_dependency("base")
                .with_asset(AssetRef::new("shared", AssetKind::Texture, "shared.png"))
                .with_hooks(Recorder::new(&log)),
        );
        manager.create_scene(
            SceneDescriptor::new("level")
                .with_dependency("shared")
                .with_dependency("base")
                .with_asset(AssetRef::new("level", AssetKind::Texture, "level.png"))
                .with_hooks(Recorder::new(&log)),
        );

        manager.load_scene("level").unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "fetch:base.png",
                "fetch:shared.png",
                "fetch:level.png",
                "base:load",
                "shared:load",
                "level:load",
            ]
        );
        for (id, len) in [("base", 1), ("shared", 1), ("level", 1)] {
            let scene = manager.get_scene(id).unwrap();
            assert_eq!(scene.state(), SceneState::Loaded);
            assert_eq!(scene.loaded_asset(id).map(|a| a.bytes.len()), Some(len));
        }
    }

    #[test]
    fn test_missing_dependency_rolls_back() {
        let mut manager = SceneLifecycleManager::new();
        manager.create_scene(SceneDescriptor::new("level").with_dependency("ghost"));

        let err = manager.load_scene("level").unwrap_err();

        assert!(matches!(err, SceneError::DependencyNotFound { ref dependency, .. } if dependency == "ghost"));
        assert_eq!(manager.scene_state("level"), Some(SceneState::Created));
    }

    #[test]
    fn test_load_hook_failure_rolls_back_and_is_retryable() {
        let log = calls();
        let mut manager = SceneLifecycleManager::new();
        manager.create_scene(
            SceneDescriptor::new("a").with_hooks(Recorder::new(&log).failing(HookKind::Load)),
        );

        let err = manager.load_scene("a").unwrap_err();
        assert!(matches!(err, SceneError::HookFailure { hook: HookKind::Load, .. }));
        assert_eq!(manager.scene_state("a"), Some(SceneState::Created));

        // A second attempt runs the whole load again
        assert!(manager.load_scene("a").is_err());
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_failed_asset_does_not_abort_load() {
        let loader = MemoryAssetLoader::new().with_asset("hero.png", vec![1, 2, 3]);
        let mut manager = SceneLifecycleManager::with_loader(Box::new(loader));
        manager.create_scene(
            SceneDescriptor::new("a")
                .with_asset(AssetRef::new("hero", AssetKind::Texture, "hero.png"))
                .with_asset(AssetRef::new("missing", AssetKind::Audio, "missing.ogg")),
        );

        manager.load_scene("a").unwrap();

        let scene = manager.get_scene("a").unwrap();
        assert_eq!(scene.state(), SceneState::Loaded);
        assert_eq!(scene.loaded_asset("hero").map(|a| a.bytes.len()), Some(3));
        assert!(scene.loaded_asset("missing").is_none());
    }

    #[test]
    fn test_destroy_from_every_reachable_state() {
        let setups: [&[&str]; 5] = [
            &[],
            &["load"],
            &["load", "activate"],
            &["load", "activate", "pause"],
            &["load", "activate", "deactivate"],
        ];
        for steps in setups {
            let mut manager = SceneLifecycleManager::new();
            manager.create_scene(SceneDescriptor::new("a").with_entity(Entity::sprite("e")));
            for step in steps {
                match *step {
                    "load" => manager.load_scene("a").unwrap(),
                    "activate" => manager.activate_scene("a").unwrap(),
                    "pause" => manager.pause_scene("a").unwrap(),
                    "deactivate" => manager.deactivate_scene("a").unwrap(),
                    _ => unreachable!(),
                }
            }

            let destroyed = manager.destroy_scene("a").unwrap();

            assert_eq!(destroyed.state(), SceneState::Destroyed);
            assert_eq!(destroyed.entity_count(), 0);
            assert!(manager.get_all_scenes().is_empty());
            assert!(manager.get_active_scenes().is_empty());
        }
    }

    #[test]
    fn test_destroy_hook_failure_leaves_scene_unusable() {
        let log = calls();
        let mut manager = SceneLifecycleManager::new();
        manager.create_scene(
            SceneDescriptor::new("a").with_hooks(Recorder::new(&log).failing(HookKind::Destroy)),
        );

        let err = manager.destroy_scene("a").unwrap_err();
        assert!(matches!(err, SceneError::HookFailure { hook: HookKind::Destroy, .. }));
        assert!(manager.get_scene("a").unwrap().is_unusable());
        assert!(matches!(manager.load_scene("a"), Err(SceneError::Unusable(_))));

        assert!(manager.evict_scene("a").is_some());
        assert_eq!(manager.scene_count(), 0);
    }

    #[test]
    fn test_update_visits_active_scenes_in_activation_order() {
        let log = calls();
        let mut manager = SceneLifecycleManager::new();
        for id in ["b", "a", "c"] {
            manager.create_scene(SceneDescriptor::new(id).with_hooks(Recorder::new(&log)));
            manager.load_scene(id).unwrap();
        }
        manager.activate_scene("a").unwrap();
        manager.activate_scene("b").unwrap();
        manager.activate_scene("c").unwrap();
        manager.pause_scene("c").unwrap();
        log.borrow_mut().clear();

        manager.update(0.016);

        assert_eq!(
            *log.borrow(),
            vec!["a:update", "b:update", "a:late-update", "b:late-update"]
        );
    }

    #[test]
    fn test_scene_stats() {
        let mut manager = SceneLifecycleManager::new();
        manager.create_scene(SceneDescriptor::new("a").with_entity(Entity::sprite("e1")));
        manager.create_scene(
            SceneDescriptor::new("b")
                .with_entity(Entity::sprite("e2"))
                .with_entity(Entity::sprite("e3"))
                .auto_start(true),
        );
        manager.load_scene("b").unwrap();

        let stats = manager.get_scene_stats();

        assert_eq!(stats.total, 2);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.count(SceneState::Created), 1);
        assert_eq!(stats.count(SceneState::Destroyed), 0);
        assert_eq!(stats.total_entities, 3);
    }
}

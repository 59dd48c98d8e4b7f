//! Core engine implementation
//!
//! [`SimulationLoop`] is the context object that owns every subsystem of one
//! simulation instance. The host calls [`SimulationLoop::tick`] once per
//! display tick.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::animation::{AnimationError, AnimationOutcome, AnimationSystem};
use crate::assets::AssetError;
use crate::composition::{
    resolve_entities, CompositeRenderer, CompositionState, RenderMode, RenderStats,
};
use crate::core::config::{ConfigError, EngineConfig};
use crate::dispatch::{EntityUpdateSink, ThrottledDispatcher};
use crate::foundation::time::Timer;
use crate::physics::{PhysicsBridge, PhysicsError};
use crate::render::{FrameSubmission, Rasterizer, RenderError, SceneRenderer, SurfaceId};
use crate::scene::entity::EntityPatch;
use crate::scene::{DocumentError, Scene, SceneError, SceneLifecycleManager, SceneState};

/// Shareable "tick in progress" flag
///
/// Entering hands out a [`FrameToken`]; the gate reopens when the token drops.
/// A second entry while a token is alive fails instead of waiting.
#[derive(Debug, Clone, Default)]
pub struct FrameGate {
    busy: Arc<AtomicBool>,
}

impl FrameGate {
    /// Create an open gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate, or `None` if a tick is already running
    pub fn try_enter(&self) -> Option<FrameToken> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| FrameToken {
                busy: Arc::clone(&self.busy),
            })
    }

    /// Whether a tick currently holds the gate
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of holding a [`FrameGate`]
#[derive(Debug)]
pub struct FrameToken {
    busy: Arc<AtomicBool>,
}

impl Drop for FrameToken {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Clamped delta in seconds
    pub delta: f32,
    /// Entities in the resolved set
    pub entity_count: usize,
    /// Bodies built during reconciliation
    pub bodies_created: usize,
    /// Bodies destroyed during reconciliation
    pub bodies_destroyed: usize,
    /// Entities whose playback advanced
    pub animations_advanced: usize,
    /// Entity updates handed to the sink this tick
    pub dispatched: usize,
    /// Draw statistics; default when the frame failed to render
    pub render: RenderStats,
}

/// Result of a tick request
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The tick ran
    Ran(FrameReport),
    /// Another tick was in progress; this one was dropped
    Dropped,
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Scene lifecycle failure
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// Scene document failure
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Asset failure
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Physics failure
    #[error(transparent)]
    Physics(#[from] PhysicsError),

    /// Animation failure
    #[error(transparent)]
    Animation(#[from] AnimationError),

    /// Rendering failure
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Configuration failure
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One simulation instance
pub struct SimulationLoop {
    config: EngineConfig,
    scenes: SceneLifecycleManager,
    composition: CompositionState,
    current_scene: Option<String>,
    physics: PhysicsBridge,
    animation: AnimationSystem,
    renderer: SceneRenderer,
    compositor: CompositeRenderer,
    dispatcher: ThrottledDispatcher,
    timer: Timer,
    gate: FrameGate,
    simulation_enabled: bool,
    last_submission: FrameSubmission,
}

impl SimulationLoop {
    /// Create an engine with an empty scene registry
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_scenes(config, SceneLifecycleManager::new())
    }

    /// Create an engine around an existing scene registry
    pub fn with_scenes(
        config: EngineConfig,
        scenes: SceneLifecycleManager,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        log::info!("Initializing simulation loop...");
        let simulation = &config.simulation;
        Ok(Self {
            physics: PhysicsBridge::new(simulation.gravity, simulation.min_spawn_y),
            timer: Timer::new(simulation.max_delta_seconds),
            compositor: CompositeRenderer::new(config.render.frame_interval()),
            dispatcher: ThrottledDispatcher::new(config.dispatch.interval()),
            simulation_enabled: simulation.physics_enabled,
            animation: AnimationSystem::new(),
            renderer: SceneRenderer::new(),
            composition: CompositionState::default(),
            current_scene: None,
            gate: FrameGate::new(),
            last_submission: FrameSubmission::default(),
            scenes,
            config,
        })
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The scene registry
    pub fn scenes(&self) -> &SceneLifecycleManager {
        &self.scenes
    }

    /// Mutable access to the scene registry
    pub fn scenes_mut(&mut self) -> &mut SceneLifecycleManager {
        &mut self.scenes
    }

    /// The physics bridge
    pub fn physics(&self) -> &PhysicsBridge {
        &self.physics
    }

    /// The composite renderer
    pub fn compositor(&self) -> &CompositeRenderer {
        &self.compositor
    }

    /// Mutable access to the composite renderer
    pub fn compositor_mut(&mut self) -> &mut CompositeRenderer {
        &mut self.compositor
    }

    /// Gate guarding re-entrant ticks; clone it to share with the host
    pub fn gate(&self) -> &FrameGate {
        &self.gate
    }

    /// Set the scene whose entities are live
    pub fn set_current_scene(&mut self, scene_id: Option<&str>) {
        self.current_scene = scene_id.map(str::to_string);
    }

    /// The current scene id
    pub fn current_scene(&self) -> Option<&str> {
        self.current_scene.as_deref()
    }

    /// Replace the composition state
    pub fn set_composition_state(&mut self, state: CompositionState) {
        self.composition = state;
    }

    /// The composition state
    pub fn composition_state(&self) -> &CompositionState {
        &self.composition
    }

    /// Turn physics stepping on or off
    pub fn set_simulation_enabled(&mut self, enabled: bool) {
        self.simulation_enabled = enabled;
    }

    /// Whether physics is stepped
    pub fn simulation_enabled(&self) -> bool {
        self.simulation_enabled
    }

    /// The submission built by the last tick
    pub fn last_submission(&self) -> &FrameSubmission {
        &self.last_submission
    }

    /// Create a scene's render context from its composition metadata
    pub fn create_render_context(
        &mut self,
        scene_id: &str,
        surface: SurfaceId,
        render_mode: RenderMode,
        rasterizer: &mut dyn Rasterizer,
    ) -> Result<(), EngineError> {
        let scene = self
            .scenes
            .get_scene(scene_id)
            .ok_or_else(|| SceneError::SceneNotFound(scene_id.to_string()))?;
        let metadata = scene.composition();
        let (modes, blend) = (metadata.composition_modes, metadata.blend_mode);
        self.compositor
            .create_render_context(scene_id, surface, render_mode, modes, rasterizer)?;
        self.compositor.set_blend_mode(scene_id, blend)?;
        Ok(())
    }

    /// Destroy a scene together with its render context and queued updates
    ///
    /// Its bodies are swept on the next tick.
    pub fn destroy_scene(
        &mut self,
        scene_id: &str,
        rasterizer: &mut dyn Rasterizer,
    ) -> Result<Scene, EngineError> {
        let scene = self.scenes.destroy_scene(scene_id)?;
        self.release_scene_resources(scene_id, rasterizer);
        Ok(scene)
    }

    /// Force-remove a scene left unusable by a failed destroy hook
    pub fn evict_scene(&mut self, scene_id: &str, rasterizer: &mut dyn Rasterizer) -> Option<Scene> {
        let scene = self.scenes.evict_scene(scene_id)?;
        self.release_scene_resources(scene_id, rasterizer);
        Some(scene)
    }

    fn release_scene_resources(&mut self, scene_id: &str, rasterizer: &mut dyn Rasterizer) {
        if self.compositor.context(scene_id).is_some() {
            if let Err(e) = self.compositor.destroy_render_context(scene_id, rasterizer) {
                log::warn!("Failed to destroy render context of '{scene_id}': {e}");
            }
        }
        self.dispatcher.forget_scene(scene_id);
        self.animation.forget_scene(scene_id);
        if self.current_scene.as_deref() == Some(scene_id) {
            self.current_scene = None;
        }
    }

    /// Run one display tick at host timestamp `now`
    ///
    /// Order: resize, physics step, scene hooks, resolve, reconcile, animate,
    /// render, dispatch. Rendering failures are logged and never abort the
    /// tick.
    pub fn tick(
        &mut self,
        now: Duration,
        rasterizer: &mut dyn Rasterizer,
        sink: &mut dyn EntityUpdateSink,
    ) -> TickOutcome {
        let Some(_token) = self.gate.try_enter() else {
            log::debug!("Tick requested while another is running; dropped");
            return TickOutcome::Dropped;
        };

        let delta = self.timer.update(now);
        let mut report = FrameReport {
            delta,
            ..FrameReport::default()
        };

        let size = self.config.surface.physical_size();
        if rasterizer.size() != size {
            rasterizer.resize(size.0, size.1);
        }

        if self.simulation_enabled {
            self.physics.step(delta);
        }

        self.scenes.update(delta);

        let mut resolved = resolve_entities(
            &self.composition,
            self.current_scene.as_deref(),
            &self.scenes,
        );
        let states: HashMap<String, SceneState> = resolved
            .iter()
            .map(|r| r.source_scene.as_str())
            .collect::<HashSet<_>>()
            .into_iter()
            .filter_map(|id| Some((id.to_string(), self.scenes.scene_state(id)?)))
            .collect();
        resolved.retain(|r| {
            matches!(
                states.get(&r.source_scene),
                Some(SceneState::Loaded | SceneState::Active | SceneState::Paused)
            )
        });
        report.entity_count = resolved.len();

        let running: HashSet<String> = states
            .iter()
            .filter(|(_, state)| **state == SceneState::Active)
            .map(|(id, _)| id.clone())
            .collect();
        let mut patches: Vec<EntityPatch> = vec![EntityPatch::default(); resolved.len()];

        // Only running scenes simulate; paused and merely loaded ones render as-is
        let reconcile = self.physics.reconcile(
            resolved
                .iter_mut()
                .filter(|r| running.contains(&r.source_scene))
                .map(|r| &mut r.entity),
        );
        report.bodies_created = reconcile.created;
        report.bodies_destroyed = reconcile.destroyed;
        let index: HashMap<&str, usize> = resolved
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id(), i))
            .collect();
        for (id, patch) in reconcile.updates {
            if let Some(&i) = index.get(id.as_str()) {
                patches[i].merge(patch);
            }
        }

        for (r, pending) in resolved.iter_mut().zip(patches.iter_mut()) {
            if !running.contains(&r.source_scene) {
                continue;
            }
            let Some(scene) = self.scenes.get_scene(&r.source_scene) else {
                continue;
            };
            let owned = self.physics.has_body(&r.entity.id);
            let outcome = self
                .animation
                .animate(&r.source_scene, &mut r.entity, scene.animations(), delta, owned);
            if let AnimationOutcome::Advanced(patch) | AnimationOutcome::Missing(patch) = outcome {
                report.animations_advanced += 1;
                pending.merge(patch);
            }
        }

        for (r, patch) in resolved.iter().zip(patches) {
            if patch.is_empty() {
                continue;
            }
            if let Some(scene) = self.scenes.get_scene_mut(&r.source_scene) {
                scene.apply_patch(&r.source_id, &patch);
            }
            if r.live {
                self.dispatcher.queue(&r.source_scene, &r.source_id, patch);
            }
        }

        self.last_submission = self.renderer.build(&resolved, &self.scenes);
        report.render = self.render_frame(now, rasterizer);

        report.dispatched = self.dispatcher.flush(now, sink);
        TickOutcome::Ran(report)
    }

    fn render_frame(&mut self, now: Duration, rasterizer: &mut dyn Rasterizer) -> RenderStats {
        rasterizer.begin_frame(self.config.render.clear_color);
        let stats = self
            .compositor
            .render_composite_scenes(&self.last_submission.scenes, now, rasterizer);
        let finished = rasterizer.end_frame();
        match stats.and_then(|stats| finished.map(|()| stats)) {
            Ok(stats) => stats,
            Err(e) => {
                log::error!("Frame failed to render: {e}");
                RenderStats::default()
            }
        }
    }
}

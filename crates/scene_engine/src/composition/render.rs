//! Render-level composition
//!
//! Every scene that produces visual output owns a [`RenderContext`]. Each
//! frame the [`CompositeRenderer`] groups the submitted scenes by the
//! composition modes their contexts declare and resolves every group:
//!
//! - `LAYERED`: drawn now, ascending layer priority
//! - `SEQUENTIAL`: member `i` is deferred by `i` frame intervals
//! - `PARALLEL`: every member is deferred to the next flush, unordered
//! - `MASKING`: the first member writes the stencil, the rest draw where it
//!   wrote; needs at least two members
//!
//! A context may belong to several groups and is then drawn once per group.

use std::collections::HashMap;
use std::time::Duration;

use bitflags::bitflags;

use super::scheduler::FrameScheduler;
use crate::foundation::math::Rect;
use crate::render::{
    OffscreenTarget, QuadInstance, Rasterizer, RenderError, RenderResult, RenderTarget,
    StencilState, SurfaceId,
};
use crate::scene::model::{BlendMode, Scene};

/// Stencil value the mask source writes
const MASK_REFERENCE: u8 = 1;

bitflags! {
    /// Composition groups a render context belongs to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CompositionModes: u8 {
        /// Priority-ordered overdraw
        const LAYERED = 1 << 0;
        /// Staggered by one frame interval per member
        const SEQUENTIAL = 1 << 1;
        /// Deferred, unordered
        const PARALLEL = 1 << 2;
        /// Stencil mask source plus targets
        const MASKING = 1 << 3;
    }
}

/// Where a context draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    /// Straight onto the surface
    #[default]
    Direct,
    /// Into a private target, then composited onto the surface
    Offscreen,
}

/// Per-scene rendering state
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    /// Owning scene
    pub scene_id: String,
    /// Surface the scene ends up on
    pub surface: SurfaceId,
    /// Direct or offscreen
    pub render_mode: RenderMode,
    /// Declared composition groups
    pub composition_modes: CompositionModes,
    /// Blend mode used on the surface
    pub blend_mode: BlendMode,
    /// Optional viewport, set before every draw of the context
    pub viewport: Option<Rect>,
    offscreen: Option<OffscreenTarget>,
}

impl RenderContext {
    /// Private target of an offscreen context
    pub fn offscreen_target(&self) -> Option<OffscreenTarget> {
        self.offscreen
    }
}

/// One scene's share of a frame
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRenderData {
    /// Scene id, matched against render contexts
    pub scene_id: String,
    /// Quads in draw order, before opacity
    pub quads: Vec<QuadInstance>,
    /// Order among layered scenes
    pub layer_priority: i32,
    /// Hidden scenes are skipped
    pub visible: bool,
    /// Alpha multiplier
    pub opacity: f32,
}

impl SceneRenderData {
    /// Render data carrying a scene's composition metadata
    pub fn from_scene(scene: &Scene, quads: Vec<QuadInstance>) -> Self {
        let composition = scene.composition();
        Self {
            scene_id: scene.id().to_string(),
            quads,
            layer_priority: composition.layer_priority,
            visible: composition.visible,
            opacity: composition.opacity,
        }
    }
}

/// Counters for one render pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Draw calls issued
    pub draw_calls: usize,
    /// Quads drawn
    pub quads: usize,
    /// Offscreen composites issued
    pub composites: usize,
    /// Deferred draws still queued afterwards
    pub scheduled_pending: usize,
    /// Submitted scenes without a context or hidden
    pub skipped_scenes: usize,
}

impl RenderStats {
    /// Fold another pass into these totals
    pub fn merge(&mut self, other: Self) {
        self.draw_calls += other.draw_calls;
        self.quads += other.quads;
        self.composites += other.composites;
        self.skipped_scenes += other.skipped_scenes;
        self.scheduled_pending = other.scheduled_pending;
    }
}

/// Draws composed scenes through a [`Rasterizer`]
#[derive(Debug)]
pub struct CompositeRenderer {
    contexts: HashMap<String, RenderContext>,
    scheduler: FrameScheduler<SceneRenderData>,
    frame_interval: Duration,
}

impl CompositeRenderer {
    /// Create a renderer staggering sequential draws by `frame_interval`
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            contexts: HashMap::new(),
            scheduler: FrameScheduler::new(),
            frame_interval,
        }
    }

    /// Create (or replace) the render context of a scene
    pub fn create_render_context(
        &mut self,
        scene_id: &str,
        surface: SurfaceId,
        render_mode: RenderMode,
        composition_modes: CompositionModes,
        rasterizer: &mut dyn Rasterizer,
    ) -> RenderResult<()> {
        let offscreen = match render_mode {
            RenderMode::Direct => None,
            RenderMode::Offscreen => Some(rasterizer.create_offscreen_target()?),
        };
        let context = RenderContext {
            scene_id: scene_id.to_string(),
            surface,
            render_mode,
            composition_modes,
            blend_mode: BlendMode::Normal,
            viewport: None,
            offscreen,
        };
        if let Some(old) = self.contexts.insert(scene_id.to_string(), context) {
            log::debug!("Replacing render context of scene '{scene_id}'");
            if let Some(target) = old.offscreen {
                rasterizer.destroy_offscreen_target(target);
            }
        }
        log::debug!("Render context for '{scene_id}': {render_mode:?} {composition_modes:?}");
        Ok(())
    }

    /// Destroy a scene's render context and drop its deferred draws
    pub fn destroy_render_context(
        &mut self,
        scene_id: &str,
        rasterizer: &mut dyn Rasterizer,
    ) -> RenderResult<()> {
        let context = self
            .contexts
            .remove(scene_id)
            .ok_or_else(|| RenderError::UnknownContext(scene_id.to_string()))?;
        if let Some(target) = context.offscreen {
            rasterizer.destroy_offscreen_target(target);
        }
        let dropped = self.scheduler.cancel(|data| data.scene_id == scene_id);
        if dropped > 0 {
            log::debug!("Dropped {dropped} deferred draws of scene '{scene_id}'");
        }
        Ok(())
    }

    /// A scene's render context
    pub fn context(&self, scene_id: &str) -> Option<&RenderContext> {
        self.contexts.get(scene_id)
    }

    /// Set or clear a context's viewport
    pub fn set_viewport(&mut self, scene_id: &str, viewport: Option<Rect>) -> RenderResult<()> {
        self.context_mut(scene_id)?.viewport = viewport;
        Ok(())
    }

    /// Set a context's blend mode
    pub fn set_blend_mode(&mut self, scene_id: &str, mode: BlendMode) -> RenderResult<()> {
        self.context_mut(scene_id)?.blend_mode = mode;
        Ok(())
    }

    /// Number of live contexts
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Deferred draws still queued
    pub fn pending(&self) -> usize {
        self.scheduler.pending()
    }

    fn context_mut(&mut self, scene_id: &str) -> RenderResult<&mut RenderContext> {
        self.contexts
            .get_mut(scene_id)
            .ok_or_else(|| RenderError::UnknownContext(scene_id.to_string()))
    }

    /// Execute deferred draws whose due time has passed
    pub fn flush_scheduled(
        &mut self,
        now: Duration,
        rasterizer: &mut dyn Rasterizer,
    ) -> RenderResult<RenderStats> {
        let mut stats = RenderStats::default();
        for data in self.scheduler.take_due(now) {
            let Some(context) = self.contexts.get(&data.scene_id) else {
                continue;
            };
            draw_scene(context, &data, false, rasterizer, &mut stats)?;
        }
        stats.scheduled_pending = self.scheduler.pending();
        if stats.draw_calls > 0 {
            log::trace!("Flushed {} deferred draws", stats.draw_calls);
        }
        Ok(stats)
    }

    /// Draw one frame's worth of scenes
    ///
    /// Due deferred work is flushed first. Scenes without a context or marked
    /// invisible are skipped.
    pub fn render_composite_scenes(
        &mut self,
        scenes: &[SceneRenderData],
        now: Duration,
        rasterizer: &mut dyn Rasterizer,
    ) -> RenderResult<RenderStats> {
        let mut stats = self.flush_scheduled(now, rasterizer)?;

        let mut ready = Vec::with_capacity(scenes.len());
        for data in scenes {
            match self.contexts.get(&data.scene_id) {
                Some(context) if data.visible => ready.push((context, data)),
                Some(_) => stats.skipped_scenes += 1,
                None => {
                    log::trace!("Scene '{}' has no render context yet", data.scene_id);
                    stats.skipped_scenes += 1;
                }
            }
        }
        let group = |mode: CompositionModes| {
            ready
                .iter()
                .filter(|(context, _)| context.composition_modes.contains(mode))
                .copied()
                .collect::<Vec<_>>()
        };

        let mut layered = group(CompositionModes::LAYERED);
        layered.sort_by_key(|(_, data)| data.layer_priority);
        for (context, data) in layered {
            draw_scene(context, data, false, rasterizer, &mut stats)?;
        }

        let masking = group(CompositionModes::MASKING);
        draw_masked(&masking, rasterizer, &mut stats)?;

        let mut deferred = Vec::new();
        for (index, (_, data)) in group(CompositionModes::SEQUENTIAL).into_iter().enumerate() {
            let steps = u32::try_from(index).unwrap_or(u32::MAX);
            deferred.push((now + self.frame_interval * steps, data.clone()));
        }
        for (_, data) in group(CompositionModes::PARALLEL) {
            deferred.push((now, data.clone()));
        }
        for (due, data) in deferred {
            self.scheduler.post(due, data);
        }

        stats.scheduled_pending = self.scheduler.pending();
        Ok(stats)
    }
}

/// Stencil-masked draw of a masking group
///
/// Stencil testing is switched off again whether or not the draws succeed.
fn draw_masked(
    group: &[(&RenderContext, &SceneRenderData)],
    rasterizer: &mut dyn Rasterizer,
    stats: &mut RenderStats,
) -> RenderResult<()> {
    let [(mask_context, mask), targets @ ..] = group else {
        return Ok(());
    };
    if targets.is_empty() {
        log::debug!("Mask group of '{}' has no targets; nothing drawn", mask.scene_id);
        return Ok(());
    }

    let result = draw_mask_group(mask_context, mask, targets, rasterizer, stats);
    rasterizer.set_stencil(StencilState::Disabled);
    result
}

fn draw_mask_group(
    mask_context: &RenderContext,
    mask: &SceneRenderData,
    targets: &[(&RenderContext, &SceneRenderData)],
    rasterizer: &mut dyn Rasterizer,
    stats: &mut RenderStats,
) -> RenderResult<()> {
    rasterizer.set_stencil(StencilState::WriteMask {
        reference: MASK_REFERENCE,
    });
    draw_scene(mask_context, mask, true, rasterizer, stats)?;
    rasterizer.set_stencil(StencilState::TestEqual {
        reference: MASK_REFERENCE,
    });
    for (context, data) in targets {
        draw_scene(context, data, true, rasterizer, stats)?;
    }
    Ok(())
}

/// Issue the draw for one scene
///
/// `direct_only` forces drawing onto the surface even for offscreen contexts,
/// which stencil masking needs.
fn draw_scene(
    context: &RenderContext,
    data: &SceneRenderData,
    direct_only: bool,
    rasterizer: &mut dyn Rasterizer,
    stats: &mut RenderStats,
) -> RenderResult<()> {
    if data.quads.is_empty() {
        return Ok(());
    }
    if let Some(viewport) = context.viewport {
        rasterizer.set_viewport(viewport);
    }

    match context.offscreen {
        Some(target) if !direct_only => {
            rasterizer.set_target(RenderTarget::Offscreen(target));
            rasterizer.clear_target();
            rasterizer.set_blend_mode(BlendMode::Normal);
            rasterizer.draw_quads(&data.quads)?;
            rasterizer.set_target(RenderTarget::Surface(context.surface));
            rasterizer.composite(target, context.blend_mode, data.opacity)?;
            stats.composites += 1;
        }
        _ => {
            rasterizer.set_target(RenderTarget::Surface(context.surface));
            rasterizer.set_blend_mode(context.blend_mode);
            let quads: Vec<QuadInstance> = data
                .quads
                .iter()
                .map(|q| q.with_opacity(data.opacity))
                .collect();
            rasterizer.draw_quads(&quads)?;
        }
    }
    stats.draw_calls += 1;
    stats.quads += data.quads.len();
    Ok(())
}

impl Default for CompositeRenderer {
    fn default() -> Self {
        Self::new(Duration::from_millis(16))
    }
}

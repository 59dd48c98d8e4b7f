//! Rasterizer abstraction
//!
//! [`Rasterizer`] is the whole GPU-facing surface the engine needs. A real
//! backend owns the shader and texture pipeline; [`RecordingRasterizer`]
//! records commands for tests and headless runs.

use super::quad::QuadInstance;
use super::{RenderError, RenderResult};
use crate::foundation::math::{Color, Rect};
use crate::scene::model::BlendMode;

/// Identifies a presentable surface
pub type SurfaceId = u32;

/// Handle to an offscreen color target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OffscreenTarget(pub u64);

/// Where draws land
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// A presentable surface
    Surface(SurfaceId),
    /// An offscreen target, composited later
    Offscreen(OffscreenTarget),
}

/// Stencil configuration for subsequent draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilState {
    /// No stencil test, no stencil writes
    Disabled,
    /// Always pass, replace the stencil value with `reference`, no color writes
    WriteMask {
        /// Value written where the mask draws
        reference: u8,
    },
    /// Only draw where the stencil value equals `reference`
    TestEqual {
        /// Value to compare against
        reference: u8,
    },
}

/// GPU rasterizer the engine submits to
pub trait Rasterizer {
    /// Resize the backing surface in physical pixels
    fn resize(&mut self, width: u32, height: u32);

    /// Current backing size in physical pixels
    fn size(&self) -> (u32, u32);

    /// Start a frame, clearing to `clear`
    fn begin_frame(&mut self, clear: Color);

    /// Finish the frame and present it
    fn end_frame(&mut self) -> RenderResult<()>;

    /// Allocate an offscreen target of the current surface size
    fn create_offscreen_target(&mut self) -> RenderResult<OffscreenTarget>;

    /// Release an offscreen target
    fn destroy_offscreen_target(&mut self, target: OffscreenTarget);

    /// Direct subsequent draws to `target`
    fn set_target(&mut self, target: RenderTarget);

    /// Clear the current target to transparent
    fn clear_target(&mut self);

    /// Restrict subsequent draws to `viewport`
    fn set_viewport(&mut self, viewport: Rect);

    /// Blend mode for subsequent draws
    fn set_blend_mode(&mut self, mode: BlendMode);

    /// Stencil configuration for subsequent draws
    fn set_stencil(&mut self, state: StencilState);

    /// Draw a batch of quads in one call
    fn draw_quads(&mut self, quads: &[QuadInstance]) -> RenderResult<()>;

    /// Blend an offscreen target onto the current target
    fn composite(
        &mut self,
        source: OffscreenTarget,
        mode: BlendMode,
        opacity: f32,
    ) -> RenderResult<()>;
}

/// Command captured by [`RecordingRasterizer`]
#[derive(Debug, Clone, PartialEq)]
pub enum RasterCommand {
    /// Surface resized
    Resize(u32, u32),
    /// Frame started
    BeginFrame(Color),
    /// Frame presented
    EndFrame,
    /// Offscreen target allocated
    CreateTarget(OffscreenTarget),
    /// Offscreen target released
    DestroyTarget(OffscreenTarget),
    /// Target switch
    SetTarget(RenderTarget),
    /// Target cleared
    Clear,
    /// Viewport change
    Viewport(Rect),
    /// Blend mode change
    Blend(BlendMode),
    /// Stencil change
    Stencil(StencilState),
    /// Draw call with its quads
    Draw(Vec<QuadInstance>),
    /// Offscreen composite
    Composite {
        /// Source target
        source: OffscreenTarget,
        /// Blend mode
        mode: BlendMode,
        /// Opacity
        opacity: f32,
    },
}

/// Rasterizer that records every command
#[derive(Debug, Default)]
pub struct RecordingRasterizer {
    commands: Vec<RasterCommand>,
    size: (u32, u32),
    next_target: u64,
    live_targets: Vec<OffscreenTarget>,
    frames: u64,
}

impl RecordingRasterizer {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command recorded so far
    pub fn commands(&self) -> &[RasterCommand] {
        &self.commands
    }

    /// Forget recorded commands
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Number of draw calls recorded
    pub fn draw_calls(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RasterCommand::Draw(_)))
            .count()
    }

    /// Quads of every recorded draw call, in order
    pub fn drawn_quads(&self) -> Vec<&[QuadInstance]> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                RasterCommand::Draw(quads) => Some(quads.as_slice()),
                _ => None,
            })
            .collect()
    }

    /// Stencil changes in order
    pub fn stencil_changes(&self) -> Vec<StencilState> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                RasterCommand::Stencil(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    /// Offscreen targets not yet released
    pub fn live_targets(&self) -> &[OffscreenTarget] {
        &self.live_targets
    }

    /// Frames presented
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Rasterizer for RecordingRasterizer {
    fn resize(&mut self, width: u32, height: u32) {
        if self.size != (width, height) {
            self.size = (width, height);
            self.commands.push(RasterCommand::Resize(width, height));
        }
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn begin_frame(&mut self, clear: Color) {
        self.commands.push(RasterCommand::BeginFrame(clear));
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        self.frames += 1;
        self.commands.push(RasterCommand::EndFrame);
        Ok(())
    }

    fn create_offscreen_target(&mut self) -> RenderResult<OffscreenTarget> {
        self.next_target += 1;
        let target = OffscreenTarget(self.next_target);
        self.live_targets.push(target);
        self.commands.push(RasterCommand::CreateTarget(target));
        Ok(target)
    }

    fn destroy_offscreen_target(&mut self, target: OffscreenTarget) {
        self.live_targets.retain(|t| *t != target);
        self.commands.push(RasterCommand::DestroyTarget(target));
    }

    fn set_target(&mut self, target: RenderTarget) {
        self.commands.push(RasterCommand::SetTarget(target));
    }

    fn clear_target(&mut self) {
        self.commands.push(RasterCommand::Clear);
    }

    fn set_viewport(&mut self, viewport: Rect) {
        self.commands.push(RasterCommand::Viewport(viewport));
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.commands.push(RasterCommand::Blend(mode));
    }

    fn set_stencil(&mut self, state: StencilState) {
        self.commands.push(RasterCommand::Stencil(state));
    }

    fn draw_quads(&mut self, quads: &[QuadInstance]) -> RenderResult<()> {
        self.commands.push(RasterCommand::Draw(quads.to_vec()));
        Ok(())
    }

    fn composite(
        &mut self,
        source: OffscreenTarget,
        mode: BlendMode,
        opacity: f32,
    ) -> RenderResult<()> {
        if !self.live_targets.contains(&source) {
            return Err(RenderError::Backend(format!(
                "composite from released target {source:?}"
            )));
        }
        self.commands.push(RasterCommand::Composite {
            source,
            mode,
            opacity,
        });
        Ok(())
    }
}

//! End-to-end simulation scenarios
//!
//! Each test drives a full [`SimulationLoop`](crate::SimulationLoop) against a
//! recording rasterizer and sink.


use std::time::Duration;

use crate::composition::RenderMode;
use crate::core::config::EngineConfig;
use crate::dispatch::RecordingSink;
use crate::render::RecordingRasterizer;
use crate::scene::SceneDescriptor;
use crate::{FrameReport, SimulationLoop, TickOutcome};

/// Engine, rasterizer and sink wired together
pub(crate) struct Harness {
    pub engine: SimulationLoop,
    pub raster: RecordingRasterizer,
    pub sink: RecordingSink,
}

impl Harness {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: SimulationLoop::new(config).unwrap(),
            raster: RecordingRasterizer::new(),
            sink: RecordingSink::new(),
        }
    }

    /// Register, load and activate a scene with a direct render context
    pub fn start_scene(&mut self, descriptor: SceneDescriptor) {
        let id = descriptor.id().to_string();
        self.engine.scenes_mut().create_scene(descriptor);
        self.engine.scenes_mut().load_scene(&id).unwrap();
        self.engine.scenes_mut().activate_scene(&id).unwrap();
        self.engine
            .create_render_context(&id, 0, RenderMode::Direct, &mut self.raster)
            .unwrap();
    }

    pub fn tick_at(&mut self, now: Duration) -> FrameReport {
        match self.engine.tick(now, &mut self.raster, &mut self.sink) {
            TickOutcome::Ran(report) => report,
            TickOutcome::Dropped => panic!("tick unexpectedly dropped"),
        }
    }

    /// Tick every `step` for `count` ticks starting at zero
    pub fn run(&mut self, count: u32, step: Duration) -> Vec<FrameReport> {
        (0..count).map(|i| self.tick_at(step * i)).collect()
    }
}

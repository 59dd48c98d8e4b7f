//! # Scene Engine
//!
//! A real-time 2D scene simulation and composition engine.
//!
//! ## Features
//!
//! - **Scene Lifecycle**: state machine with dependency resolution, asset
//!   preload and per-scene hooks
//! - **Composition**: merge entities from several scenes per frame, then merge
//!   their draws as layered, sequential, parallel or stencil-masked groups
//! - **Physics**: Rapier bodies shadowing entity physics components
//! - **Animation**: keyframe clips evaluated per tick
//! - **Submission**: flat quad batches for any [`render::Rasterizer`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//! use std::time::Duration;
//!
//! fn main() -> Result<(), EngineError> {
//!     let mut engine = SimulationLoop::new(EngineConfig::default())?;
//!     let mut raster = RecordingRasterizer::new();
//!     let mut sink = NullSink;
//!
//!     engine.scenes_mut().create_scene(
//!         SceneDescriptor::new("main").with_entity(Entity::sprite("hero").at(10.0, 20.0)),
//!     );
//!     engine.scenes_mut().load_scene("main")?;
//!     engine.scenes_mut().activate_scene("main")?;
//!     engine.create_render_context("main", 0, RenderMode::Direct, &mut raster)?;
//!     engine.set_current_scene(Some("main"));
//!
//!     for frame in 0..60u64 {
//!         engine.tick(Duration::from_millis(frame * 16), &mut raster, &mut sink);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Shared configuration
pub mod core;

pub mod foundation;
pub mod config;
pub mod assets;
pub mod scene;
pub mod animation;
pub mod composition;
pub mod physics;
pub mod render;
pub mod dispatch;

mod engine;

#[cfg(test)]
mod tests;

pub use engine::{EngineError, FrameGate, FrameReport, FrameToken, SimulationLoop, TickOutcome};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        EngineError, FrameReport, SimulationLoop, TickOutcome,
        animation::{AnimatedProperty, AnimationClip, AnimationPlayback, Keyframe, TrackValue},
        assets::{AssetKind, AssetLoader, AssetRef, FileAssetLoader, MemoryAssetLoader},
        composition::{CompositionModes, CompositionState, RenderMode},
        core::config::{Config, EngineConfig},
        dispatch::{EntityUpdateSink, NullSink, RecordingSink},
        foundation::math::{Color, Rect, Vec2},
        render::{Rasterizer, RecordingRasterizer},
        scene::{
            Entity, EntityPatch, PhysicsComponent, SceneDescriptor, SceneDocument, SceneHooks,
            SceneLifecycleManager, SceneState,
        },
    };
}

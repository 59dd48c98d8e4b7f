//! Scene composition
//!
//! Two levels:
//! - [`router`] picks the entities visible this frame from one or more scenes
//! - [`render`] merges the scenes' draws according to their declared modes

pub mod render;
pub mod router;
pub mod scheduler;

pub use render::{
    CompositeRenderer, CompositionModes, RenderContext, RenderMode, RenderStats, SceneRenderData,
};
pub use router::{resolve_entities, CompositionMode, CompositionState, ResolvedEntity};
pub use scheduler::FrameScheduler;

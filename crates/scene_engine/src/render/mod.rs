//! Rasterizer submission surface
//!
//! The engine never talks to a GPU API directly. It turns entities into flat
//! lists of [`QuadInstance`]s and drives a [`Rasterizer`] with a small set of
//! state changes and draw calls. Shader and texture plumbing lives behind the
//! trait.

pub mod quad;
pub mod rasterizer;
pub mod submission;

pub use quad::{QuadInstance, TextureTable};
pub use rasterizer::{
    OffscreenTarget, RasterCommand, Rasterizer, RecordingRasterizer, RenderTarget, StencilState,
    SurfaceId,
};
pub use submission::{FrameSubmission, SceneRenderer};

use thiserror::Error;

/// Rendering errors
#[derive(Debug, Error)]
pub enum RenderError {
    /// No render context exists for the scene
    #[error("No render context for scene '{0}'")]
    UnknownContext(String),

    /// The rasterizer rejected an operation
    #[error("Rasterizer error: {0}")]
    Backend(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

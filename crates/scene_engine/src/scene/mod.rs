//! Scenes and their lifecycle
//!
//! A [`Scene`] owns its entities and animation clips. The
//! [`SceneLifecycleManager`] owns every scene and is the only thing that
//! moves them between [`SceneState`]s.

pub mod document;
pub mod entity;
pub mod error;
pub mod hooks;
pub mod lifecycle;
pub mod model;

pub use document::{DocumentError, DocumentMetadata, SceneDocument};
pub use entity::{
    BodyType, Component, Entity, EntityKey, EntityKind, EntityPatch, EntityProps,
    PhysicsComponent, Point,
};
pub use error::SceneError;
pub use hooks::{HookContext, HookError, HookKind, HookResult, SceneHooks};
pub use lifecycle::{SceneLifecycleManager, SceneStats};
pub use model::{
    BlendMode, CompositionMetadata, EntityTable, Scene, SceneDescriptor, SceneKey, SceneState,
};

//! Rigid-body simulation
//!
//! [`world`] wraps the Rapier pipeline; [`bridge`] keeps one body per
//! physics-enabled entity and feeds poses back.

pub mod bridge;
pub mod world;

use thiserror::Error;

pub use bridge::{BodyFingerprint, BodyKey, PhysicsBridge, ReconcileReport};
pub use world::{BodyPose, BodySpec, PhysicsWorld};

/// Physics errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// A body could not be built from an entity's component
    #[error("Cannot create body for entity '{entity}': {reason}")]
    BodyCreation {
        /// Entity id
        entity: String,
        /// What was wrong
        reason: String,
    },
}

//! Keyframe animation
//!
//! - [`clip`]: single- and multi-track clip data
//! - [`interpolator`]: pure evaluation of a clip at a time
//! - [`playback`]: per-entity playback state machine
//! - [`system`]: per-tick driver writing evaluated values onto entities

pub mod clip;
pub mod interpolator;
pub mod playback;
pub mod system;

pub use clip::{AnimatedProperty, AnimationClip, Keyframe, MultiKeyframe, TrackValue};
pub use interpolator::{evaluate, AnimationSample};
pub use playback::AnimationPlayback;
pub use system::{AnimationSystem, AnimationOutcome};

use thiserror::Error;

/// Animation errors
#[derive(Debug, Error, PartialEq)]
pub enum AnimationError {
    /// An entity plays a clip its scene does not define
    #[error("Entity '{entity}' plays missing animation clip '{clip}'")]
    AnimationDataMissing {
        /// Entity id
        entity: String,
        /// Clip name
        clip: String,
    },

    /// Clip without keyframes
    #[error("Animation clip '{0}' has no keyframes")]
    EmptyClip(String),

    /// Keyframe times go backwards
    #[error("Animation clip '{0}' has keyframes out of time order")]
    UnorderedKeyframes(String),

    /// Duration ends before the last keyframe
    #[error("Animation clip '{clip}' lasts {duration}s but its last keyframe is at {last_keyframe}s")]
    DurationTooShort {
        /// Clip name
        clip: String,
        /// Declared duration
        duration: f32,
        /// Time of the last keyframe
        last_keyframe: f32,
    },
}

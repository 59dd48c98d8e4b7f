//! Keyframe clip data
//!
//! Clips come in two shapes. A single-track clip animates one named property
//! through `(time, value)` keyframes. A multi-track clip stores merged
//! keyframes, each carrying values for any subset of properties at one
//! timestamp.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::AnimationError;

/// Entity fields an animation can drive
///
/// The set is closed: a track naming anything else fails to deserialize
/// instead of silently animating nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimatedProperty {
    /// Horizontal position
    X,
    /// Vertical position
    Y,
    /// Bounding box width
    Width,
    /// Bounding box height
    Height,
    /// Rotation in radians
    Rotation,
    /// RGBA tint
    Color,
    /// Texture id
    Texture,
}

impl AnimatedProperty {
    /// Properties owned by a physics body while one exists
    pub fn is_physics_driven(self) -> bool {
        matches!(self, Self::X | Self::Y | Self::Rotation)
    }
}

/// Value of one property at one keyframe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackValue {
    /// Scalar, interpolated linearly
    Number(f32),
    /// Four components, interpolated component-wise
    Color([f32; 4]),
    /// Discrete value such as a texture id, never blended
    Text(String),
}

/// Sample on a single-track curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Time in seconds from clip start
    pub time: f32,
    /// Value at that time
    pub value: TrackValue,
}

impl Keyframe {
    /// Create a keyframe
    pub fn new(time: f32, value: TrackValue) -> Self {
        Self { time, value }
    }
}

/// Merged sample carrying several property values at one time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiKeyframe {
    /// Time in seconds from clip start
    pub time: f32,
    /// Property values present at this time
    #[serde(flatten)]
    pub values: BTreeMap<AnimatedProperty, TrackValue>,
}

impl MultiKeyframe {
    /// Create an empty keyframe at `time`
    pub fn new(time: f32) -> Self {
        Self {
            time,
            values: BTreeMap::new(),
        }
    }

    /// Add a property value (builder pattern)
    pub fn with(mut self, property: AnimatedProperty, value: TrackValue) -> Self {
        self.values.insert(property, value);
        self
    }
}

/// Single-track clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleTrackClip {
    /// Property this clip drives
    pub property_name: AnimatedProperty,
    /// Keyframes ordered by time
    pub keyframes: Vec<Keyframe>,
    /// Clip length in seconds
    pub duration: f32,
}

/// Multi-track clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiTrackClip {
    /// Merged keyframes ordered by time
    pub keyframes: Vec<MultiKeyframe>,
    /// Clip length in seconds
    pub duration: f32,
}

/// Keyframe animation clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnimationClip {
    /// One property
    Single(SingleTrackClip),
    /// Several properties sharing timestamps
    Multi(MultiTrackClip),
}

impl AnimationClip {
    /// Build a single-track clip
    pub fn single(property: AnimatedProperty, keyframes: Vec<Keyframe>, duration: f32) -> Self {
        Self::Single(SingleTrackClip {
            property_name: property,
            keyframes,
            duration,
        })
    }

    /// Build a multi-track clip
    pub fn multi(keyframes: Vec<MultiKeyframe>, duration: f32) -> Self {
        Self::Multi(MultiTrackClip {
            keyframes,
            duration,
        })
    }

    /// Clip length in seconds
    pub fn duration(&self) -> f32 {
        match self {
            Self::Single(clip) => clip.duration,
            Self::Multi(clip) => clip.duration,
        }
    }

    /// Keyframe timestamps in storage order
    pub fn times(&self) -> Vec<f32> {
        match self {
            Self::Single(clip) => clip.keyframes.iter().map(|k| k.time).collect(),
            Self::Multi(clip) => clip.keyframes.iter().map(|k| k.time).collect(),
        }
    }

    /// Check keyframe ordering and duration against the last keyframe
    pub fn validate(&self, name: &str) -> Result<(), AnimationError> {
        let times = self.times();
        let Some(&last) = times.last() else {
            return Err(AnimationError::EmptyClip(name.to_string()));
        };
        if times.windows(2).any(|w| !(w[0] <= w[1])) {
            return Err(AnimationError::UnorderedKeyframes(name.to_string()));
        }
        if self.duration() < last {
            return Err(AnimationError::DurationTooShort {
                clip: name.to_string(),
                duration: self.duration(),
                last_keyframe: last,
            });
        }
        Ok(())
    }
}

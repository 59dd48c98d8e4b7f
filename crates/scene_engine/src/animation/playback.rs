//! Per-entity playback state machine

use serde::{Deserialize, Serialize};

/// Playback state attached to an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationPlayback {
    /// Whether time advances
    pub playing: bool,
    /// Name of the clip in the owning scene's clip table
    pub current_animation: String,
    /// Elapsed seconds into the clip
    #[serde(default)]
    pub current_time: f32,
    /// Wrap around instead of stopping at the end
    #[serde(rename = "loop", default)]
    pub looping: bool,
}

impl AnimationPlayback {
    /// Start playing `clip` from the beginning
    pub fn play(clip: impl Into<String>, looping: bool) -> Self {
        Self {
            playing: true,
            current_animation: clip.into(),
            current_time: 0.0,
            looping,
        }
    }

    /// Advance by `delta` seconds within a clip of length `duration`
    ///
    /// Reaching the end wraps (looping) or clamps to `duration` and stops.
    /// Returns true if the playback state changed.
    pub fn advance(&mut self, delta: f32, duration: f32) -> bool {
        if !self.playing {
            return false;
        }
        self.current_time += delta;
        if self.current_time >= duration {
            if self.looping {
                self.current_time = if duration > 0.0 {
                    self.current_time % duration
                } else {
                    0.0
                };
            } else {
                self.current_time = duration;
                self.playing = false;
            }
        }
        true
    }

    /// Advance without a known clip length
    pub fn advance_unbounded(&mut self, delta: f32) -> bool {
        if !self.playing {
            return false;
        }
        self.current_time += delta;
        true
    }
}

//! Per-tick animation driver
//!
//! Advances each entity's playback, evaluates its clip and writes the result
//! back onto the entity. Properties owned by a physics body are left alone.

use std::collections::{HashMap, HashSet};

use super::clip::{AnimatedProperty, AnimationClip, TrackValue};
use super::interpolator::{evaluate, AnimationSample};
use super::AnimationError;
use crate::foundation::math::Color;
use crate::scene::entity::{Entity, EntityPatch, Point};

/// Result of animating one entity for one tick
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationOutcome {
    /// No active playback
    Idle,
    /// Playback advanced and evaluated values were applied
    Advanced(EntityPatch),
    /// Playback advanced but the clip does not exist
    Missing(EntityPatch),
}

impl AnimationOutcome {
    /// The patch applied to the entity, if any
    pub fn patch(&self) -> Option<&EntityPatch> {
        match self {
            Self::Idle => None,
            Self::Advanced(patch) | Self::Missing(patch) => Some(patch),
        }
    }
}

/// Drives keyframe playback for entities
#[derive(Debug, Default)]
pub struct AnimationSystem {
    /// (scene, entity, clip) triples already warned about
    reported_missing: HashSet<(String, String, String)>,
}

impl AnimationSystem {
    /// Create a new animation system
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance and apply `entity`'s playback by `delta` seconds
    ///
    /// `scene_id` is the scene the entity and `clips` belong to.
    /// `physics_owned` marks entities whose position and rotation belong to a
    /// physics body this tick; tracks for those properties are skipped.
    pub fn animate(
        &mut self,
        scene_id: &str,
        entity: &mut Entity,
        clips: &HashMap<String, AnimationClip>,
        delta: f32,
        physics_owned: bool,
    ) -> AnimationOutcome {
        let Some(playback) = entity.animation.as_mut() else {
            return AnimationOutcome::Idle;
        };
        if !playback.playing {
            return AnimationOutcome::Idle;
        }

        let Some(clip) = clips.get(&playback.current_animation) else {
            playback.advance_unbounded(delta);
            let report_key = (
                scene_id.to_string(),
                entity.id.clone(),
                playback.current_animation.clone(),
            );
            if self.reported_missing.insert(report_key) {
                let error = AnimationError::AnimationDataMissing {
                    entity: entity.id.clone(),
                    clip: playback.current_animation.clone(),
                };
                log::warn!("{error}");
            }
            return AnimationOutcome::Missing(EntityPatch {
                animation: Some(playback.clone()),
                ..EntityPatch::default()
            });
        };

        playback.advance(delta, clip.duration());
        let sample = evaluate(clip, playback.current_time);
        let mut patch = patch_from_sample(entity, &sample, physics_owned);
        patch.animation = entity.animation.clone();
        entity.apply_patch(&patch);
        AnimationOutcome::Advanced(patch)
    }

    /// Number of distinct missing-clip reports logged so far
    pub fn missing_reports(&self) -> usize {
        self.reported_missing.len()
    }

    /// Drop the missing-clip reports of a scene that went away
    pub fn forget_scene(&mut self, scene_id: &str) {
        self.reported_missing.retain(|(scene, _, _)| scene != scene_id);
    }
}

/// Translate evaluated values into an entity patch
fn patch_from_sample(entity: &Entity, sample: &AnimationSample, physics_owned: bool) -> EntityPatch {
    let mut patch = EntityPatch::default();
    let mut position = entity.position;
    let mut moved = false;

    for (property, value) in sample {
        if physics_owned && property.is_physics_driven() {
            continue;
        }
        match (property, value) {
            (AnimatedProperty::X, TrackValue::Number(v)) => {
                position.x = *v;
                moved = true;
            }
            (AnimatedProperty::Y, TrackValue::Number(v)) => {
                position.y = *v;
                moved = true;
            }
            (AnimatedProperty::Width, TrackValue::Number(v)) => patch.width = Some(*v),
            (AnimatedProperty::Height, TrackValue::Number(v)) => patch.height = Some(*v),
            (AnimatedProperty::Rotation, TrackValue::Number(v)) => patch.rotation = Some(*v),
            (AnimatedProperty::Color, TrackValue::Color(c)) => patch.color = Some(Color(*c)),
            (AnimatedProperty::Texture, TrackValue::Text(t)) => patch.texture = Some(t.clone()),
            (property, value) => {
                log::trace!("Ignoring {value:?} for {property:?} on '{}'", entity.id);
            }
        }
    }

    if moved {
        patch.position = Some(Point::new(position.x, position.y));
    }
    patch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::clip::{Keyframe, MultiKeyframe};
    use crate::animation::AnimationPlayback;
    use approx::assert_relative_eq;

    fn clips() -> HashMap<String, AnimationClip> {
        let mut clips = HashMap::new();
        clips.insert(
            "slide".to_string(),
            AnimationClip::single(
                AnimatedProperty::X,
                vec![
                    Keyframe::new(0.0, TrackValue::Number(0.0)),
                    Keyframe::new(2.0, TrackValue::Number(100.0)),
                ],
                2.0,
            ),
        );
        clips.insert(
            "pulse".to_string(),
            AnimationClip::multi(
                vec![
                    MultiKeyframe::new(0.0)
                        .with(AnimatedProperty::Y, TrackValue::Number(0.0))
                        .with(AnimatedProperty::Width, TrackValue::Number(10.0)),
                    MultiKeyframe::new(1.0)
                        .with(AnimatedProperty::Y, TrackValue::Number(10.0))
                        .with(AnimatedProperty::Width, TrackValue::Number(20.0)),
                ],
                1.0,
            ),
        );
        clips
    }

    #[test]
    fn test_playback_writes_position() {
        let mut system = AnimationSystem::new();
        let mut entity = Entity::sprite("a").with_animation(AnimationPlayback::play("slide", false));

        let outcome = system.animate("main", &mut entity, &clips(), 1.0, false);

        assert!(matches!(outcome, AnimationOutcome::Advanced(_)));
        assert_relative_eq!(entity.position.x, 50.0);
        assert_relative_eq!(entity.animation.as_ref().unwrap().current_time, 1.0);
    }

    #[test]
    fn test_non_looping_playback_ends_on_last_value() {
        let mut system = AnimationSystem::new();
        let mut entity = Entity::sprite("a").with_animation(AnimationPlayback::play("slide", false));

        system.animate("main", &mut entity, &clips(), 5.0, false);

        assert_relative_eq!(entity.position.x, 100.0);
        assert!(!entity.animation.as_ref().unwrap().playing);
        assert_eq!(system.animate("main", &mut entity, &clips(), 1.0, false), AnimationOutcome::Idle);
    }

    #[test]
    fn test_physics_owned_entities_keep_position() {
        let mut system = AnimationSystem::new();
        let mut entity = Entity::sprite("a")
            .at(3.0, 4.0)
            .with_animation(AnimationPlayback::play("pulse", true));

        let outcome = system.animate("main", &mut entity, &clips(), 0.5, true);

        let patch = outcome.patch().unwrap();
        assert_eq!(patch.position, None);
        assert_relative_eq!(entity.position.y, 4.0);
        assert_relative_eq!(entity.properties.width, 15.0);
    }

    #[test]
    fn test_missing_clip_advances_time_and_reports_once() {
        let mut system = AnimationSystem::new();
        let mut entity = Entity::sprite("ghost")
            .at(1.0, 1.0)
            .with_animation(AnimationPlayback::play("nope", false));

        let first = system.animate("main", &mut entity, &clips(), 0.25, false);
        system.animate("main", &mut entity, &clips(), 0.25, false);

        assert!(matches!(first, AnimationOutcome::Missing(_)));
        assert_relative_eq!(entity.animation.as_ref().unwrap().current_time, 0.5);
        assert_relative_eq!(entity.position.x, 1.0);
        assert_eq!(system.missing_reports(), 1);
    }

    #[test]
    fn test_forget_scene_drops_only_its_reports() {
        let mut system = AnimationSystem::new();
        let mut entity = Entity::sprite("ghost").with_animation(AnimationPlayback::play("nope", true));

        system.animate("main", &mut entity, &clips(), 0.1, false);
        system.animate("hud", &mut entity, &clips(), 0.1, false);
        assert_eq!(system.missing_reports(), 2);

        system.forget_scene("hud");
        assert_eq!(system.missing_reports(), 1);

        system.animate("hud", &mut entity, &clips(), 0.1, false);
        assert_eq!(system.missing_reports(), 2);
    }
}

//! Frame submission
//!
//! Turns the resolved entity set into per-scene quad batches, keeping the
//! playback state and clip names the frame was built from.

use std::collections::{BTreeMap, BTreeSet};

use super::quad::{QuadInstance, TextureTable};
use crate::animation::AnimationPlayback;
use crate::composition::{ResolvedEntity, SceneRenderData};
use crate::scene::lifecycle::SceneLifecycleManager;

/// Everything handed to the rasterizer for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSubmission {
    /// Per-scene quad batches in first-appearance order
    pub scenes: Vec<SceneRenderData>,
    /// Playback state of every animated entity, by visible id
    pub playback: BTreeMap<String, AnimationPlayback>,
    /// Clip names available to the submitted scenes
    pub clips: BTreeSet<String>,
}

impl FrameSubmission {
    /// Total quads across every scene
    pub fn quad_count(&self) -> usize {
        self.scenes.iter().map(|s| s.quads.len()).sum()
    }
}

/// Builds [`FrameSubmission`]s
#[derive(Debug, Default)]
pub struct SceneRenderer {
    textures: TextureTable,
}

impl SceneRenderer {
    /// Create a renderer with an empty texture table
    pub fn new() -> Self {
        Self::default()
    }

    /// Texture slots handed out so far
    pub fn textures(&self) -> &TextureTable {
        &self.textures
    }

    /// Batch resolved entities by source scene
    ///
    /// Entities whose source scene is no longer registered are dropped.
    pub fn build(
        &mut self,
        resolved: &[ResolvedEntity],
        scenes: &SceneLifecycleManager,
    ) -> FrameSubmission {
        let mut submission = FrameSubmission::default();
        let mut batches: Vec<(String, Vec<QuadInstance>)> = Vec::new();

        for item in resolved {
            let texture = self.textures.slot_for(item.entity.properties.texture.as_deref());
            let quad = QuadInstance::from_entity(&item.entity, texture);
            match batches.iter_mut().find(|(id, _)| *id == item.source_scene) {
                Some((_, quads)) => quads.push(quad),
                None => batches.push((item.source_scene.clone(), vec![quad])),
            }
            if let Some(playback) = &item.entity.animation {
                submission
                    .playback
                    .insert(item.entity.id.clone(), playback.clone());
            }
        }

        for (scene_id, quads) in batches {
            let Some(scene) = scenes.get_scene(&scene_id) else {
                continue;
            };
            submission.clips.extend(scene.animations().keys().cloned());
            submission.scenes.push(SceneRenderData::from_scene(scene, quads));
        }
        submission
    }
}

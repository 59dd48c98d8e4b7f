//! Persisted scene documents
//!
//! The JSON shape shared with the storage layer:
//!
//! ```json
//! {
//!   "id": "level-1",
//!   "name": "Level 1",
//!   "entities": { "hero": { "id": "hero", "type": "sprite", ... } },
//!   "animations": { "walk": { "propertyName": "x", ... } },
//!   "metadata": { "createdAt": 0, "updatedAt": 0, "entityCount": 1 }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entity::Entity;
use super::model::{Scene, SceneDescriptor};
use crate::animation::AnimationClip;
use crate::foundation::time::unix_millis;

/// Errors reading or writing scene documents
#[derive(Debug, Error)]
pub enum DocumentError {
    /// File could not be read or written
    #[error("IO error on {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Content is not a valid scene document
    #[error("Invalid scene document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Bookkeeping stored next to the scene content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentMetadata {
    /// Creation time in Unix milliseconds
    pub created_at: u64,
    /// Last modification time in Unix milliseconds
    pub updated_at: u64,
    /// Number of entities at save time
    pub entity_count: usize,
}

/// A scene as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Scene id
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Entities keyed by id
    #[serde(default)]
    pub entities: BTreeMap<String, Entity>,
    /// Animation clips keyed by name
    #[serde(default)]
    pub animations: BTreeMap<String, AnimationClip>,
    /// Bookkeeping
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

impl SceneDocument {
    /// Parse a document from JSON text
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to indented JSON
    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a document from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document = Self::from_json(&contents)?;
        log::debug!(
            "Loaded scene document '{}' ({} entities) from {}",
            document.id,
            document.entities.len(),
            path.display()
        );
        Ok(document)
    }

    /// Write the document to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path = path.as_ref();
        let contents = self.to_json_pretty()?;
        fs::write(path, contents).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl SceneDescriptor {
    /// Creation config for a stored scene
    ///
    /// Map keys are authoritative for entity ids. Clips failing validation
    /// are kept but logged.
    pub fn from_document(document: SceneDocument) -> Self {
        let SceneDocument {
            id,
            name,
            entities,
            animations,
            metadata,
        } = document;

        let mut descriptor = Self::new(id);
        if !name.is_empty() {
            descriptor = descriptor.named(name);
        }
        if metadata.created_at > 0 {
            descriptor.created_at = Some(metadata.created_at);
        }

        for (key, mut entity) in entities {
            if entity.id != key {
                log::warn!(
                    "Scene '{}': entity stored under '{key}' claims id '{}'",
                    descriptor.id,
                    entity.id
                );
                entity.id = key;
            }
            descriptor = descriptor.with_entity(entity);
        }

        for (name, clip) in animations {
            if let Err(e) = clip.validate(&name) {
                log::warn!("Scene '{}': {e}", descriptor.id);
            }
            descriptor = descriptor.with_animation(name, clip);
        }
        descriptor
    }
}

impl Scene {
    /// Snapshot the scene as a storable document
    pub fn to_document(&self) -> SceneDocument {
        let entities: BTreeMap<String, Entity> = self
            .entities()
            .iter()
            .map(|(id, entity)| (id.to_string(), entity.clone()))
            .collect();
        let animations = self
            .animations()
            .iter()
            .map(|(name, clip)| (name.clone(), clip.clone()))
            .collect();
        SceneDocument {
            id: self.id().to_string(),
            name: self.name().to_string(),
            metadata: DocumentMetadata {
                created_at: self.created_at(),
                updated_at: unix_millis(),
                entity_count: entities.len(),
            },
            entities,
            animations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimatedProperty, TrackValue};
    use crate::scene::entity::EntityKind;

    const LEVEL: &str = r#"{
        "id": "level-1",
        "name": "Level 1",
        "entities": {
            "hero": {"id": "hero", "type": "sprite", "position": {"x": 5, "y": 10},
                     "animation": {"playing": true, "currentAnimation": "walk", "loop": true}},
            "label": {"id": "wrong", "type": "ui-text", "properties": {"text": "Score"}}
        },
        "animations": {
            "walk": {"propertyName": "x", "keyframes": [{"time": 0, "value": 0}, {"time": 1, "value": 8}], "duration": 1}
        },
        "metadata": {"createdAt": 1700000000000, "updatedAt": 1700000000000, "entityCount": 2}
    }"#;

    #[test]
    fn test_parse_document() {
        let document = SceneDocument::from_json(LEVEL).unwrap();
        assert_eq!(document.entities.len(), 2);
        assert_eq!(document.metadata.entity_count, 2);
        assert_eq!(document.entities["label"].kind, EntityKind::UiText);
        let AnimationClip::Single(walk) = &document.animations["walk"] else {
            panic!("expected single-track clip");
        };
        assert_eq!(walk.property_name, AnimatedProperty::X);
        assert_eq!(walk.keyframes[1].value, TrackValue::Number(8.0));
    }

    #[test]
    fn test_descriptor_from_document_uses_map_keys() {
        let document = SceneDocument::from_json(LEVEL).unwrap();
        let scene = Scene::from_descriptor(SceneDescriptor::from_document(document));

        assert_eq!(scene.name(), "Level 1");
        assert_eq!(scene.created_at(), 1_700_000_000_000);
        assert!(scene.entity("label").is_some());
        assert!(scene.entity("wrong").is_none());
        assert!(scene.animations().contains_key("walk"));
    }

    #[test]
    fn test_snapshot_recomputes_entity_count() {
        let document = SceneDocument::from_json(LEVEL).unwrap();
        let mut scene = Scene::from_descriptor(SceneDescriptor::from_document(document));
        scene.insert_entity(Entity::sprite("coin"));

        let snapshot = scene.to_document();

        assert_eq!(snapshot.metadata.entity_count, 3);
        assert!(snapshot.metadata.updated_at >= snapshot.metadata.created_at);
        let json = snapshot.to_json_pretty().unwrap();
        assert!(json.contains("\"entityCount\": 3"));
        assert_eq!(SceneDocument::from_json(&json).unwrap().entities.len(), 3);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("scene_doc_{}.json", std::process::id()));
        let document = SceneDocument::from_json(LEVEL).unwrap();

        document.save(&path).unwrap();
        let loaded = SceneDocument::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, document);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SceneDocument::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, DocumentError::Io { .. }));
    }
}

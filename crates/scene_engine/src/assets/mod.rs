//! Asset preloading
//!
//! Scenes declare the assets they need before they can run. The lifecycle
//! manager fetches all of them concurrently through an [`AssetLoader`] while a
//! scene is `LOADING`, and joins every fetch before the scene is marked
//! `LOADED`. A single failed asset is logged and skipped.

use futures::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Asset loading errors
#[derive(Debug, Error)]
pub enum AssetError {
    /// Nothing is stored under the requested location
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Reading the asset failed
    #[error("IO error loading {uri}: {source}")]
    Io {
        /// Location that failed
        uri: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The asset was read but its content is unusable
    #[error("Failed to decode asset {uri}: {reason}")]
    Decode {
        /// Location that failed
        uri: String,
        /// What was wrong with it
        reason: String,
    },
}

/// Kind of asset a scene preloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Image used as a sprite texture
    Texture,
    /// Font face for text entities
    Font,
    /// Sound effect or music
    Audio,
    /// Anything else
    Data,
}

/// Declared dependency of a scene on an asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    /// Id the scene refers to the asset by (e.g. a texture id)
    pub id: String,
    /// Asset kind
    pub kind: AssetKind,
    /// Where to fetch it from
    pub uri: String,
}

impl AssetRef {
    /// Create an asset reference
    pub fn new(id: impl Into<String>, kind: AssetKind, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            uri: uri.into(),
        }
    }
}

/// A fetched asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedAsset {
    /// Id from the [`AssetRef`]
    pub id: String,
    /// Asset kind
    pub kind: AssetKind,
    /// Raw bytes
    pub bytes: Vec<u8>,
}

/// Source of asset bytes
///
/// Implementations must not block: the returned future is polled together with
/// the other preloads of the same scene.
pub trait AssetLoader {
    /// Fetch one asset
    fn load<'a>(&'a self, asset: &'a AssetRef) -> BoxFuture<'a, Result<LoadedAsset, AssetError>>;
}

/// Fetch every asset concurrently and wait for all of them
pub async fn load_all(
    loader: &dyn AssetLoader,
    assets: &[AssetRef],
) -> Vec<(AssetRef, Result<LoadedAsset, AssetError>)> {
    let results = future::join_all(assets.iter().map(|asset| loader.load(asset))).await;
    assets.iter().cloned().zip(results).collect()
}

/// Loader serving assets from memory
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetLoader {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryAssetLoader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bytes under `uri` (builder pattern)
    pub fn with_asset(mut self, uri: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(uri.into(), bytes.into());
        self
    }
}

impl AssetLoader for MemoryAssetLoader {
    fn load<'a>(&'a self, asset: &'a AssetRef) -> BoxFuture<'a, Result<LoadedAsset, AssetError>> {
        let result = self
            .entries
            .get(&asset.uri)
            .map(|bytes| LoadedAsset {
                id: asset.id.clone(),
                kind: asset.kind,
                bytes: bytes.clone(),
            })
            .ok_or_else(|| AssetError::NotFound(asset.uri.clone()));
        future::ready(result).boxed()
    }
}

/// Loader reading assets relative to a root directory
#[derive(Debug, Clone)]
pub struct FileAssetLoader {
    root: PathBuf,
}

impl FileAssetLoader {
    /// Create a loader rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetLoader for FileAssetLoader {
    fn load<'a>(&'a self, asset: &'a AssetRef) -> BoxFuture<'a, Result<LoadedAsset, AssetError>> {
        async move {
            let path = self.root.join(&asset.uri);
            let bytes = std::fs::read(&path).map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    AssetError::NotFound(asset.uri.clone())
                } else {
                    AssetError::Io {
                        uri: asset.uri.clone(),
                        source,
                    }
                }
            })?;
            if asset.kind == AssetKind::Font && bytes.is_empty() {
                return Err(AssetError::Decode {
                    uri: asset.uri.clone(),
                    reason: "empty font file".to_string(),
                });
            }
            Ok(LoadedAsset {
                id: asset.id.clone(),
                kind: asset.kind,
                bytes,
            })
        }
        .boxed()
    }
}

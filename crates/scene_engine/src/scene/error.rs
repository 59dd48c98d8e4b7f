//! Scene lifecycle errors

use thiserror::Error;

use super::hooks::{HookError, HookKind};
use super::model::SceneState;

/// Errors raised by the scene lifecycle manager
#[derive(Debug, Error)]
pub enum SceneError {
    /// No scene is registered under the id
    #[error("Scene not found: {0}")]
    SceneNotFound(String),

    /// The requested transition is not allowed from the current state
    #[error("Scene '{id}' cannot {action} while {from}")]
    StateTransition {
        /// Scene id
        id: String,
        /// State the scene was in
        from: SceneState,
        /// Attempted operation
        action: &'static str,
    },

    /// A declared dependency is not registered
    #[error("Scene '{scene}' depends on unknown scene '{dependency}'")]
    DependencyNotFound {
        /// Scene being loaded
        scene: String,
        /// Missing dependency id
        dependency: String,
    },

    /// A fatal lifecycle hook failed
    #[error("{hook} hook of scene '{id}' failed: {source}")]
    HookFailure {
        /// Scene id
        id: String,
        /// Hook that failed
        hook: HookKind,
        /// Error returned by the hook
        #[source]
        source: HookError,
    },

    /// The scene's destroy hook failed earlier; it can only be evicted
    #[error("Scene '{0}' is unusable after a failed destroy")]
    Unusable(String),
}

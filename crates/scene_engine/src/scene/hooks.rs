//! Scene lifecycle hooks
//!
//! A scene may carry one [`SceneHooks`] implementation. Every method has a
//! no-op default, so implementors only override the callbacks they need.
//! Hooks are only ever invoked through [`invoke`], which applies the failure
//! policy: load and destroy failures propagate, all others are logged.
//!
//! Hooks run on the loop thread and must not block.

use std::fmt;

use thiserror::Error;

use super::entity::Entity;
use super::error::SceneError;
use super::model::EntityTable;

/// Error returned by a lifecycle hook
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HookError {
    message: String,
}

impl HookError {
    /// Create a hook error with a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type of every hook
pub type HookResult = Result<(), HookError>;

/// Identifies a lifecycle callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Right after creation
    Preload,
    /// While loading, after assets are fetched
    Load,
    /// First activation after loading
    Start,
    /// Every activation
    Enable,
    /// Every tick while active
    Update,
    /// Every tick while active, after all updates
    LateUpdate,
    /// Active to paused
    Pause,
    /// Paused to active
    Resume,
    /// Deactivation
    Disable,
    /// Before the scene is torn down
    Destroy,
}

impl HookKind {
    /// Whether a failure of this hook aborts the operation that ran it
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::Load | Self::Destroy)
    }

    /// Callback name as shown in logs
    pub fn name(self) -> &'static str {
        match self {
            Self::Preload => "preload",
            Self::Load => "load",
            Self::Start => "start",
            Self::Enable => "enable",
            Self::Update => "update",
            Self::LateUpdate => "late-update",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Disable => "disable",
            Self::Destroy => "destroy",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a hook can see and touch
pub struct HookContext<'a> {
    /// Id of the scene the hook belongs to
    pub scene_id: &'a str,
    /// The scene's entities
    pub entities: &'a mut EntityTable,
    /// Seconds since the previous tick; zero outside update callbacks
    pub delta: f32,
}

impl HookContext<'_> {
    /// Look up an entity by id
    pub fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }
}

/// Optional lifecycle callbacks of a scene
#[allow(unused_variables)]
pub trait SceneHooks {
    /// Called once after the scene is created
    fn on_preload(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        Ok(())
    }

    /// Called while loading; failure rolls the load back
    fn on_load(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        Ok(())
    }

    /// Called on the first activation after loading
    fn on_start(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        Ok(())
    }

    /// Called on every activation
    fn on_enable(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        Ok(())
    }

    /// Called every tick while the scene is active
    fn on_update(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        Ok(())
    }

    /// Called every tick after every active scene has updated
    fn on_late_update(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        Ok(())
    }

    /// Called when the scene is paused
    fn on_pause(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        Ok(())
    }

    /// Called when the scene resumes
    fn on_resume(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        Ok(())
    }

    /// Called when the scene is deactivated
    fn on_disable(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        Ok(())
    }

    /// Called before teardown; failure leaves the scene unusable
    fn on_destroy(&mut self, ctx: &mut HookContext<'_>) -> HookResult {
        Ok(())
    }
}

fn dispatch(hooks: &mut dyn SceneHooks, kind: HookKind, ctx: &mut HookContext<'_>) -> HookResult {
    match kind {
        HookKind::Preload => hooks.on_preload(ctx),
        HookKind::Load => hooks.on_load(ctx),
        HookKind::Start => hooks.on_start(ctx),
        HookKind::Enable => hooks.on_enable(ctx),
        HookKind::Update => hooks.on_update(ctx),
        HookKind::LateUpdate => hooks.on_late_update(ctx),
        HookKind::Pause => hooks.on_pause(ctx),
        HookKind::Resume => hooks.on_resume(ctx),
        HookKind::Disable => hooks.on_disable(ctx),
        HookKind::Destroy => hooks.on_destroy(ctx),
    }
}

/// Run one hook if the scene has any
///
/// Failures of fatal hooks come back as [`SceneError::HookFailure`]; any other
/// failure is logged and swallowed.
pub fn invoke(
    hooks: Option<&mut (dyn SceneHooks + 'static)>,
    kind: HookKind,
    ctx: &mut HookContext<'_>,
) -> Result<(), SceneError> {
    let Some(hooks) = hooks else {
        return Ok(());
    };

    match dispatch(hooks, kind, ctx) {
        Ok(()) => Ok(()),
        Err(source) if kind.is_fatal() => Err(SceneError::HookFailure {
            id: ctx.scene_id.to_string(),
            hook: kind,
            source,
        }),
        Err(source) => {
            log::warn!("{kind} hook of scene '{}' failed: {source}", ctx.scene_id);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl SceneHooks for Failing {
        fn on_pause(&mut self, _ctx: &mut HookContext<'_>) -> HookResult {
            Err(HookError::new("pause broke"))
        }

        fn on_load(&mut self, _ctx: &mut HookContext<'_>) -> HookResult {
            Err(HookError::new("load broke"))
        }
    }

    #[test]
    fn test_missing_hooks_are_a_no_op() {
        let mut entities = EntityTable::new();
        let mut ctx = HookContext {
            scene_id: "s",
            entities: &mut entities,
            delta: 0.0,
        };
        assert!(invoke(None, HookKind::Destroy, &mut ctx).is_ok());
    }

    #[test]
    fn test_non_fatal_failures_are_swallowed() {
        let mut entities = EntityTable::new();
        let mut ctx = HookContext {
            scene_id: "s",
            entities: &mut entities,
            delta: 0.0,
        };
        let mut hooks = Failing;
        assert!(invoke(Some(&mut hooks), HookKind::Pause, &mut ctx).is_ok());
    }

    #[test]
    fn test_fatal_failures_propagate() {
        let mut entities = EntityTable::new();
        let mut ctx = HookContext {
            scene_id: "s",
            entities: &mut entities,
            delta: 0.0,
        };
        let mut hooks = Failing;
        let err = invoke(Some(&mut hooks), HookKind::Load, &mut ctx).unwrap_err();
        match err {
            SceneError::HookFailure { id, hook, source } => {
                assert_eq!(id, "s");
                assert_eq!(hook, HookKind::Load);
                assert_eq!(source.message(), "load broke");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}

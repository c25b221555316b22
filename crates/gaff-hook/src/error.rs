//! Error types for the adapter layer.
//!
//! Nothing here is raised at registration time — the adapter layer
//! validates nothing eagerly. Every variant surfaces lazily, at the
//! moment a handler actually fires (or a behavior name is parsed).
//!
//! # Error Code Convention
//!
//! Adapter-layer errors use the `HOOK_` prefix:
//!
//! | Error | Code |
//! |-------|------|
//! | [`HookError::NotInvocable`] | `HOOK_NOT_INVOCABLE` |
//! | [`HookError::MissingKey`] | `HOOK_MISSING_KEY` |
//! | [`HookError::TypeMismatch`] | `HOOK_TYPE_MISMATCH` |
//! | [`HookError::NoCurrentEvent`] | `HOOK_NO_CURRENT_EVENT` |
//! | [`HookError::UnknownBehavior`] | `HOOK_UNKNOWN_BEHAVIOR` |

use gaff_event::ErrorCode;
use thiserror::Error;

/// Errors produced when an adapter fires (or a behavior is parsed).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    /// The behavior needs a wrapped callback and none was captured.
    #[error("adapter has no callback to invoke")]
    NotInvocable,

    /// The captured mapping lacks a key the behavior reads.
    #[error("captured data is missing key '{0}'")]
    MissingKey(&'static str),

    /// The input or captured value's type does not fit the behavior.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// What the behavior needed.
        expected: &'static str,
        /// What it got.
        found: &'static str,
    },

    /// A fire-once adapter was invoked outside of a dispatch pass, so
    /// there is no event to deregister from.
    #[error("no event is currently firing")]
    NoCurrentEvent,

    /// Unknown behavior name.
    #[error("unknown behavior: {0}")]
    UnknownBehavior(String),
}

impl ErrorCode for HookError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotInvocable => "HOOK_NOT_INVOCABLE",
            Self::MissingKey(_) => "HOOK_MISSING_KEY",
            Self::TypeMismatch { .. } => "HOOK_TYPE_MISMATCH",
            Self::NoCurrentEvent => "HOOK_NO_CURRENT_EVENT",
            Self::UnknownBehavior(_) => "HOOK_UNKNOWN_BEHAVIOR",
        }
    }

    fn is_recoverable(&self) -> bool {
        // All of these are caller bugs: the same registration fails
        // the same way on every firing.
        false
    }
}

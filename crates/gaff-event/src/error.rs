//! Dispatch layer errors and the unified error-code convention.
//!
//! Every error enum in the workspace implements [`ErrorCode`] so callers
//! can branch on stable machine-readable codes instead of display
//! strings.
//!
//! # Error Code Convention
//!
//! Dispatch-layer errors use the `EVENT_` prefix:
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`EventError::HandlerFailed`] | `EVENT_HANDLER_FAILED` | No |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error code interface.
///
/// Implement this for every error type to get:
///
/// - **Machine-readable codes**: for programmatic error handling
/// - **Recoverability info**: for retry logic and user feedback
///
/// # Code Format
///
/// Codes are `UPPER_SNAKE_CASE`, prefixed with the layer name
/// (`EVENT_`, `HOOK_`), and stable once defined.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;

    /// Returns whether retrying the operation may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Validates that an error code follows the workspace conventions.
///
/// # Panics
///
/// Panics with a descriptive message if the code is empty, lacks the
/// expected prefix, or is not `UPPER_SNAKE_CASE`.
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "Error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );
    assert!(
        is_upper_snake_case(code),
        "Error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Validates every variant of an error enum at once.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

/// Checks if a string is UPPER_SNAKE_CASE.
fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Dispatch layer error.
///
/// The dispatcher itself cannot fail: registration always succeeds,
/// removal misses return `false`, and firing an event with no handlers
/// is a no-op. The only failure mode is a handler failing *while* an
/// event is firing, which surfaces here with the event name attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum EventError {
    /// A handler failed while the named event was firing.
    ///
    /// No validation happens at registration time; malformed handlers
    /// are only discovered when they fire.
    #[error("handler failed during '{event}': {message}")]
    HandlerFailed {
        /// Event that was firing when the handler failed.
        event: String,
        /// What went wrong, from the handler's own error.
        message: String,
    },
}

impl EventError {
    /// Wraps a handler-layer failure with the event it happened in.
    pub fn handler_failed(event: impl Into<String>, message: impl ToString) -> Self {
        Self::HandlerFailed {
            event: event.into(),
            message: message.to_string(),
        }
    }
}

impl ErrorCode for EventError {
    fn code(&self) -> &'static str {
        match self {
            Self::HandlerFailed { .. } => "EVENT_HANDLER_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // The handler will fail the same way on the next firing.
            Self::HandlerFailed { .. } => false,
        }
    }
}

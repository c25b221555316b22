//! Adapter behaviors.
//!
//! One adapter instance implements exactly one behavior, selected at
//! construction. The tag decides what [`HandlerAdapter`] does with its
//! captured data when the host dispatcher invokes it.
//!
//! [`HandlerAdapter`]: crate::HandlerAdapter

use crate::HookError;
use std::fmt;
use std::str::FromStr;

/// What an adapter does when its event fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Behavior {
    /// Invoke the wrapped callback with the captured argument list,
    /// discarding whatever the dispatcher passed; hand the
    /// dispatcher's first argument through unchanged.
    Action,
    /// Return the captured data verbatim, ignoring input.
    ReturnValue,
    /// Replace a keyed element, an indexed element, or every substring
    /// occurrence in the input, per the captured `search`/`replace`
    /// mapping.
    Replace,
    /// Insert the captured value(s) at the front of the input.
    Prepend,
    /// Add the captured value(s) at the end of the input.
    Append,
    /// Deregister self, then invoke the wrapped callback once.
    Once,
}

impl Behavior {
    /// All behaviors, in a stable order.
    pub const ALL: &'static [Behavior] = &[
        Behavior::Action,
        Behavior::ReturnValue,
        Behavior::Replace,
        Behavior::Prepend,
        Behavior::Append,
        Behavior::Once,
    ];

    /// Returns the canonical string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::ReturnValue => "return",
            Self::Replace => "replace",
            Self::Prepend => "prepend",
            Self::Append => "append",
            Self::Once => "once",
        }
    }

    /// Returns `true` for behaviors that carry only captured data and
    /// no code, which makes them declarable in configuration.
    #[must_use]
    pub fn is_data_only(&self) -> bool {
        matches!(
            self,
            Self::ReturnValue | Self::Replace | Self::Prepend | Self::Append
        )
    }
}

impl FromStr for Behavior {
    type Err = HookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "action" => Ok(Self::Action),
            "return" => Ok(Self::ReturnValue),
            "replace" => Ok(Self::Replace),
            "prepend" => Ok(Self::Prepend),
            "append" => Ok(Self::Append),
            "once" => Ok(Self::Once),
            _ => Err(HookError::UnknownBehavior(s.to_string())),
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

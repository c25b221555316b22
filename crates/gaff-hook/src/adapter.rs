//! Stateful handler adapter.
//!
//! A [`HandlerAdapter`] closes over caller-supplied data (and
//! optionally a wrapped callback) at registration time and performs
//! one fixed [`Behavior`] when the host dispatcher invokes it. The
//! adapter is an immutable value: removal later locates it by deep
//! equality of the captured state, not by a reference the caller kept.

use crate::{Behavior, HookError};
use gaff_event::{Dispatcher, EventError, Handler};
use serde_json::{json, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A caller-supplied callback wrapped by action-style and fire-once
/// adapters.
///
/// Receives the (already truncated) argument list and returns the
/// value fed back to the dispatch chain. Action adapters discard the
/// return; side-effect callbacks conventionally return `Value::Null`.
pub type Callback = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Wraps a closure into a [`Callback`].
pub fn callback<F>(f: F) -> Callback
where
    F: Fn(&[Value]) -> Value + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A value-holding handler performing one fixed behavior.
///
/// Created fresh by every facade registration and owned by the host
/// dispatcher's registry entry from then on. Two adapters are
/// *equivalent* for removal purposes iff their behaviors match, their
/// captured data is deep-equal, and their callbacks are both absent or
/// the same allocation — see [`HandlerAdapter::matches`]. Priority and
/// accepted-arg count are not part of equivalence; the registry slot
/// being scanned carries those.
pub struct HandlerAdapter {
    behavior: Behavior,
    data: Value,
    callback: Option<Callback>,
}

impl HandlerAdapter {
    /// Action adapter: fires `callback` with the captured `args`,
    /// ignoring whatever the dispatcher passes.
    #[must_use]
    pub fn action(args: Vec<Value>, callback: Callback) -> Self {
        Self {
            behavior: Behavior::Action,
            data: Value::Array(args),
            callback: Some(callback),
        }
    }

    /// Pure filter adapter: returns `value` verbatim on every firing.
    #[must_use]
    pub fn return_value(value: Value) -> Self {
        Self {
            behavior: Behavior::ReturnValue,
            data: value,
            callback: None,
        }
    }

    /// Replace adapter: substitutes `replace` at key/index/substring
    /// `search` in the filtered value.
    #[must_use]
    pub fn replace(search: Value, replace: Value) -> Self {
        Self {
            behavior: Behavior::Replace,
            data: json!({ "search": search, "replace": replace }),
            callback: None,
        }
    }

    /// Prepend adapter: inserts `value` at the front of the filtered
    /// container or text.
    #[must_use]
    pub fn prepend(value: Value) -> Self {
        Self {
            behavior: Behavior::Prepend,
            data: value,
            callback: None,
        }
    }

    /// Append adapter: adds `value` at the end of the filtered
    /// container or text.
    #[must_use]
    pub fn append(value: Value) -> Self {
        Self {
            behavior: Behavior::Append,
            data: value,
            callback: None,
        }
    }

    /// Fire-once adapter: deregisters itself from
    /// `(current event, priority, accepted_args)` and then runs
    /// `callback` a single time.
    #[must_use]
    pub fn once(priority: i32, accepted_args: usize, callback: Callback) -> Self {
        Self {
            behavior: Behavior::Once,
            data: json!({ "priority": priority, "accepted_args": accepted_args }),
            callback: Some(callback),
        }
    }

    /// The behavior this adapter performs.
    #[must_use]
    pub fn behavior(&self) -> Behavior {
        self.behavior
    }

    /// The captured data, read-only for the adapter's lifetime.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Equivalence check used by the removal scan.
    ///
    /// Map-typed captured data compares structurally, so key order is
    /// irrelevant. Callbacks compare by allocation address: only the
    /// same `Arc` (or a clone of it) matches.
    #[must_use]
    pub fn matches(&self, behavior: Behavior, data: &Value, callback: Option<&Callback>) -> bool {
        if self.behavior != behavior || self.data != *data {
            return false;
        }
        match (&self.callback, callback) {
            (None, None) => true,
            (Some(own), Some(other)) => std::ptr::addr_eq(Arc::as_ptr(own), Arc::as_ptr(other)),
            _ => false,
        }
    }

    fn run_action(&self, args: &[Value]) -> Result<Option<Value>, HookError> {
        let callback = self.callback.as_ref().ok_or(HookError::NotInvocable)?;
        match &self.data {
            Value::Array(captured) => callback(captured.as_slice()),
            single => callback(std::slice::from_ref(single)),
        };
        // Filter compatibility: hand the first dispatcher argument
        // through unchanged, or nothing if none was passed.
        Ok(args.first().cloned())
    }

    fn run_replace(&self, args: &[Value]) -> Result<Option<Value>, HookError> {
        let search = self.data.get("search").ok_or(HookError::MissingKey("search"))?;
        let replacement = self
            .data
            .get("replace")
            .ok_or(HookError::MissingKey("replace"))?;

        let input = args.first().cloned().unwrap_or(Value::Null);
        match input {
            Value::Object(mut map) => {
                let key = search.as_str().ok_or(HookError::TypeMismatch {
                    expected: "string key",
                    found: value_kind(search),
                })?;
                map.insert(key.to_string(), replacement.clone());
                Ok(Some(Value::Object(map)))
            }
            Value::Array(mut items) => {
                let index = search.as_u64().ok_or(HookError::TypeMismatch {
                    expected: "integer index",
                    found: value_kind(search),
                })? as usize;
                // Out-of-range indexes leave the input unchanged;
                // index == len grows the sequence by one.
                if index < items.len() {
                    items[index] = replacement.clone();
                } else if index == items.len() {
                    items.push(replacement.clone());
                }
                Ok(Some(Value::Array(items)))
            }
            Value::String(text) => {
                let needle = text_fragment(search).ok_or(HookError::TypeMismatch {
                    expected: "text search fragment",
                    found: value_kind(search),
                })?;
                let with = text_fragment(replacement).ok_or(HookError::TypeMismatch {
                    expected: "text replacement fragment",
                    found: value_kind(replacement),
                })?;
                Ok(Some(Value::String(text.replace(&needle, &with))))
            }
            other => Err(HookError::TypeMismatch {
                expected: "object, array, or string",
                found: value_kind(&other),
            }),
        }
    }

    fn run_prepend(&self, args: &[Value]) -> Result<Option<Value>, HookError> {
        let input = args.first().cloned().unwrap_or(Value::Null);
        match input {
            Value::Array(items) => {
                // A captured sequence splices element-by-element in its
                // original order; anything else goes in as one unit.
                let mut out = match &self.data {
                    Value::Array(captured) => captured.clone(),
                    single => vec![single.clone()],
                };
                out.extend(items);
                Ok(Some(Value::Array(out)))
            }
            Value::String(text) => {
                let front = text_fragment(&self.data).ok_or(HookError::TypeMismatch {
                    expected: "text fragment",
                    found: value_kind(&self.data),
                })?;
                Ok(Some(Value::String(format!("{front}{text}"))))
            }
            other => Err(HookError::TypeMismatch {
                expected: "array or string",
                found: value_kind(&other),
            }),
        }
    }

    fn run_append(&self, args: &[Value]) -> Result<Option<Value>, HookError> {
        let input = args.first().cloned().unwrap_or(Value::Null);
        match input {
            Value::Array(mut items) => {
                match &self.data {
                    Value::Array(captured) => items.extend(captured.iter().cloned()),
                    single => items.push(single.clone()),
                }
                Ok(Some(Value::Array(items)))
            }
            Value::String(text) => {
                let tail = text_fragment(&self.data).ok_or(HookError::TypeMismatch {
                    expected: "text fragment",
                    found: value_kind(&self.data),
                })?;
                Ok(Some(Value::String(format!("{text}{tail}"))))
            }
            other => Err(HookError::TypeMismatch {
                expected: "array or string",
                found: value_kind(&other),
            }),
        }
    }

    fn run_once(&self, host: &mut Dispatcher, args: &[Value]) -> Result<Option<Value>, HookError> {
        let event = host
            .current_event()
            .ok_or(HookError::NoCurrentEvent)?
            .to_string();
        let priority = match self.data.get("priority") {
            None => return Err(HookError::MissingKey("priority")),
            Some(v) => v.as_i64().ok_or(HookError::TypeMismatch {
                expected: "integer priority",
                found: value_kind(v),
            })? as i32,
        };
        let accepted_args = match self.data.get("accepted_args") {
            None => return Err(HookError::MissingKey("accepted_args")),
            Some(v) => v.as_u64().ok_or(HookError::TypeMismatch {
                expected: "integer accepted_args",
                found: value_kind(v),
            })? as usize,
        };

        // Deregister first: a re-entrant firing of the same event must
        // not see this entry.
        host.unregister(&event, self, priority, accepted_args);

        let callback = self.callback.as_ref().ok_or(HookError::NotInvocable)?;
        Ok(Some(callback(args)))
    }
}

impl Handler for HandlerAdapter {
    fn invoke(&self, host: &mut Dispatcher, args: &[Value]) -> Result<Option<Value>, EventError> {
        let outcome = match self.behavior {
            Behavior::Action => self.run_action(args),
            Behavior::ReturnValue => Ok(Some(self.data.clone())),
            Behavior::Replace => self.run_replace(args),
            Behavior::Prepend => self.run_prepend(args),
            Behavior::Append => self.run_append(args),
            Behavior::Once => self.run_once(host, args),
        };
        outcome
            .map_err(|err| EventError::handler_failed(host.current_event().unwrap_or("<none>"), err))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for HandlerAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerAdapter")
            .field("behavior", &self.behavior)
            .field("data", &self.data)
            .field("callback", &self.callback.as_ref().map(Arc::as_ptr))
            .finish()
    }
}

/// Short type name for error messages.
fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Stringifies scalars for text concatenation; containers and null
/// have no text form.
fn text_fragment(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

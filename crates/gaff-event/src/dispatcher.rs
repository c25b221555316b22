//! Event dispatcher — named events, priority-ordered handler registry,
//! action and filter dispatch.
//!
//! Single-threaded and synchronous: firing an event invokes every
//! registered handler on the calling thread, in ascending priority
//! order, insertion order within a priority. Handlers receive the
//! dispatcher itself and may mutate the registry or fire further
//! events mid-pass.

use crate::{EventError, Handler};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Conventional default priority for registrations.
///
/// Lower priorities fire earlier; handlers that don't care about
/// ordering register at this value.
pub const DEFAULT_PRIORITY: i32 = 10;

/// A registered handler plus the argument count it accepts.
///
/// The element type of a registry slot. `accepted_args` caps how many
/// of the firing arguments the dispatcher hands to the target.
#[derive(Clone)]
pub struct Entry {
    target: Arc<dyn Handler>,
    accepted_args: usize,
}

impl Entry {
    /// The registered callable.
    #[must_use]
    pub fn target(&self) -> &Arc<dyn Handler> {
        &self.target
    }

    /// How many firing arguments the target accepts.
    #[must_use]
    pub fn accepted_args(&self) -> usize {
        self.accepted_args
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("target", &Arc::as_ptr(&self.target))
            .field("accepted_args", &self.accepted_args)
            .finish()
    }
}

/// Central dispatch for named events.
///
/// The registry is keyed by event name, then by priority; each
/// `(event, priority)` slot holds entries in registration order.
/// Firing order is ascending priority, ties broken by insertion order.
///
/// # Mutation During a Pass
///
/// Dispatch iterates a snapshot of the event's slots taken before the
/// pass begins, and skips any snapshot entry that has since been
/// unregistered. A handler removing itself (or any other entry)
/// mid-pass therefore never causes a still-registered handler to be
/// skipped or invoked twice, and handlers registered mid-pass first
/// fire on the next pass.
///
/// # Example
///
/// ```
/// use gaff_event::{Dispatcher, FnHandler, DEFAULT_PRIORITY};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let mut dispatcher = Dispatcher::new();
/// dispatcher.register(
///     "greeting",
///     Arc::new(FnHandler::new(|args| {
///         args.first()
///             .and_then(|v| v.as_str())
///             .map(|s| json!(format!("{s}, world")))
///     })),
///     DEFAULT_PRIORITY,
///     1,
/// );
///
/// let out = dispatcher
///     .dispatch_filter("greeting", json!("hello"), &[])
///     .unwrap();
/// assert_eq!(out, json!("hello, world"));
/// ```
pub struct Dispatcher {
    registry: HashMap<String, BTreeMap<i32, Vec<Entry>>>,
    /// Stack of event names currently firing (innermost last).
    current: Vec<String>,
}

impl Dispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: HashMap::new(),
            current: Vec::new(),
        }
    }

    /// Registers a handler under `(event, priority)`.
    ///
    /// Duplicates are allowed; entries in a slot keep registration
    /// order. Nothing is validated here — a broken handler is only
    /// discovered when the event fires.
    pub fn register(
        &mut self,
        event: impl Into<String>,
        target: Arc<dyn Handler>,
        priority: i32,
        accepted_args: usize,
    ) {
        let event = event.into();
        debug!(event = %event, priority, accepted_args, "register handler");
        self.registry
            .entry(event)
            .or_default()
            .entry(priority)
            .or_default()
            .push(Entry {
                target,
                accepted_args,
            });
    }

    /// Removes one entry from the `(event, priority)` slot.
    ///
    /// The entry must hold the same callable allocation as `target`
    /// and the same accepted-arg count. Only the first match is
    /// removed. Returns `false` when nothing matched — a miss is not
    /// an error.
    pub fn unregister(
        &mut self,
        event: &str,
        target: &dyn Handler,
        priority: i32,
        accepted_args: usize,
    ) -> bool {
        let Some(buckets) = self.registry.get_mut(event) else {
            return false;
        };
        let Some(slot) = buckets.get_mut(&priority) else {
            return false;
        };
        let Some(pos) = slot.iter().position(|entry| {
            std::ptr::addr_eq(Arc::as_ptr(&entry.target), target as *const dyn Handler)
                && entry.accepted_args == accepted_args
        }) else {
            return false;
        };

        slot.remove(pos);
        debug!(event = %event, priority, "unregister handler");

        // Prune empty slots so `handler_count` and `slot` reflect
        // reality and the registry does not accrete dead keys.
        if slot.is_empty() {
            buckets.remove(&priority);
            if buckets.is_empty() {
                self.registry.remove(event);
            }
        }
        true
    }

    /// Fires `event` for side effects, discarding handler outputs.
    ///
    /// Each handler receives `args` truncated to its accepted-arg
    /// count. The first handler error aborts the pass and propagates.
    pub fn dispatch_action(&mut self, event: &str, args: &[Value]) -> Result<(), EventError> {
        let snapshot = self.snapshot(event);
        if snapshot.is_empty() {
            return Ok(());
        }
        trace!(event = %event, handlers = snapshot.len(), "dispatch action");

        self.current.push(event.to_string());
        let outcome = self.run_action(event, &snapshot, args);
        self.current.pop();
        outcome
    }

    /// Fires `event` as a filter, threading `value` through the chain.
    ///
    /// Each handler receives `[value, extra...]` truncated to its
    /// accepted-arg count; a `Some` return becomes the value fed to
    /// the next handler. Returns the final value (unchanged if no
    /// handlers are registered).
    pub fn dispatch_filter(
        &mut self,
        event: &str,
        value: Value,
        extra: &[Value],
    ) -> Result<Value, EventError> {
        let snapshot = self.snapshot(event);
        if snapshot.is_empty() {
            return Ok(value);
        }
        trace!(event = %event, handlers = snapshot.len(), "dispatch filter");

        self.current.push(event.to_string());
        let outcome = self.run_filter(event, &snapshot, value, extra);
        self.current.pop();
        outcome
    }

    /// Name of the event currently firing, if any.
    ///
    /// Re-entrant dispatch nests: this reports the innermost pass.
    #[must_use]
    pub fn current_event(&self) -> Option<&str> {
        self.current.last().map(String::as_str)
    }

    /// Read access to the `(event, priority)` slot, in registration
    /// order. Empty when no such slot exists.
    #[must_use]
    pub fn slot(&self, event: &str, priority: i32) -> &[Entry] {
        self.registry
            .get(event)
            .and_then(|buckets| buckets.get(&priority))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of handlers registered for `event` across all priorities.
    #[must_use]
    pub fn handler_count(&self, event: &str) -> usize {
        self.registry
            .get(event)
            .map(|buckets| buckets.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Returns `true` if no handlers are registered at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    fn run_action(
        &mut self,
        event: &str,
        snapshot: &[(i32, Entry)],
        args: &[Value],
    ) -> Result<(), EventError> {
        for (priority, entry) in snapshot {
            if !self.is_registered(event, *priority, &entry.target) {
                continue;
            }
            let take = entry.accepted_args.min(args.len());
            let target = entry.target.clone();
            target.invoke(self, &args[..take])?;
        }
        Ok(())
    }

    fn run_filter(
        &mut self,
        event: &str,
        snapshot: &[(i32, Entry)],
        mut value: Value,
        extra: &[Value],
    ) -> Result<Value, EventError> {
        for (priority, entry) in snapshot {
            if !self.is_registered(event, *priority, &entry.target) {
                continue;
            }
            let mut args = Vec::with_capacity(1 + extra.len());
            args.push(value.clone());
            args.extend_from_slice(extra);
            let take = entry.accepted_args.min(args.len());

            let target = entry.target.clone();
            if let Some(next) = target.invoke(self, &args[..take])? {
                value = next;
            }
        }
        Ok(value)
    }

    /// Stable copy of the event's slots in firing order.
    fn snapshot(&self, event: &str) -> Vec<(i32, Entry)> {
        self.registry
            .get(event)
            .map(|buckets| {
                buckets
                    .iter()
                    .flat_map(|(priority, slot)| {
                        slot.iter().map(|entry| (*priority, entry.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether a snapshot entry is still present in its slot.
    fn is_registered(&self, event: &str, priority: i32, target: &Arc<dyn Handler>) -> bool {
        self.registry
            .get(event)
            .and_then(|buckets| buckets.get(&priority))
            .is_some_and(|slot| {
                slot.iter()
                    .any(|entry| std::ptr::addr_eq(Arc::as_ptr(&entry.target), Arc::as_ptr(target)))
            })
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

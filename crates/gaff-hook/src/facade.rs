//! Registration facade — convenience constructors and destructors.
//!
//! Each `add_*` function builds a fresh [`HandlerAdapter`] with the
//! capture shape its behavior needs and registers it with the host
//! dispatcher. The adapter itself is never handed back to the caller;
//! the matching `remove_*` function reconstructs the capture value and
//! scans the `(event, priority)` slot for the first adapter-backed
//! entry with equal state — same behavior, deep-equal data, same
//! callback allocation — and removes exactly that entry.
//!
//! A removal miss is not an error: `remove_*` returns `false` when the
//! slot is empty, holds no adapter-backed entries, or nothing matches.

use crate::{Behavior, Callback, HandlerAdapter};
use gaff_event::{Dispatcher, FnHandler, Handler};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Registers a callback fired with `args` regardless of what the
/// dispatcher passes. The declared accepted-arg count equals the
/// number of captured args, so filter dispatch still hands the first
/// value through unchanged.
pub fn add_action_with_args(
    dispatcher: &mut Dispatcher,
    event: &str,
    callback: Callback,
    priority: i32,
    args: Vec<Value>,
) {
    let accepted_args = args.len();
    let adapter = HandlerAdapter::action(args, callback);
    dispatcher.register(event, Arc::new(adapter), priority, accepted_args);
}

/// Removes one action registration with equal captured args and the
/// same callback.
pub fn remove_action_with_args(
    dispatcher: &mut Dispatcher,
    event: &str,
    callback: &Callback,
    priority: i32,
    args: Vec<Value>,
) -> bool {
    remove_matching(
        dispatcher,
        event,
        priority,
        Behavior::Action,
        &Value::Array(args),
        Some(callback),
    )
}

/// Registers a filter that overrides the filtered value with `value`.
pub fn add_filter_return(dispatcher: &mut Dispatcher, event: &str, value: Value, priority: i32) {
    dispatcher.register(event, Arc::new(HandlerAdapter::return_value(value)), priority, 0);
}

/// Removes one value-override registration with equal captured value.
pub fn remove_filter_return(
    dispatcher: &mut Dispatcher,
    event: &str,
    value: Value,
    priority: i32,
) -> bool {
    remove_matching(dispatcher, event, priority, Behavior::ReturnValue, &value, None)
}

/// Registers a filter that substitutes `replace` at key, index, or
/// substring `search` in the filtered value.
pub fn add_filter_replace(
    dispatcher: &mut Dispatcher,
    event: &str,
    search: Value,
    replace: Value,
    priority: i32,
) {
    dispatcher.register(
        event,
        Arc::new(HandlerAdapter::replace(search, replace)),
        priority,
        1,
    );
}

/// Removes one replace registration with equal `search`/`replace`.
pub fn remove_filter_replace(
    dispatcher: &mut Dispatcher,
    event: &str,
    search: Value,
    replace: Value,
    priority: i32,
) -> bool {
    // Same capture shape the constructor builds.
    let probe = HandlerAdapter::replace(search, replace);
    remove_matching(dispatcher, event, priority, Behavior::Replace, probe.data(), None)
}

/// Registers a filter that inserts `value` at the front of the
/// filtered container or text.
pub fn add_filter_prepend(dispatcher: &mut Dispatcher, event: &str, value: Value, priority: i32) {
    dispatcher.register(event, Arc::new(HandlerAdapter::prepend(value)), priority, 1);
}

/// Removes one prepend registration with equal captured value.
pub fn remove_filter_prepend(
    dispatcher: &mut Dispatcher,
    event: &str,
    value: Value,
    priority: i32,
) -> bool {
    remove_matching(dispatcher, event, priority, Behavior::Prepend, &value, None)
}

/// Registers a filter that adds `value` at the end of the filtered
/// container or text.
pub fn add_filter_append(dispatcher: &mut Dispatcher, event: &str, value: Value, priority: i32) {
    dispatcher.register(event, Arc::new(HandlerAdapter::append(value)), priority, 1);
}

/// Removes one append registration with equal captured value.
pub fn remove_filter_append(
    dispatcher: &mut Dispatcher,
    event: &str,
    value: Value,
    priority: i32,
) -> bool {
    remove_matching(dispatcher, event, priority, Behavior::Append, &value, None)
}

/// Registers a callback that fires once and deregisters itself.
///
/// The priority and accepted-arg count are captured so the adapter can
/// find its own registry entry when it fires.
pub fn add_filter_once(
    dispatcher: &mut Dispatcher,
    event: &str,
    callback: Callback,
    priority: i32,
    accepted_args: usize,
) {
    let adapter = HandlerAdapter::once(priority, accepted_args, callback);
    dispatcher.register(event, Arc::new(adapter), priority, accepted_args);
}

/// Removes one fire-once registration before it has fired.
pub fn remove_filter_once(
    dispatcher: &mut Dispatcher,
    event: &str,
    callback: &Callback,
    priority: i32,
    accepted_args: usize,
) -> bool {
    let probe = HandlerAdapter::once(priority, accepted_args, callback.clone());
    remove_matching(
        dispatcher,
        event,
        priority,
        Behavior::Once,
        probe.data(),
        Some(callback),
    )
}

/// Alias of [`add_filter_once`] for action-style events.
pub fn add_action_once(
    dispatcher: &mut Dispatcher,
    event: &str,
    callback: Callback,
    priority: i32,
    accepted_args: usize,
) {
    add_filter_once(dispatcher, event, callback, priority, accepted_args);
}

/// Alias of [`remove_filter_once`].
pub fn remove_action_once(
    dispatcher: &mut Dispatcher,
    event: &str,
    callback: &Callback,
    priority: i32,
    accepted_args: usize,
) -> bool {
    remove_filter_once(dispatcher, event, callback, priority, accepted_args)
}

/// Registers each `(event name, callback)` pair under the event of the
/// same name.
///
/// Returns the registered targets so callers can
/// [`Dispatcher::unregister`] them later.
pub fn add_methods<I, S>(
    dispatcher: &mut Dispatcher,
    methods: I,
    priority: i32,
    accepted_args: usize,
) -> Vec<Arc<dyn Handler>>
where
    I: IntoIterator<Item = (S, Callback)>,
    S: Into<String>,
{
    let mut targets: Vec<Arc<dyn Handler>> = Vec::new();
    for (event, callback) in methods {
        let target: Arc<dyn Handler> =
            Arc::new(FnHandler::new(move |args: &[Value]| Some(callback(args))));
        dispatcher.register(event.into(), target.clone(), priority, accepted_args);
        targets.push(target);
    }
    targets
}

/// Scans the `(event, priority)` slot for the first adapter-backed
/// entry equivalent to the probe state and removes it.
fn remove_matching(
    dispatcher: &mut Dispatcher,
    event: &str,
    priority: i32,
    behavior: Behavior,
    data: &Value,
    callback: Option<&Callback>,
) -> bool {
    let mut found = None;
    for entry in dispatcher.slot(event, priority) {
        let Some(adapter) = entry.target().as_any().downcast_ref::<HandlerAdapter>() else {
            continue;
        };
        if adapter.matches(behavior, data, callback) {
            found = Some((entry.target().clone(), entry.accepted_args()));
            break;
        }
    }

    match found {
        Some((target, accepted_args)) => {
            dispatcher.unregister(event, target.as_ref(), priority, accepted_args)
        }
        None => {
            debug!(event = %event, priority, behavior = %behavior, "no matching adapter to remove");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::callback;
    use serde_json::json;
    use std::sync::Mutex;

    fn counting_callback() -> (Callback, Arc<Mutex<Vec<Vec<Value>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in = seen.clone();
        let cb = callback(move |args: &[Value]| {
            seen_in.lock().unwrap().push(args.to_vec());
            Value::Null
        });
        (cb, seen)
    }

    // ── Register / remove round trips ────────────────────────

    #[test]
    fn return_round_trip_removes_exactly_one() {
        let mut d = Dispatcher::new();
        add_filter_return(&mut d, "title", json!("a"), 10);
        add_filter_return(&mut d, "title", json!("a"), 10);
        add_filter_return(&mut d, "title", json!("b"), 10);
        assert_eq!(d.handler_count("title"), 3);

        assert!(remove_filter_return(&mut d, "title", json!("a"), 10));
        assert_eq!(d.handler_count("title"), 2);

        // The "b" registration is untouched and still wins the chain.
        assert!(remove_filter_return(&mut d, "title", json!("a"), 10));
        let out = d.dispatch_filter("title", json!("orig"), &[]).unwrap();
        assert_eq!(out, json!("b"));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut d = Dispatcher::new();
        add_filter_prepend(&mut d, "items", json!("x"), 10);

        assert!(remove_filter_prepend(&mut d, "items", json!("x"), 10));
        assert!(!remove_filter_prepend(&mut d, "items", json!("x"), 10));
        assert!(!remove_filter_prepend(&mut d, "items", json!("x"), 10));
    }

    #[test]
    fn remove_misses_on_wrong_priority_or_data() {
        let mut d = Dispatcher::new();
        add_filter_append(&mut d, "items", json!([1, 2]), 10);

        assert!(!remove_filter_append(&mut d, "items", json!([1, 2]), 20));
        assert!(!remove_filter_append(&mut d, "items", json!([2, 1]), 10));
        assert!(!remove_filter_append(&mut d, "other", json!([1, 2]), 10));
        assert_eq!(d.handler_count("items"), 1);
    }

    #[test]
    fn remove_skips_entries_that_are_not_adapters() {
        let mut d = Dispatcher::new();
        d.register(
            "title",
            Arc::new(FnHandler::new(|_| Some(json!("plain")))),
            10,
            1,
        );
        add_filter_return(&mut d, "title", json!("fixed"), 10);

        assert!(remove_filter_return(&mut d, "title", json!("fixed"), 10));
        // The plain handler survives the scan untouched.
        assert_eq!(d.handler_count("title"), 1);
        let out = d.dispatch_filter("title", json!("x"), &[]).unwrap();
        assert_eq!(out, json!("plain"));
    }

    #[test]
    fn replace_round_trip() {
        let mut d = Dispatcher::new();
        add_filter_replace(&mut d, "config", json!("host"), json!("localhost"), 10);
        assert!(remove_filter_replace(
            &mut d,
            "config",
            json!("host"),
            json!("localhost"),
            10
        ));
        assert!(d.is_empty());
    }

    // ── Action adapters ──────────────────────────────────────

    #[test]
    fn action_ignores_filter_input_but_passes_it_through() {
        let mut d = Dispatcher::new();
        let (cb, seen) = counting_callback();
        add_action_with_args(&mut d, "notify", cb, 10, vec![json!("x"), json!("y")]);

        let out = d.dispatch_filter("notify", json!("ignored"), &[]).unwrap();

        assert_eq!(out, json!("ignored"));
        assert_eq!(*seen.lock().unwrap(), vec![vec![json!("x"), json!("y")]]);
    }

    #[test]
    fn action_removal_requires_same_callback() {
        let mut d = Dispatcher::new();
        let (cb, _) = counting_callback();
        let (stranger, _) = counting_callback();
        add_action_with_args(&mut d, "notify", cb.clone(), 10, vec![json!(1)]);

        assert!(!remove_action_with_args(&mut d, "notify", &stranger, 10, vec![json!(1)]));
        assert!(remove_action_with_args(&mut d, "notify", &cb, 10, vec![json!(1)]));
    }

    // ── Once adapters ────────────────────────────────────────

    #[test]
    fn once_can_be_removed_before_it_fires() {
        let mut d = Dispatcher::new();
        let (cb, seen) = counting_callback();
        add_filter_once(&mut d, "boot", cb.clone(), 10, 1);

        assert!(remove_filter_once(&mut d, "boot", &cb, 10, 1));
        d.dispatch_action("boot", &[json!(1)]).unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn action_once_alias_behaves_like_filter_once() {
        let mut d = Dispatcher::new();
        let (cb, seen) = counting_callback();
        add_action_once(&mut d, "boot", cb.clone(), 10, 1);

        d.dispatch_action("boot", &[json!("a")]).unwrap();
        d.dispatch_action("boot", &[json!("b")]).unwrap();

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert!(!remove_action_once(&mut d, "boot", &cb, 10, 1)); // already gone
    }

    // ── add_methods ──────────────────────────────────────────

    #[test]
    fn add_methods_registers_each_pair_under_its_event() {
        let mut d = Dispatcher::new();
        let (on_save, save_seen) = counting_callback();
        let (on_load, load_seen) = counting_callback();

        let targets = add_methods(
            &mut d,
            vec![("doc.save", on_save), ("doc.load", on_load)],
            10,
            1,
        );
        assert_eq!(targets.len(), 2);

        d.dispatch_action("doc.save", &[json!("payload")]).unwrap();
        assert_eq!(save_seen.lock().unwrap().len(), 1);
        assert!(load_seen.lock().unwrap().is_empty());

        // Returned targets unregister without reflection.
        assert!(d.unregister("doc.save", targets[0].as_ref(), 10, 1));
        assert!(d.unregister("doc.load", targets[1].as_ref(), 10, 1));
        assert!(d.is_empty());
    }
}

//! Handler trait and testing utilities.

use crate::{Dispatcher, EventError};
use serde_json::Value;
use std::any::Any;

/// A registered callable unit.
///
/// Handlers are registered with the [`Dispatcher`] under an event name
/// and a priority, and invoked when that event fires. The dispatcher
/// hands each handler the firing arguments truncated to the
/// accepted-arg count it was registered with.
///
/// # Invocation Contract
///
/// - Return `Ok(Some(value))` to substitute `value` into the filter
///   chain (the next handler receives it as its first argument).
/// - Return `Ok(None)` to leave the chain's value untouched.
/// - Return `Err(..)` to abort the dispatch pass; the error propagates
///   to the dispatching caller.
///
/// Action dispatch ignores returned values but still stops on errors.
///
/// # Re-entrancy
///
/// `invoke` receives the dispatcher itself, so a handler may fire
/// further events or mutate the registry mid-pass. The dispatcher
/// iterates a snapshot, so removing entries (including the handler
/// removing itself) never skips or double-invokes other handlers in
/// the same pass.
///
/// # Thread Safety
///
/// Handlers are `Send + Sync` so a caller may wrap the dispatcher in a
/// lock of their choosing; the dispatch layer itself is single-threaded
/// and performs no synchronization.
pub trait Handler: Send + Sync {
    /// Invoked when a subscribed event fires.
    fn invoke(&self, host: &mut Dispatcher, args: &[Value]) -> Result<Option<Value>, EventError>;

    /// Type-erased view of the concrete handler.
    ///
    /// Registry scans downcast through this to recognize their own
    /// handler types among a slot's entries.
    fn as_any(&self) -> &dyn Any;
}

/// Adapts a plain closure into a [`Handler`].
///
/// For handlers that never touch the dispatcher: the closure receives
/// the (truncated) firing arguments and returns the replacement value,
/// or `None` to leave the chain untouched.
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
///     "doc.title",
///     Arc::new(FnHandler::new(|args| {
///         args.first()
///             .and_then(|v| v.as_str())
///             .map(|s| json!(s.to_uppercase()))
///     })),
///     DEFAULT_PRIORITY,
///     1,
/// );
///
/// let out = dispatcher
///     .dispatch_filter("doc.title", json!("quiet"), &[])
///     .unwrap();
/// assert_eq!(out, json!("QUIET"));
/// ```
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&[Value]) -> Option<Value> + Send + Sync + 'static,
{
    /// Wraps the closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(&[Value]) -> Option<Value> + Send + Sync + 'static,
{
    fn invoke(&self, _host: &mut Dispatcher, args: &[Value]) -> Result<Option<Value>, EventError> {
        Ok((self.f)(args))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Test utilities for the dispatch layer.
#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// A mock handler for testing.
    ///
    /// Appends its label to a shared firing log on every invocation
    /// (for ordering assertions), counts calls, and returns a fixed
    /// output.
    pub struct RecordingHandler {
        /// Label appended to the shared log per invocation.
        pub label: String,
        /// Shared firing log, usually shared across several handlers.
        pub log: Arc<Mutex<Vec<String>>>,
        /// Number of times `invoke` has been called.
        pub call_count: Arc<AtomicUsize>,
        /// Value returned from `invoke` (`None` = leave chain untouched).
        pub output: Option<Value>,
    }

    impl RecordingHandler {
        /// Creates a pass-through recorder with the given label.
        pub fn new(label: &str, log: Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                label: label.to_string(),
                log,
                call_count: Arc::new(AtomicUsize::new(0)),
                output: None,
            }
        }

        /// Sets the value returned on every invocation.
        #[must_use]
        pub fn with_output(mut self, output: Value) -> Self {
            self.output = Some(output);
            self
        }

        /// Returns the number of times this handler has fired.
        pub fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    impl Handler for RecordingHandler {
        fn invoke(
            &self,
            _host: &mut Dispatcher,
            _args: &[Value],
        ) -> Result<Option<Value>, EventError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.log
                .lock()
                .expect("firing log poisoned")
                .push(self.label.clone());
            Ok(self.output.clone())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    /// A mock handler that always fails.
    pub struct FailingHandler {
        /// Message carried in the produced error.
        pub message: String,
    }

    impl FailingHandler {
        /// Creates a handler that fails with the given message.
        pub fn new(message: &str) -> Self {
            Self {
                message: message.to_string(),
            }
        }
    }

    impl Handler for FailingHandler {
        fn invoke(
            &self,
            host: &mut Dispatcher,
            _args: &[Value],
        ) -> Result<Option<Value>, EventError> {
            let event = host.current_event().unwrap_or("<none>");
            Err(EventError::handler_failed(event, &self.message))
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingHandler;
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn shared_log() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn fn_handler_substitutes_value() {
        let mut d = Dispatcher::new();
        let handler = FnHandler::new(|_args| Some(json!("replaced")));
        let out = handler.invoke(&mut d, &[json!("original")]).unwrap();
        assert_eq!(out, Some(json!("replaced")));
    }

    #[test]
    fn fn_handler_none_means_untouched() {
        let mut d = Dispatcher::new();
        let handler = FnHandler::new(|_args| None);
        assert_eq!(handler.invoke(&mut d, &[]).unwrap(), None);
    }

    #[test]
    fn recording_handler_counts_and_logs() {
        let mut d = Dispatcher::new();
        let log = shared_log();
        let handler = RecordingHandler::new("h1", log.clone());

        handler.invoke(&mut d, &[]).unwrap();
        handler.invoke(&mut d, &[]).unwrap();

        assert_eq!(handler.calls(), 2);
        assert_eq!(*log.lock().unwrap(), vec!["h1", "h1"]);
    }

    #[test]
    fn recording_handler_with_output() {
        let mut d = Dispatcher::new();
        let handler = RecordingHandler::new("h1", shared_log()).with_output(json!(42));
        assert_eq!(handler.invoke(&mut d, &[]).unwrap(), Some(json!(42)));
    }
}

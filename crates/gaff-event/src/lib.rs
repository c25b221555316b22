//! Synchronous named-event dispatch for Gaff.
//!
//! This crate is the dispatch layer of the Gaff workspace: a
//! single-threaded, re-entrant event dispatcher with a priority-ordered
//! handler registry.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     Adapter Layer                       │
//! ├─────────────────────────────────────────────────────────┤
//! │  gaff-hook : HandlerAdapter, registration facade,       │
//! │              declarative config                         │
//! └─────────────────────────────────────────────────────────┘
//!           ↕ registers handlers, scans slots
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Dispatch Layer              ◄── HERE │
//! ├─────────────────────────────────────────────────────────┤
//! │  gaff-event : Dispatcher, Handler trait, EventError     │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Core Concepts
//!
//! ## Events and Priorities
//!
//! An event is a name. Firing it invokes every handler registered
//! under that name, in ascending priority order ([`DEFAULT_PRIORITY`]
//! is 10, lower fires earlier), with registration order breaking ties.
//!
//! ## Action vs Filter Dispatch
//!
//! - [`Dispatcher::dispatch_action`] fires handlers for their side
//!   effects and discards outputs.
//! - [`Dispatcher::dispatch_filter`] threads a value through the
//!   chain: each handler's `Some` return becomes the next handler's
//!   input, and the final value is returned to the caller.
//!
//! ## Handlers
//!
//! [`Handler`] is the registered-callable contract; [`FnHandler`]
//! adapts plain closures. Handlers receive the dispatcher itself, so
//! they can fire further events or mutate the registry mid-pass — the
//! dispatcher iterates a snapshot and tolerates both.
//!
//! # Example
//!
//! ```
//! use gaff_event::{Dispatcher, FnHandler, DEFAULT_PRIORITY};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let mut dispatcher = Dispatcher::new();
//!
//! // Runs last: priority 20.
//! dispatcher.register(
//!     "page.title",
//!     Arc::new(FnHandler::new(|args| {
//!         args[0].as_str().map(|s| json!(format!("{s} — Gaff")))
//!     })),
//!     20,
//!     1,
//! );
//!
//! // Runs first: priority 10.
//! dispatcher.register(
//!     "page.title",
//!     Arc::new(FnHandler::new(|args| {
//!         args[0].as_str().map(|s| json!(s.trim()))
//!     })),
//!     DEFAULT_PRIORITY,
//!     1,
//! );
//!
//! let title = dispatcher
//!     .dispatch_filter("page.title", json!("  Home  "), &[])
//!     .unwrap();
//! assert_eq!(title, json!("Home — Gaff"));
//! ```
//!
//! # Concurrency
//!
//! Dispatch is strictly synchronous on the calling thread: no queuing,
//! no background execution. Handlers are `Send + Sync` so callers may
//! wrap the dispatcher in a lock of their choosing, but this crate
//! performs no synchronization of its own.

mod dispatcher;
mod error;
mod handler;

pub use dispatcher::{Dispatcher, Entry, DEFAULT_PRIORITY};
pub use error::{assert_error_code, assert_error_codes, ErrorCode, EventError};
pub use handler::{FnHandler, Handler};

// Re-export testing utilities
#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    //! Test utilities for the dispatch layer.
    //!
    //! Provides [`RecordingHandler`] and [`FailingHandler`] for use in
    //! tests.
    pub use crate::handler::testing::{FailingHandler, RecordingHandler};
}

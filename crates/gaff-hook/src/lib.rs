//! Stateful handler adapters for the Gaff dispatch layer.
//!
//! Registering behavior against an event usually means writing a
//! dedicated function per registration. This crate removes that
//! boilerplate for the common shapes: an adapter closes over
//! caller-supplied data (and optionally a wrapped callback) at
//! registration time, and the matching removal function later finds
//! that exact registration again by deep equality of the captured
//! state — no reference to the adapter ever reaches the caller.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     Adapter Layer              ◄── HERE │
//! ├─────────────────────────────────────────────────────────┤
//! │  gaff-hook : HandlerAdapter + Behavior, registration    │
//! │              facade, declarative config                 │
//! └─────────────────────────────────────────────────────────┘
//!           ↕ registers handlers, scans slots
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Dispatch Layer                       │
//! ├─────────────────────────────────────────────────────────┤
//! │  gaff-event : Dispatcher, Handler trait, EventError     │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Behaviors
//!
//! | Facade | Behavior when the event fires |
//! |--------|-------------------------------|
//! | [`add_action_with_args`] | fire the callback with the captured args, ignore the dispatcher's |
//! | [`add_filter_return`] | override the filtered value with the captured one |
//! | [`add_filter_replace`] | substitute at a key, index, or substring |
//! | [`add_filter_prepend`] | insert captured value(s) at the front |
//! | [`add_filter_append`] | add captured value(s) at the end |
//! | [`add_filter_once`] / [`add_action_once`] | fire the callback once, then deregister |
//!
//! Each `add_*` has a matching `remove_*` that removes exactly one
//! equivalent registration and returns whether it found one.
//!
//! # Example
//!
//! ```
//! use gaff_event::{Dispatcher, DEFAULT_PRIORITY};
//! use gaff_hook::{add_filter_append, add_filter_prepend, remove_filter_prepend};
//! use serde_json::json;
//!
//! let mut dispatcher = Dispatcher::new();
//! add_filter_prepend(&mut dispatcher, "motd", json!("** "), DEFAULT_PRIORITY);
//! add_filter_append(&mut dispatcher, "motd", json!(" **"), DEFAULT_PRIORITY);
//!
//! let motd = dispatcher
//!     .dispatch_filter("motd", json!("maintenance tonight"), &[])
//!     .unwrap();
//! assert_eq!(motd, json!("** maintenance tonight **"));
//!
//! // Precisely the prepend registration, located by captured state.
//! assert!(remove_filter_prepend(&mut dispatcher, "motd", json!("** "), DEFAULT_PRIORITY));
//! ```
//!
//! # Errors
//!
//! Nothing validates at registration time. Malformed captures and
//! missing callbacks surface as [`HookError`]s when the handler fires,
//! wrapped into [`gaff_event::EventError`] by the dispatch boundary.

mod adapter;
mod behavior;
mod config;
mod error;
mod facade;

pub use adapter::{callback, Callback, HandlerAdapter};
pub use behavior::Behavior;
pub use config::{HandlerDef, HandlerDefError, HandlersConfig};
pub use error::HookError;
pub use facade::{
    add_action_once, add_action_with_args, add_filter_append, add_filter_once,
    add_filter_prepend, add_filter_replace, add_filter_return, add_methods, remove_action_once,
    remove_action_with_args, remove_filter_append, remove_filter_once, remove_filter_prepend,
    remove_filter_replace, remove_filter_return,
};

// Re-export from gaff_event for convenience
pub use gaff_event::{Dispatcher, Handler, DEFAULT_PRIORITY};

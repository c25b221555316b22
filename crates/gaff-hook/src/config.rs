//! Declarative handler configuration.
//!
//! Data-only behaviors (`return`, `replace`, `prepend`, `append`)
//! carry no code, so they can be declared in configuration and
//! registered at startup. `action` and `once` wrap callbacks and must
//! be registered through the facade.
//!
//! # Example TOML
//!
//! ```toml
//! [[handlers]]
//! id = "brand-title"
//! event = "page.title"
//! behavior = "append"
//! value = " — Gaff"
//! priority = 50
//!
//! [[handlers]]
//! event = "db.host"
//! behavior = "return"
//! value = "localhost"
//! ```

use crate::{Behavior, HandlerAdapter};
use gaff_event::{Dispatcher, DEFAULT_PRIORITY};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Top-level handlers configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HandlersConfig {
    /// Declarative handler definitions.
    pub handlers: Vec<HandlerDef>,
}

/// A single declarative handler definition.
///
/// Which capture fields are required depends on `behavior`:
/// `return`/`prepend`/`append` need `value`; `replace` needs `search`
/// and `replace`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandlerDef {
    /// Unique definition ID. Anonymous if not specified.
    pub id: Option<String>,

    /// Event name the handler is registered under.
    pub event: String,

    /// Behavior name (e.g. "return", "replace", "prepend", "append").
    pub behavior: String,

    /// Priority (lower = earlier). Default: 10.
    #[serde(default = "default_priority")]
    pub priority: i32,

    /// Whether the definition is applied. Default: true.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Captured value for `return`, `prepend`, and `append`.
    pub value: Option<Value>,

    /// Key, index, or substring to search for (`replace` only).
    pub search: Option<Value>,

    /// Replacement value (`replace` only).
    pub replace: Option<Value>,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

fn default_enabled() -> bool {
    true
}

/// Errors from validating a [`HandlerDef`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerDefError {
    /// Behavior name is not recognized.
    #[error("handler '{label}': unknown behavior '{behavior}'")]
    UnknownBehavior {
        /// Definition ID or `<anonymous>`.
        label: String,
        /// The offending behavior name.
        behavior: String,
    },

    /// Behavior wraps a code callback and cannot be declared in
    /// configuration.
    #[error("handler '{label}': behavior '{behavior}' wraps a callback and cannot be declared")]
    NotDeclarable {
        /// Definition ID or `<anonymous>`.
        label: String,
        /// The code-carrying behavior.
        behavior: &'static str,
    },

    /// A capture field the behavior needs is absent.
    #[error("handler '{label}': behavior '{behavior}' requires field '{field}'")]
    MissingField {
        /// Definition ID or `<anonymous>`.
        label: String,
        /// Behavior being built.
        behavior: &'static str,
        /// The absent field.
        field: &'static str,
    },

    /// Event name is empty.
    #[error("handler '{label}': event name is empty")]
    EmptyEvent {
        /// Definition ID or `<anonymous>`.
        label: String,
    },
}

impl HandlerDef {
    /// Validates this definition.
    pub fn validate(&self) -> Result<(), HandlerDefError> {
        self.build().map(|_| ())
    }

    /// Builds the adapter and its accepted-arg count.
    fn build(&self) -> Result<(HandlerAdapter, usize), HandlerDefError> {
        let label = self.id.as_deref().unwrap_or("<anonymous>").to_string();

        if self.event.is_empty() {
            return Err(HandlerDefError::EmptyEvent { label });
        }

        let behavior: Behavior =
            self.behavior
                .parse()
                .map_err(|_| HandlerDefError::UnknownBehavior {
                    label: label.clone(),
                    behavior: self.behavior.clone(),
                })?;

        match behavior {
            Behavior::ReturnValue => {
                let value = self.require_value(&label, "return")?;
                Ok((HandlerAdapter::return_value(value), 0))
            }
            Behavior::Replace => {
                let search = self
                    .search
                    .clone()
                    .ok_or_else(|| HandlerDefError::MissingField {
                        label: label.clone(),
                        behavior: "replace",
                        field: "search",
                    })?;
                let replace = self
                    .replace
                    .clone()
                    .ok_or_else(|| HandlerDefError::MissingField {
                        label: label.clone(),
                        behavior: "replace",
                        field: "replace",
                    })?;
                Ok((HandlerAdapter::replace(search, replace), 1))
            }
            Behavior::Prepend => {
                let value = self.require_value(&label, "prepend")?;
                Ok((HandlerAdapter::prepend(value), 1))
            }
            Behavior::Append => {
                let value = self.require_value(&label, "append")?;
                Ok((HandlerAdapter::append(value), 1))
            }
            Behavior::Action | Behavior::Once => Err(HandlerDefError::NotDeclarable {
                label,
                behavior: behavior.as_str(),
            }),
        }
    }

    fn require_value(
        &self,
        label: &str,
        behavior: &'static str,
    ) -> Result<Value, HandlerDefError> {
        self.value.clone().ok_or_else(|| HandlerDefError::MissingField {
            label: label.to_string(),
            behavior,
            field: "value",
        })
    }
}

impl HandlersConfig {
    /// Merges another config into this one.
    ///
    /// Definitions accumulate across config layers. A definition whose
    /// `id` matches an existing one replaces it (override semantics);
    /// new and anonymous definitions are appended.
    pub fn merge(&mut self, other: &Self) {
        for def in &other.handlers {
            if let Some(id) = &def.id {
                self.handlers.retain(|h| h.id.as_deref() != Some(id));
            }
            self.handlers.push(def.clone());
        }
    }

    /// Validates every definition, returning all errors rather than
    /// just the first.
    pub fn validate_all(&self) -> Vec<HandlerDefError> {
        self.handlers
            .iter()
            .filter_map(|def| def.validate().err())
            .collect()
    }

    /// Builds and registers an adapter per enabled definition.
    ///
    /// Returns the number of handlers registered, or the first build
    /// error. Nothing is registered past a broken definition; run
    /// [`validate_all`](Self::validate_all) first for a full report.
    pub fn apply(&self, dispatcher: &mut Dispatcher) -> Result<usize, HandlerDefError> {
        let mut applied = 0;
        for def in &self.handlers {
            if !def.enabled {
                continue;
            }
            let (adapter, accepted_args) = def.build()?;
            debug!(
                event = %def.event,
                behavior = %def.behavior,
                priority = def.priority,
                "apply declarative handler"
            );
            dispatcher.register(def.event.clone(), Arc::new(adapter), def.priority, accepted_args);
            applied += 1;
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_def(id: &str, event: &str, behavior: &str, value: Option<Value>) -> HandlerDef {
        HandlerDef {
            id: Some(id.to_string()),
            event: event.to_string(),
            behavior: behavior.to_string(),
            priority: default_priority(),
            enabled: default_enabled(),
            value,
            search: None,
            replace: None,
        }
    }

    // ── Defaults ────────────────────────────────────────────

    #[test]
    fn default_priority_is_10() {
        assert_eq!(default_priority(), 10);
    }

    #[test]
    fn default_enabled_is_true() {
        assert!(default_enabled());
    }

    #[test]
    fn config_default_is_empty() {
        assert!(HandlersConfig::default().handlers.is_empty());
    }

    // ── Validation ──────────────────────────────────────────

    #[test]
    fn validate_valid_return() {
        let def = make_def("fix", "db.host", "return", Some(json!("localhost")));
        assert!(def.validate().is_ok());
    }

    #[test]
    fn validate_valid_replace() {
        let mut def = make_def("swap", "config", "replace", None);
        def.search = Some(json!("host"));
        def.replace = Some(json!("127.0.0.1"));
        assert!(def.validate().is_ok());
    }

    #[test]
    fn validate_unknown_behavior() {
        let def = make_def("bad", "e", "mangle", Some(json!(1)));
        let err = def.validate().unwrap_err();
        assert!(matches!(err, HandlerDefError::UnknownBehavior { .. }));
        assert!(err.to_string().contains("mangle"));
    }

    #[test]
    fn validate_code_behaviors_not_declarable() {
        for behavior in ["action", "once"] {
            let def = make_def("code", "e", behavior, Some(json!(1)));
            let err = def.validate().unwrap_err();
            assert!(matches!(err, HandlerDefError::NotDeclarable { .. }), "{behavior}");
        }
    }

    #[test]
    fn validate_missing_value() {
        let def = make_def("no-value", "e", "prepend", None);
        let err = def.validate().unwrap_err();
        assert!(matches!(
            err,
            HandlerDefError::MissingField { field: "value", .. }
        ));
    }

    #[test]
    fn validate_missing_replace_fields() {
        let mut def = make_def("half", "e", "replace", None);
        def.search = Some(json!("k"));
        let err = def.validate().unwrap_err();
        assert!(matches!(
            err,
            HandlerDefError::MissingField { field: "replace", .. }
        ));
    }

    #[test]
    fn validate_empty_event() {
        let def = make_def("no-event", "", "return", Some(json!(1)));
        assert!(matches!(
            def.validate().unwrap_err(),
            HandlerDefError::EmptyEvent { .. }
        ));
    }

    #[test]
    fn validate_anonymous_error_display() {
        let mut def = make_def("", "e", "append", None);
        def.id = None;
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("<anonymous>"));
    }

    // ── Merge ───────────────────────────────────────────────

    #[test]
    fn merge_appends_new_defs() {
        let mut base = HandlersConfig {
            handlers: vec![make_def("h1", "a", "return", Some(json!(1)))],
        };
        let overlay = HandlersConfig {
            handlers: vec![make_def("h2", "b", "return", Some(json!(2)))],
        };

        base.merge(&overlay);
        assert_eq!(base.handlers.len(), 2);
        assert_eq!(base.handlers[1].id.as_deref(), Some("h2"));
    }

    #[test]
    fn merge_overrides_same_id() {
        let mut base = HandlersConfig {
            handlers: vec![make_def("h1", "a", "return", Some(json!("old")))],
        };
        let overlay = HandlersConfig {
            handlers: vec![make_def("h1", "a", "return", Some(json!("new")))],
        };

        base.merge(&overlay);
        assert_eq!(base.handlers.len(), 1);
        assert_eq!(base.handlers[0].value, Some(json!("new")));
    }

    #[test]
    fn merge_anonymous_defs_always_append() {
        let anon = |value: Value| {
            let mut def = make_def("", "e", "append", Some(value));
            def.id = None;
            def
        };
        let mut base = HandlersConfig {
            handlers: vec![anon(json!(1))],
        };
        base.merge(&HandlersConfig {
            handlers: vec![anon(json!(2))],
        });
        assert_eq!(base.handlers.len(), 2);
    }

    // ── validate_all ────────────────────────────────────────

    #[test]
    fn validate_all_collects_every_error() {
        let cfg = HandlersConfig {
            handlers: vec![
                make_def("ok", "e", "return", Some(json!(1))),
                make_def("bad1", "e", "mangle", None),
                make_def("bad2", "e", "prepend", None),
            ],
        };
        assert_eq!(cfg.validate_all().len(), 2);
    }

    // ── Serde ───────────────────────────────────────────────

    #[test]
    fn serde_json_roundtrip() {
        let cfg = HandlersConfig {
            handlers: vec![
                make_def("h1", "page.title", "append", Some(json!(" — Gaff"))),
                {
                    let mut def = make_def("h2", "config", "replace", None);
                    def.search = Some(json!("host"));
                    def.replace = Some(json!("localhost"));
                    def.priority = 50;
                    def
                },
            ],
        };

        let json = serde_json::to_string_pretty(&cfg).unwrap();
        let restored: HandlersConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, restored);
    }

    #[test]
    fn serde_json_defaults_applied() {
        let json = r#"{
            "handlers": [{
                "id": null,
                "event": "db.host",
                "behavior": "return",
                "value": "localhost",
                "search": null,
                "replace": null
            }]
        }"#;

        let cfg: HandlersConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.handlers[0].priority, 10);
        assert!(cfg.handlers[0].enabled);
    }

    // ── TOML ────────────────────────────────────────────────

    #[test]
    fn toml_roundtrip() {
        let toml_str = r#"
[[handlers]]
id = "brand-title"
event = "page.title"
behavior = "append"
value = " — Gaff"
priority = 50

[[handlers]]
event = "nav.items"
behavior = "prepend"
value = ["home"]
"#;

        let cfg: HandlersConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.handlers.len(), 2);
        assert_eq!(cfg.handlers[0].id.as_deref(), Some("brand-title"));
        assert_eq!(cfg.handlers[0].priority, 50);
        assert_eq!(cfg.handlers[1].priority, 10);
        assert_eq!(cfg.handlers[1].value, Some(json!(["home"])));
        assert!(cfg.validate_all().is_empty());
    }

    #[test]
    fn toml_empty_config() {
        let cfg: HandlersConfig = toml::from_str("").unwrap();
        assert!(cfg.handlers.is_empty());
    }

    // ── apply ───────────────────────────────────────────────

    #[test]
    fn apply_registers_working_adapters() {
        let toml_str = r#"
[[handlers]]
event = "page.title"
behavior = "append"
value = " — Gaff"

[[handlers]]
event = "page.title"
behavior = "replace"
search = "Untitled"
replace = "Home"
priority = 5
"#;
        let cfg: HandlersConfig = toml::from_str(toml_str).unwrap();
        let mut d = Dispatcher::new();
        assert_eq!(cfg.apply(&mut d).unwrap(), 2);

        // Replace runs first (priority 5), append second (priority 10).
        let out = d
            .dispatch_filter("page.title", json!("Untitled"), &[])
            .unwrap();
        assert_eq!(out, json!("Home — Gaff"));
    }

    #[test]
    fn apply_skips_disabled_defs() {
        let mut def = make_def("off", "e", "return", Some(json!(1)));
        def.enabled = false;
        let cfg = HandlersConfig {
            handlers: vec![def],
        };

        let mut d = Dispatcher::new();
        assert_eq!(cfg.apply(&mut d).unwrap(), 0);
        assert!(d.is_empty());
    }

    #[test]
    fn apply_stops_on_broken_def() {
        let cfg = HandlersConfig {
            handlers: vec![make_def("bad", "e", "mangle", None)],
        };
        let mut d = Dispatcher::new();
        assert!(cfg.apply(&mut d).is_err());
        assert!(d.is_empty());
    }
}

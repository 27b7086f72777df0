//! Trigger entries.
//!
//! A `TriggerEntry` is one triggered ability waiting to resolve for an
//! event. Entries are plain data: the ability's behaviour is looked up by its
//! `action` tag when it activates. That keeps a paused resolution (entries
//! plus a cursor) serializable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, PlayerId};

/// Unique identifier for a trigger entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerId(pub u32);

impl TriggerId {
    /// Create a new trigger ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Trigger({})", self.0)
    }
}

/// One triggered ability collected for an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEntry {
    /// Unique identifier.
    pub id: TriggerId,

    /// Human-readable description, shown in logs.
    pub summary: String,

    /// The card the ability belongs to. `None` for rule-level triggers.
    pub source: Option<EntityId>,

    /// The seat that makes choices for this ability.
    pub controller: Option<PlayerId>,

    /// Action tag the effect engine dispatches on.
    pub action: String,

    /// Numeric parameters for the action.
    pub params: BTreeMap<String, i64>,

    /// Pre-chosen targets, if the ability has any.
    pub targets: Vec<EntityId>,
}

impl TriggerEntry {
    /// Create a new entry.
    pub fn new(id: TriggerId, summary: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id,
            summary: summary.into(),
            source: None,
            controller: None,
            action: action.into(),
            params: BTreeMap::new(),
            targets: Vec::new(),
        }
    }

    /// Set the source card (builder pattern).
    #[must_use]
    pub fn with_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the controller (builder pattern).
    #[must_use]
    pub fn with_controller(mut self, controller: PlayerId) -> Self {
        self.controller = Some(controller);
        self
    }

    /// Add a numeric parameter (builder pattern).
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: i64) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Add a target (builder pattern).
    #[must_use]
    pub fn with_target(mut self, target: EntityId) -> Self {
        self.targets.push(target);
        self
    }

    /// Get a parameter, or a default.
    #[must_use]
    pub fn param(&self, key: &str, default: i64) -> i64 {
        self.params.get(key).copied().unwrap_or(default)
    }
}

/// Hook run once after every entry of a collection has resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionHook {
    /// Tag the effect engine dispatches on.
    pub tag: String,
    /// Card the hook belongs to, if any.
    pub source: Option<EntityId>,
}

impl CompletionHook {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            source: None,
        }
    }
}

/// What an effect engine collected for one event.
///
/// A bare `Vec<TriggerEntry>` converts into a collection with no ordering
/// rule and no completion hook.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerCollection {
    pub entries: Vec<TriggerEntry>,
    /// Name of the rule that ordered the entries, for logs.
    pub order_rule: Option<String>,
    pub on_complete: Option<CompletionHook>,
}

impl TriggerCollection {
    /// Set the ordering rule name (builder pattern).
    #[must_use]
    pub fn with_order_rule(mut self, rule: impl Into<String>) -> Self {
        self.order_rule = Some(rule.into());
        self
    }

    /// Set the completion hook (builder pattern).
    #[must_use]
    pub fn with_on_complete(mut self, hook: CompletionHook) -> Self {
        self.on_complete = Some(hook);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.on_complete.is_none()
    }
}

impl From<Vec<TriggerEntry>> for TriggerCollection {
    fn from(entries: Vec<TriggerEntry>) -> Self {
        Self {
            entries,
            order_rule: None,
            on_complete: None,
        }
    }
}

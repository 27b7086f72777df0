//! Tag-dispatched effects.
//!
//! `ActionRegistry` maps action tags to handlers. `RegistryEffectEngine` is
//! an `EffectEngine` built on it: cards register watchers (a trigger entry
//! plus the event it listens for), and activation looks the entry's action
//! tag up in the registry.
//!
//! ## Ordering
//!
//! Watchers for one event are collected by priority (higher first), then by
//! registration order.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::core::{EntityId, PlayerId, ZoneKind};
use crate::engine::Engine;
use crate::error::EngineError;
use crate::triggers::{CompletionHook, GameEvent, TriggerCollection, TriggerEntry};

use super::engine::{
    destroy_to_graveyard, ActivationOutcome, DestroyOutcome, DestroyRequest, EffectEngine, TriggerContext,
};

/// Behaviour behind an action tag.
pub trait ActionHandler {
    fn activate(
        &self,
        engine: &mut Engine,
        entry: &TriggerEntry,
        ctx: &TriggerContext<'_>,
    ) -> Result<ActivationOutcome, EngineError>;
}

impl<F> ActionHandler for F
where
    F: Fn(&mut Engine, &TriggerEntry, &TriggerContext<'_>) -> Result<ActivationOutcome, EngineError>,
{
    fn activate(
        &self,
        engine: &mut Engine,
        entry: &TriggerEntry,
        ctx: &TriggerContext<'_>,
    ) -> Result<ActivationOutcome, EngineError> {
        self(engine, entry, ctx)
    }
}

type CompletionFn = Rc<dyn Fn(&mut Engine, &CompletionHook, &GameEvent) -> Result<(), EngineError>>;
type DestroyFn = Rc<dyn Fn(&mut Engine, EntityId, &DestroyRequest) -> Result<DestroyOutcome, EngineError>>;
type TrapWindowFn = Rc<dyn Fn(&mut Engine, PlayerId, &GameEvent) -> Result<(), EngineError>>;

/// Action handlers keyed by tag.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    handlers: FxHashMap<String, Rc<dyn ActionHandler>>,
}

impl ActionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure for `tag`, replacing any previous handler.
    pub fn register(
        &mut self,
        tag: impl Into<String>,
        handler: impl Fn(&mut Engine, &TriggerEntry, &TriggerContext<'_>) -> Result<ActivationOutcome, EngineError>
            + 'static,
    ) {
        self.handlers.insert(tag.into(), Rc::new(handler));
    }

    /// Register a handler object for `tag`.
    pub fn register_handler(&mut self, tag: impl Into<String>, handler: Rc<dyn ActionHandler>) {
        self.handlers.insert(tag.into(), handler);
    }

    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    /// Run the handler for the entry's action tag.
    ///
    /// An unregistered tag is logged and skipped.
    pub fn dispatch(
        &self,
        engine: &mut Engine,
        entry: &TriggerEntry,
        ctx: &TriggerContext<'_>,
    ) -> Result<ActivationOutcome, EngineError> {
        let Some(handler) = self.handlers.get(&entry.action).cloned() else {
            warn!(action = %entry.action, trigger = %entry.id, "no handler registered");
            return Ok(ActivationOutcome::Skipped(format!("unregistered action '{}'", entry.action)));
        };
        handler.activate(engine, entry, ctx)
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<_> = self.handlers.keys().collect();
        tags.sort();
        f.debug_struct("ActionRegistry").field("tags", &tags).finish()
    }
}

/// When a watcher fires, beyond matching the event name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WatchCondition {
    /// Always.
    #[default]
    Always,
    /// The event's source is the watcher's card.
    SourceIsSelf,
    /// The event's target is the watcher's card.
    TargetIsSelf,
    /// The watcher's card is on its controller's field or spell/trap zone.
    SelfOnBoard,
    /// The event's player is the watcher's controller.
    ControllerActs,
    /// The event's player is the watcher's controller's opponent.
    OpponentActs,
}

/// A registered trigger.
#[derive(Clone, Debug)]
pub struct Watcher {
    pub event: String,
    pub entry: TriggerEntry,
    pub condition: WatchCondition,
    pub priority: i32,
    /// How many more times it may fire. `None` = unlimited.
    pub uses_remaining: Option<u32>,
}

impl Watcher {
    pub fn new(event: impl Into<String>, entry: TriggerEntry) -> Self {
        Self {
            event: event.into(),
            entry,
            condition: WatchCondition::Always,
            priority: 0,
            uses_remaining: None,
        }
    }

    /// Set the condition (builder pattern).
    #[must_use]
    pub fn when(mut self, condition: WatchCondition) -> Self {
        self.condition = condition;
        self
    }

    /// Set priority (builder pattern). Higher fires first.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set limited uses (builder pattern).
    #[must_use]
    pub fn with_uses(mut self, uses: u32) -> Self {
        self.uses_remaining = Some(uses);
        self
    }

    fn matches(&self, engine: &Engine, event: &GameEvent) -> bool {
        if self.event != event.name || self.uses_remaining == Some(0) {
            return false;
        }
        let card = self.entry.source;
        let controller = self.entry.controller;
        match self.condition {
            WatchCondition::Always => true,
            WatchCondition::SourceIsSelf => card.is_some() && event.source == card,
            WatchCondition::TargetIsSelf => card.is_some() && event.target == card,
            WatchCondition::SelfOnBoard => card
                .and_then(|id| engine.duel.locate(id))
                .is_some_and(|(_, zone, _)| matches!(zone, ZoneKind::Field | ZoneKind::SpellTrap)),
            WatchCondition::ControllerActs => controller.is_some() && event.player == controller,
            WatchCondition::OpponentActs => {
                controller.is_some() && event.player.map(PlayerId::opponent) == controller
            }
        }
    }
}

/// An `EffectEngine` driven by registered watchers and tagged handlers.
#[derive(Default)]
pub struct RegistryEffectEngine {
    actions: ActionRegistry,
    watchers: RefCell<Vec<Watcher>>,
    completions: FxHashMap<String, (CompletionHook, CompletionFn)>,
    destroy: Option<DestroyFn>,
    trap_window: Option<TrapWindowFn>,
}

impl RegistryEffectEngine {
    /// Create an effect engine over a set of action handlers.
    pub fn new(actions: ActionRegistry) -> Self {
        Self {
            actions,
            ..Self::default()
        }
    }

    /// Register a watcher. Can be called while the duel runs.
    pub fn watch(&self, watcher: Watcher) {
        debug!(event = %watcher.event, trigger = %watcher.entry.id, "watcher registered");
        self.watchers.borrow_mut().push(watcher);
    }

    /// Drop every watcher belonging to a card. Returns how many were removed.
    pub fn unwatch_card(&self, card: EntityId) -> usize {
        let mut watchers = self.watchers.borrow_mut();
        let before = watchers.len();
        watchers.retain(|w| w.entry.source != Some(card));
        before - watchers.len()
    }

    /// Attach a completion hook to every collection for `event` (builder pattern).
    #[must_use]
    pub fn with_completion(
        mut self,
        event: impl Into<String>,
        hook: CompletionHook,
        handler: impl Fn(&mut Engine, &CompletionHook, &GameEvent) -> Result<(), EngineError> + 'static,
    ) -> Self {
        self.completions.insert(event.into(), (hook, Rc::new(handler)));
        self
    }

    /// Override destruction (builder pattern).
    #[must_use]
    pub fn with_destroy(
        mut self,
        handler: impl Fn(&mut Engine, EntityId, &DestroyRequest) -> Result<DestroyOutcome, EngineError> + 'static,
    ) -> Self {
        self.destroy = Some(Rc::new(handler));
        self
    }

    /// Install a trap-window responder (builder pattern).
    #[must_use]
    pub fn with_trap_window(
        mut self,
        handler: impl Fn(&mut Engine, PlayerId, &GameEvent) -> Result<(), EngineError> + 'static,
    ) -> Self {
        self.trap_window = Some(Rc::new(handler));
        self
    }

    #[must_use]
    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    #[must_use]
    pub fn watcher_count(&self) -> usize {
        self.watchers.borrow().len()
    }
}

impl EffectEngine for RegistryEffectEngine {
    fn collect_event_triggers(&self, engine: &Engine, event: &GameEvent) -> TriggerCollection {
        let mut watchers = self.watchers.borrow_mut();
        let mut matched: Vec<(i32, usize)> = watchers
            .iter()
            .enumerate()
            .filter(|(_, w)| w.matches(engine, event))
            .map(|(index, w)| (w.priority, index))
            .collect();
        matched.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let mut entries = Vec::with_capacity(matched.len());
        for (_, index) in &matched {
            let watcher = &mut watchers[*index];
            if let Some(uses) = watcher.uses_remaining.as_mut() {
                *uses = uses.saturating_sub(1);
            }
            entries.push(watcher.entry.clone());
        }

        let mut collection = TriggerCollection::from(entries);
        if collection.entries.len() > 1 {
            collection.order_rule = Some("priority".to_string());
        }
        if !collection.entries.is_empty() {
            if let Some((hook, _)) = self.completions.get(&event.name) {
                collection.on_complete = Some(hook.clone());
            }
        }
        collection
    }

    fn activate(
        &self,
        engine: &mut Engine,
        entry: &TriggerEntry,
        ctx: &TriggerContext<'_>,
    ) -> Result<ActivationOutcome, EngineError> {
        self.actions.dispatch(engine, entry, ctx)
    }

    fn on_complete(&self, engine: &mut Engine, hook: &CompletionHook, event: &GameEvent) -> Result<(), EngineError> {
        match self.completions.get(&event.name) {
            Some((_, handler)) => {
                let handler = Rc::clone(handler);
                handler(engine, hook, event)
            }
            None => {
                warn!(hook = %hook.tag, event = %event.name, "no completion handler");
                Ok(())
            }
        }
    }

    fn destroy_card(
        &self,
        engine: &mut Engine,
        card: EntityId,
        request: &DestroyRequest,
    ) -> Result<DestroyOutcome, EngineError> {
        match &self.destroy {
            Some(handler) => {
                let handler = Rc::clone(handler);
                handler(engine, card, request)
            }
            None => destroy_to_graveyard(engine, card, request),
        }
    }

    fn offer_trap_window(&self, engine: &mut Engine, defender: PlayerId, event: &GameEvent) -> Result<(), EngineError> {
        match &self.trap_window {
            Some(handler) => {
                let handler = Rc::clone(handler);
                handler(engine, defender, event)
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DuelConfig;
    use crate::triggers::TriggerId;

    fn entry(id: u32, action: &str) -> TriggerEntry {
        TriggerEntry::new(TriggerId::new(id), format!("entry {id}"), action)
    }

    #[test]
    fn test_priority_then_registration_order() {
        let effects = RegistryEffectEngine::default();
        effects.watch(Watcher::new("ping", entry(1, "a")));
        effects.watch(Watcher::new("ping", entry(2, "b")).with_priority(5));
        effects.watch(Watcher::new("ping", entry(3, "c")));
        effects.watch(Watcher::new("pong", entry(4, "d")));
        let engine = Engine::headless(DuelConfig::default());

        let collection = effects.collect_event_triggers(&engine, &GameEvent::new("ping"));

        let ids: Vec<u32> = collection.entries.iter().map(|e| e.id.raw()).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(collection.order_rule.as_deref(), Some("priority"));
    }

    #[test]
    fn test_uses_are_consumed() {
        let effects = RegistryEffectEngine::default();
        effects.watch(Watcher::new("ping", entry(1, "a")).with_uses(1));
        let engine = Engine::headless(DuelConfig::default());

        assert_eq!(effects.collect_event_triggers(&engine, &GameEvent::new("ping")).entries.len(), 1);
        assert!(effects.collect_event_triggers(&engine, &GameEvent::new("ping")).entries.is_empty());
    }

    #[test]
    fn test_conditions() {
        let effects = RegistryEffectEngine::default();
        let mine = entry(1, "a").with_source(EntityId(10)).with_controller(PlayerId::new(0));
        effects.watch(Watcher::new("ping", mine.clone()).when(WatchCondition::SourceIsSelf));
        effects.watch(Watcher::new("ping", mine).when(WatchCondition::OpponentActs));
        let engine = Engine::headless(DuelConfig::default());

        let own = GameEvent::new("ping").with_source(EntityId(10)).with_player(PlayerId::new(0));
        let theirs = GameEvent::new("ping").with_source(EntityId(11)).with_player(PlayerId::new(1));

        assert_eq!(effects.collect_event_triggers(&engine, &own).entries.len(), 1);
        assert_eq!(effects.collect_event_triggers(&engine, &theirs).entries.len(), 1);
    }

    #[test]
    fn test_unregistered_tag_is_skipped() {
        let registry = ActionRegistry::new();
        let mut engine = Engine::headless(DuelConfig::default());
        let event = GameEvent::new("ping");
        let ctx = TriggerContext {
            event: &event,
            index: 0,
            selections: None,
            action_context: None,
        };

        let outcome = registry.dispatch(&mut engine, &entry(1, "missing"), &ctx).unwrap();

        assert!(matches!(outcome, ActivationOutcome::Skipped(reason) if reason.contains("missing")));
    }

    #[test]
    fn test_unwatch_card() {
        let effects = RegistryEffectEngine::default();
        effects.watch(Watcher::new("ping", entry(1, "a").with_source(EntityId(10))));
        effects.watch(Watcher::new("ping", entry(2, "a").with_source(EntityId(11))));

        assert_eq!(effects.unwatch_card(EntityId(10)), 1);
        assert_eq!(effects.watcher_count(), 1);
    }
}

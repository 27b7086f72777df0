//! Event bus.
//!
//! Listeners are plain callbacks registered per event name. They see the
//! duel state and the event, run in registration order, and cannot emit
//! further events. A listener error is logged and does not stop the others
//! or the trigger resolution that follows.

use rustc_hash::FxHashMap;
use tracing::{trace, warn};

use crate::core::DuelState;
use crate::engine::Engine;
use crate::error::EngineError;

use super::event::GameEvent;
use super::resolver::EventResolution;

/// A bus listener.
pub type Listener = Box<dyn FnMut(&mut DuelState, &GameEvent) -> Result<(), EngineError>>;

/// Listeners keyed by event name.
#[derive(Default)]
pub struct EventBus {
    listeners: FxHashMap<String, Vec<Listener>>,
}

impl EventBus {
    /// Register a listener for `name`.
    pub fn on(&mut self, name: impl Into<String>, listener: Listener) {
        self.listeners.entry(name.into()).or_default().push(listener);
    }

    /// Number of listeners for `name`.
    #[must_use]
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.get(name).map_or(0, Vec::len)
    }

    /// Run every listener for the event. Returns how many failed.
    pub fn dispatch(&mut self, state: &mut DuelState, event: &GameEvent) -> usize {
        let Some(listeners) = self.listeners.get_mut(&event.name) else {
            return 0;
        };
        let mut failures = 0;
        for (index, listener) in listeners.iter_mut().enumerate() {
            if let Err(err) = listener(state, event) {
                failures += 1;
                warn!(event = %event.name, listener = index, error = %err, "listener failed");
            }
        }
        trace!(event = %event.name, count = listeners.len(), failures, "listeners dispatched");
        failures
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: FxHashMap<&str, usize> = self
            .listeners
            .iter()
            .map(|(name, list)| (name.as_str(), list.len()))
            .collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

impl Engine {
    /// Register a listener for an event name.
    pub fn on(
        &mut self,
        name: impl Into<String>,
        listener: impl FnMut(&mut DuelState, &GameEvent) -> Result<(), EngineError> + 'static,
    ) {
        self.bus.on(name, Box::new(listener));
    }

    /// Deliver an event to listeners without resolving triggers.
    pub fn notify(&mut self, event: &GameEvent) {
        self.bus.dispatch(&mut self.duel, event);
    }

    /// Deliver an event to listeners, then resolve its triggered abilities.
    pub fn emit(&mut self, event: GameEvent) -> EventResolution {
        self.notify(&event);
        self.resolve_event(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DuelConfig, PlayerId};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_listeners_run_in_order() {
        let mut engine = Engine::headless(DuelConfig::default());
        let seen = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second"] {
            let seen = Rc::clone(&seen);
            engine.on("ping", move |_, _| {
                seen.borrow_mut().push(tag);
                Ok(())
            });
        }

        engine.notify(&GameEvent::new("ping"));
        engine.notify(&GameEvent::new("other"));

        assert_eq!(*seen.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_listener_error_is_isolated() {
        let mut engine = Engine::headless(DuelConfig::default());
        engine.on("damage", |_, _| Err(EngineError::effect("boom")));
        engine.on("damage", |state, event| {
            let player = event.player.unwrap_or(PlayerId::new(0));
            state.inflict_damage(player, event.value(0, 0));
            Ok(())
        });

        let resolution = engine.emit(GameEvent::new("damage").with_player(PlayerId::new(1)).with_value(300));

        assert!(resolution.ok);
        assert_eq!(engine.duel.player(PlayerId::new(1)).life, 7700);
        assert_eq!(engine.bus.listener_count("damage"), 2);
    }
}

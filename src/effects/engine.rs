//! The effect engine interface.
//!
//! The rules core does not know what any card does. It asks an
//! `EffectEngine` which abilities respond to an event, activates them one at
//! a time, and delegates destruction so replacement effects can intervene.
//! Every method takes the engine mutably, so an activation may run zone
//! operations, emit further events, or ask for a selection.

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, PlayerId};
use crate::engine::{Engine, ZoneOpMeta};
use crate::error::EngineError;
use crate::selection::{ActivationContext, SelectionContract, SelectionMap};
use crate::triggers::{names, CompletionHook, GameEvent, TriggerCollection, TriggerEntry};

/// Context passed to one activation.
#[derive(Clone, Copy, Debug)]
pub struct TriggerContext<'a> {
    /// The event being resolved.
    pub event: &'a GameEvent,
    /// Position of the entry in its collection.
    pub index: usize,
    /// Choices supplied when resuming a paused entry.
    pub selections: Option<&'a SelectionMap>,
    /// Caller context supplied with those choices.
    pub action_context: Option<&'a ActivationContext>,
}

/// Result of activating one entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// The ability resolved.
    Resolved,
    /// The ability did nothing (conditions no longer hold, no handler).
    Skipped(String),
    /// The ability failed.
    Failed(String),
    /// The ability needs a choice. Resolution pauses here.
    NeedsSelection(SelectionContract),
}

/// Why a card is being destroyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DestroyCause {
    Battle,
    Effect,
}

impl DestroyCause {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            DestroyCause::Battle => "battle",
            DestroyCause::Effect => "effect",
        }
    }
}

/// A destruction request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DestroyRequest {
    pub cause: DestroyCause,
    /// Card responsible for the destruction.
    pub source: Option<EntityId>,
    /// Seat opposing the destroyed card's controller.
    pub opponent: Option<PlayerId>,
}

impl DestroyRequest {
    /// Destruction by battle with `destroyer`.
    #[must_use]
    pub fn battle(destroyer: EntityId, opponent: Option<PlayerId>) -> Self {
        Self {
            cause: DestroyCause::Battle,
            source: Some(destroyer),
            opponent,
        }
    }
}

/// Result of a destruction request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DestroyOutcome {
    /// The card went to the graveyard.
    Destroyed,
    /// Something prevented the destruction.
    Survived,
    /// A replacement effect needs a choice first.
    NeedsSelection(SelectionContract),
}

/// The card-effect collaborator.
pub trait EffectEngine {
    /// Abilities that respond to `event`, in resolution order.
    fn collect_event_triggers(&self, engine: &Engine, event: &GameEvent) -> TriggerCollection;

    /// Activate one entry.
    fn activate(
        &self,
        engine: &mut Engine,
        entry: &TriggerEntry,
        ctx: &TriggerContext<'_>,
    ) -> Result<ActivationOutcome, EngineError>;

    /// Run a collection's completion hook.
    fn on_complete(&self, _engine: &mut Engine, _hook: &CompletionHook, _event: &GameEvent) -> Result<(), EngineError> {
        Ok(())
    }

    /// Destroy a card. The default sends it to its owner's graveyard.
    fn destroy_card(
        &self,
        engine: &mut Engine,
        card: EntityId,
        request: &DestroyRequest,
    ) -> Result<DestroyOutcome, EngineError> {
        destroy_to_graveyard(engine, card, request)
    }

    /// Give the defending seat a chance to respond after a summon or an
    /// attack declaration.
    fn offer_trap_window(&self, _engine: &mut Engine, _defender: PlayerId, _event: &GameEvent) -> Result<(), EngineError> {
        Ok(())
    }
}

/// An effect engine with no card effects.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullEffectEngine;

impl EffectEngine for NullEffectEngine {
    fn collect_event_triggers(&self, _engine: &Engine, _event: &GameEvent) -> TriggerCollection {
        TriggerCollection::default()
    }

    fn activate(
        &self,
        _engine: &mut Engine,
        entry: &TriggerEntry,
        _ctx: &TriggerContext<'_>,
    ) -> Result<ActivationOutcome, EngineError> {
        Ok(ActivationOutcome::Skipped(format!("no effect engine for '{}'", entry.action)))
    }
}

/// Send a card to its owner's graveyard inside a zone operation and
/// announce it.
pub fn destroy_to_graveyard(
    engine: &mut Engine,
    card: EntityId,
    request: &DestroyRequest,
) -> Result<DestroyOutcome, EngineError> {
    let (holder, from) = engine.run_zone_op("destroy_card", ZoneOpMeta::default(), |e| {
        let (holder, from, _) = e.duel.locate(card).ok_or(EngineError::NotInZone(card))?;
        e.duel.send_to_graveyard(card)?;
        Ok((holder, from))
    })?;

    let mut event = GameEvent::new(names::CARD_DESTROYED)
        .with_target(card)
        .with_player(holder)
        .with_zone(from)
        .with_tag(request.cause.as_str());
    if let Some(source) = request.source {
        event = event.with_source(source);
    }
    engine.notify(&event);
    Ok(DestroyOutcome::Destroyed)
}

//! Trigger resolution.
//!
//! Resolving an event walks its collected entries in order. An entry that
//! needs a player choice parks the whole resolution as a
//! `PendingEventSelection` (event, entries, cursor, results so far) and the
//! walk stops. Resuming re-enters the walk at the parked entry with the
//! player's choices, so no entry runs twice and none is skipped.
//!
//! Entry failures are isolated: they are logged, recorded in the results,
//! and the walk moves on.

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, info, warn};

use crate::combat::CombatOutcome;
use crate::effects::{ActivationOutcome, TriggerContext};
use crate::engine::Engine;
use crate::error::EngineError;
use crate::selection::{ActivationContext, SelectionContract, SelectionMap};

use super::entry::{CompletionHook, TriggerEntry, TriggerId};
use super::event::{names, GameEvent};

/// How one entry finished.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    Resolved,
    Skipped(String),
    Failed(String),
}

/// Record of one finished entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryResult {
    pub index: usize,
    pub trigger: TriggerId,
    pub summary: String,
    pub status: EntryStatus,
}

impl EntryResult {
    fn new(index: usize, entry: &TriggerEntry, status: EntryStatus) -> Self {
        Self {
            index,
            trigger: entry.id,
            summary: entry.summary.clone(),
            status,
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status == EntryStatus::Resolved
    }
}

/// A resolution paused on a player choice.
///
/// Plain data: it can be stored with `to_bytes` and restored with
/// `from_bytes` (for example across a server round trip).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEventSelection {
    pub resolution_id: u64,
    pub event: GameEvent,
    pub entries: Vec<TriggerEntry>,
    /// Index of the entry waiting on the choice.
    pub entry_index: usize,
    /// Results of the entries before it.
    pub results: Vec<EntryResult>,
    pub order_rule: Option<String>,
    pub on_complete: Option<CompletionHook>,
    pub selection_contract: SelectionContract,
}

impl PendingEventSelection {
    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EngineError> {
        bincode::serialize(self).map_err(|e| EngineError::Codec(e.to_string()))
    }

    /// Decode from `to_bytes` output.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EngineError> {
        bincode::deserialize(bytes).map_err(|e| EngineError::Codec(e.to_string()))
    }

    /// The entry waiting on the choice.
    #[must_use]
    pub fn waiting_entry(&self) -> Option<&TriggerEntry> {
        self.entries.get(self.entry_index)
    }
}

/// Where to start walking a list of entries.
#[derive(Clone, Debug, Default)]
pub struct ResolveOptions {
    pub start_index: usize,
    /// Results carried over from before a pause.
    pub results: Vec<EntryResult>,
    /// Choices for the entry at `start_index`.
    pub selections: Option<SelectionMap>,
    pub action_context: Option<ActivationContext>,
    pub order_rule: Option<String>,
    pub on_complete: Option<CompletionHook>,
    pub resolution_id: u64,
}

/// Caller context supplied with resumed choices.
#[derive(Clone, Debug, Default)]
pub struct ResumeContext {
    pub action_context: Option<ActivationContext>,
}

/// What resolving an event produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventResolution {
    pub ok: bool,
    pub needs_selection: bool,
    pub selection_contract: Option<SelectionContract>,
    pub trigger_count: usize,
    pub results: Vec<EntryResult>,
    pub reason: Option<String>,
    /// Combat resumed after the resolution finished.
    pub continuation: Option<CombatOutcome>,
}

impl EventResolution {
    fn complete(trigger_count: usize, results: Vec<EntryResult>) -> Self {
        Self {
            ok: true,
            trigger_count,
            results,
            ..Self::default()
        }
    }

    fn paused(contract: SelectionContract, trigger_count: usize, results: Vec<EntryResult>) -> Self {
        Self {
            ok: true,
            needs_selection: true,
            selection_contract: Some(contract),
            trigger_count,
            results,
            ..Self::default()
        }
    }

    fn failed(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::default()
        }
    }
}

impl Engine {
    /// Collect and resolve the triggered abilities for an event.
    pub fn resolve_event(&mut self, event: GameEvent) -> EventResolution {
        self.resolution_counter += 1;
        let resolution_id = self.resolution_counter;
        self.event_depth += 1;
        let span = debug_span!("resolve_event", id = resolution_id, event = %event.name, depth = self.event_depth);
        let _guard = span.enter();

        let effects = self.effects();
        let collection = effects.collect_event_triggers(self, &event);
        if let Some(rule) = &collection.order_rule {
            debug!(rule = %rule, count = collection.entries.len(), "entries ordered");
        }

        let options = ResolveOptions {
            order_rule: collection.order_rule,
            on_complete: collection.on_complete,
            resolution_id,
            ..ResolveOptions::default()
        };
        let mut resolution = self.resolve_event_entries(event, collection.entries, options);

        self.event_depth -= 1;
        self.check_after_resolution("resolve_event", &mut resolution);
        resolution
    }

    /// Walk `entries` from `options.start_index`.
    ///
    /// Parks a `PendingEventSelection` and returns early when an entry needs
    /// a choice. Otherwise runs the completion hook and, for summons and
    /// attack declarations, the defender's trap window.
    pub fn resolve_event_entries(
        &mut self,
        event: GameEvent,
        entries: Vec<TriggerEntry>,
        options: ResolveOptions,
    ) -> EventResolution {
        let ResolveOptions {
            start_index,
            mut results,
            mut selections,
            action_context,
            order_rule,
            on_complete,
            resolution_id,
        } = options;
        let trigger_count = entries.len();
        let effects = self.effects();

        for index in start_index..entries.len() {
            let entry = &entries[index];
            let provided = selections.take();
            let ctx = TriggerContext {
                event: &event,
                index,
                selections: provided.as_ref(),
                action_context: action_context.as_ref(),
            };

            let status = match effects.activate(self, entry, &ctx) {
                Ok(ActivationOutcome::NeedsSelection(contract)) => {
                    if let Some(previous) = &self.pending_event_selection {
                        warn!(
                            previous = previous.resolution_id,
                            event = %event.name,
                            "replacing an unresolved pending selection"
                        );
                    }
                    debug!(trigger = %entry.id, index, "resolution paused for selection");
                    self.pending_event_selection = Some(PendingEventSelection {
                        resolution_id,
                        event,
                        entries,
                        entry_index: index,
                        results: results.clone(),
                        order_rule,
                        on_complete,
                        selection_contract: contract.clone(),
                    });
                    return EventResolution::paused(contract, trigger_count, results);
                }
                Ok(ActivationOutcome::Resolved) => EntryStatus::Resolved,
                Ok(ActivationOutcome::Skipped(reason)) => EntryStatus::Skipped(reason),
                Ok(ActivationOutcome::Failed(reason)) => {
                    debug!(trigger = %entry.id, reason = %reason, "entry failed");
                    EntryStatus::Failed(reason)
                }
                Err(err) => {
                    warn!(trigger = %entry.id, error = %err, "entry raised an error");
                    EntryStatus::Failed(err.to_string())
                }
            };
            results.push(EntryResult::new(index, entry, status));
        }

        if let Some(hook) = &on_complete {
            if let Err(err) = effects.on_complete(self, hook, &event) {
                warn!(hook = %hook.tag, error = %err, "completion hook failed");
            }
        }

        if names::TRAP_WINDOW_EVENTS.contains(&event.name.as_str()) && self.duel.game_over.is_none() {
            if let Some(actor) = event.player {
                if let Err(err) = effects.offer_trap_window(self, actor.opponent(), &event) {
                    warn!(event = %event.name, error = %err, "trap window failed");
                }
            }
        }

        EventResolution::complete(trigger_count, results)
    }

    /// Resume the parked resolution with the player's choices.
    ///
    /// After the resolution completes, a parked attack declaration or tie
    /// destruction continues; its outcome is returned as `continuation`.
    pub fn resume_pending_event_selection(&mut self, selections: SelectionMap, ctx: ResumeContext) -> EventResolution {
        let Some(pending) = self.pending_event_selection.take() else {
            return EventResolution::failed("No pending selection to resume");
        };

        self.resolution_counter += 1;
        self.event_depth += 1;
        let span = debug_span!(
            "resume_event",
            id = pending.resolution_id,
            event = %pending.event.name,
            entry = pending.entry_index
        );
        let _guard = span.enter();

        let options = ResolveOptions {
            start_index: pending.entry_index,
            results: pending.results,
            selections: Some(selections),
            action_context: ctx.action_context,
            order_rule: pending.order_rule,
            on_complete: pending.on_complete,
            resolution_id: pending.resolution_id,
        };
        let mut resolution = self.resolve_event_entries(pending.event, pending.entries, options);

        self.event_depth -= 1;
        self.check_after_resolution("resume_event", &mut resolution);

        if !resolution.needs_selection {
            resolution.continuation = self.resume_parked_combat();
        }
        resolution
    }

    /// The parked resolution, if any.
    #[must_use]
    pub fn pending_event_selection(&self) -> Option<&PendingEventSelection> {
        self.pending_event_selection.as_ref()
    }

    /// Remove and return the parked resolution.
    pub fn take_pending_event_selection(&mut self) -> Option<PendingEventSelection> {
        self.pending_event_selection.take()
    }

    /// Park a previously taken or decoded resolution.
    pub fn restore_pending_event_selection(&mut self, pending: PendingEventSelection) {
        if self.pending_event_selection.is_some() {
            warn!(resolution = pending.resolution_id, "restoring over an existing pending selection");
        }
        self.pending_event_selection = Some(pending);
    }

    /// Drop the parked resolution and any combat waiting on it.
    pub fn clear_pending_event_selection(&mut self) {
        if self.pending_event_selection.take().is_some() {
            info!("pending selection discarded");
        }
        self.pending_attack = None;
        self.pending_tie_destruction = None;
    }

    /// Number of event resolutions started so far.
    #[must_use]
    pub fn resolution_counter(&self) -> u64 {
        self.resolution_counter
    }

    /// Nesting depth of event resolution.
    #[must_use]
    pub fn event_depth(&self) -> u32 {
        self.event_depth
    }

    fn check_after_resolution(&mut self, label: &str, resolution: &mut EventResolution) {
        if let Err(err) = self.check_invariants(label) {
            warn!(label, error = %err, "invariants failed after resolution");
            resolution.ok = false;
            resolution.reason = Some(err.to_string());
        }
    }
}

//! Selection sessions.
//!
//! A session is one live choice: a normalized contract, the answers so far,
//! and what to run once the player confirms. The phase moves
//! `Idle -> Selecting -> Confirming -> Resolving -> Idle`, and a cancel or
//! a rollback returns it straight to `Idle`.
//!
//! At most one session is live per engine.

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::core::{EntityId, PlayerId, ZoneKind};
use crate::engine::{ActionResult, Engine};
use crate::error::EngineError;

use super::contract::{
    candidates_from_cards, normalize_selection_contract, ContractOverrides, RawRequirement, RawSelectionContract,
    Requirement, SelectionContract,
};
use super::frontend::frontend_for;
use super::SelectionMap;

/// Session lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SelectionPhase {
    #[default]
    Idle,
    Selecting,
    Confirming,
    Resolving,
}

/// How the session is presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SelectionMode {
    FieldTargeting,
    Modal,
}

/// Where the action that opened the session stands.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActivationContext {
    /// Costs were paid or the card was already moved; a failed or cancelled
    /// selection must undo that.
    pub committed: bool,
    pub source: Option<EntityId>,
    pub label: Option<String>,
}

impl ActivationContext {
    /// Context for an action that has already changed state.
    #[must_use]
    pub fn committed(source: Option<EntityId>) -> Self {
        Self {
            committed: true,
            source,
            label: None,
        }
    }
}

/// Runs with the player's answer.
pub type ExecuteFn = Box<dyn FnOnce(&mut Engine, &SelectionMap) -> Result<ActionResult, EngineError>>;

/// Undoes a committed activation.
pub type RollbackFn = Box<dyn FnOnce(&mut Engine)>;

/// Everything needed to open a session.
pub struct SessionRequest {
    contract: RawSelectionContract,
    overrides: ContractOverrides,
    activation: ActivationContext,
    execute: ExecuteFn,
    rollback: Option<RollbackFn>,
    responder: Option<oneshot::Sender<Vec<EntityId>>>,
}

impl SessionRequest {
    pub fn new(
        contract: impl Into<RawSelectionContract>,
        execute: impl FnOnce(&mut Engine, &SelectionMap) -> Result<ActionResult, EngineError> + 'static,
    ) -> Self {
        Self {
            contract: contract.into(),
            overrides: ContractOverrides::default(),
            activation: ActivationContext::default(),
            execute: Box::new(execute),
            rollback: None,
            responder: None,
        }
    }

    /// Apply contract overrides (builder pattern).
    #[must_use]
    pub fn with_overrides(mut self, overrides: ContractOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Set the activation context (builder pattern).
    #[must_use]
    pub fn with_activation(mut self, activation: ActivationContext) -> Self {
        self.activation = activation;
        self
    }

    /// Set the undo step for a committed activation (builder pattern).
    #[must_use]
    pub fn with_rollback(mut self, rollback: impl FnOnce(&mut Engine) + 'static) -> Self {
        self.rollback = Some(Box::new(rollback));
        self
    }

    /// Deliver the chosen cards through a channel (builder pattern).
    /// Cancelled or failed sessions deliver an empty list.
    #[must_use]
    pub fn with_responder(mut self, responder: oneshot::Sender<Vec<EntityId>>) -> Self {
        self.responder = Some(responder);
        self
    }
}

/// Result of a board click.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    Selected(String),
    Deselected(String),
    Ignored(String),
}

/// The live session.
pub struct SelectionSession {
    contract: SelectionContract,
    mode: SelectionMode,
    cursor: usize,
    chosen: Vec<Vec<String>>,
    auto_advance: bool,
    activation: ActivationContext,
    execute: Option<ExecuteFn>,
    rollback: Option<RollbackFn>,
    responder: Option<oneshot::Sender<Vec<EntityId>>>,
}

impl SelectionSession {
    #[must_use]
    pub fn contract(&self) -> &SelectionContract {
        &self.contract
    }

    #[must_use]
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Index of the requirement being answered.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn current_requirement(&self) -> Option<&Requirement> {
        self.contract.requirements.get(self.cursor)
    }

    /// Keys chosen for a requirement.
    #[must_use]
    pub fn chosen(&self, requirement: usize) -> &[String] {
        self.chosen.get(requirement).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn auto_advance(&self) -> bool {
        self.auto_advance
    }

    #[must_use]
    pub fn activation(&self) -> &ActivationContext {
        &self.activation
    }

    /// Answers so far, keyed by requirement id.
    #[must_use]
    pub fn selections(&self) -> SelectionMap {
        self.contract
            .requirements
            .iter()
            .zip(&self.chosen)
            .map(|(requirement, keys)| (requirement.id.clone(), keys.clone()))
            .collect()
    }

    fn respond(&mut self, cards: Vec<EntityId>) {
        if let Some(responder) = self.responder.take() {
            if responder.send(cards).is_err() {
                debug!("selection receiver dropped");
            }
        }
    }
}

impl std::fmt::Debug for SelectionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionSession")
            .field("kind", &self.contract.kind)
            .field("mode", &self.mode)
            .field("cursor", &self.cursor)
            .field("chosen", &self.chosen)
            .field("activation", &self.activation)
            .finish_non_exhaustive()
    }
}

/// Request for `ask_player_to_select_cards`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardPickRequest {
    pub cards: Vec<EntityId>,
    pub min: usize,
    pub max: usize,
    pub title: Option<String>,
    pub prevent_cancel: bool,
    pub use_field_targeting: Option<bool>,
}

impl CardPickRequest {
    /// Pick exactly one of `cards`.
    pub fn new(cards: Vec<EntityId>) -> Self {
        Self {
            cards,
            min: 1,
            max: 1,
            title: None,
            prevent_cancel: false,
            use_field_targeting: None,
        }
    }

    /// Set the count range (builder pattern).
    #[must_use]
    pub fn with_count(mut self, min: usize, max: usize) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Set the title (builder pattern).
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

fn no_session() -> EngineError {
    EngineError::Selection("No selection in progress".to_string())
}

impl Engine {
    /// Current session phase.
    #[must_use]
    pub fn selection_phase(&self) -> SelectionPhase {
        self.selection_phase
    }

    /// The live session, if any.
    #[must_use]
    pub fn active_session(&self) -> Option<&SelectionSession> {
        self.active_session.as_ref()
    }

    /// Normalize the contract and open a session.
    ///
    /// Fails without touching state if a session is already in progress,
    /// the contract is invalid, or a requirement has fewer candidates than
    /// it needs.
    pub fn start_target_selection_session(&mut self, request: SessionRequest) -> Result<SelectionMode, EngineError> {
        let SessionRequest {
            contract,
            overrides,
            activation,
            execute,
            rollback,
            responder,
        } = request;

        if self.active_session.is_some() {
            warn!(kind = ?contract.kind, "selection refused while another is open");
            return Err(EngineError::Selection("A selection is already in progress".to_string()));
        }
        let contract = normalize_selection_contract(&contract, &overrides)?;
        if let Some(short) = contract.requirements.iter().find(|r| r.candidates.len() < r.min) {
            debug!(requirement = %short.id, candidates = short.candidates.len(), "not enough candidates");
            return Err(EngineError::Selection("No valid targets".to_string()));
        }

        let mode = if contract.ui.use_field_targeting {
            SelectionMode::FieldTargeting
        } else {
            SelectionMode::Modal
        };
        let auto_advance = contract.ui.auto_advance.unwrap_or(match mode {
            SelectionMode::FieldTargeting => self.duel.config.field_targeting_auto_advance,
            SelectionMode::Modal => false,
        });

        let session = SelectionSession {
            chosen: vec![Vec::new(); contract.requirements.len()],
            contract,
            mode,
            cursor: 0,
            auto_advance,
            activation,
            execute: Some(execute),
            rollback,
            responder,
        };
        frontend_for(mode).open(self.presenter.as_ref(), &session);
        debug!(kind = %session.contract.kind, ?mode, "selection started");

        self.active_session = Some(session);
        self.selection_phase = SelectionPhase::Selecting;
        Ok(mode)
    }

    /// A click on a board slot during field targeting.
    ///
    /// The slot's card is matched against the current requirement's
    /// candidates by identity; an empty slot matches a card-less candidate
    /// for that slot.
    pub fn handle_board_click(
        &mut self,
        player: PlayerId,
        zone: ZoneKind,
        index: usize,
    ) -> Result<ClickOutcome, EngineError> {
        let session = self.active_session.as_ref().ok_or_else(no_session)?;
        if session.mode != SelectionMode::FieldTargeting {
            return Err(EngineError::Selection("This selection is made in the picker".to_string()));
        }
        if !player.is_known() {
            return Ok(ClickOutcome::Ignored("No such seat".to_string()));
        }

        let slot_card = self.duel.zones(player).card_at(zone, index);
        let key = session
            .current_requirement()
            .and_then(|requirement| match slot_card {
                Some(card) => requirement.candidate_for_card(card),
                None => requirement.candidates.iter().find(|c| {
                    c.card.is_none()
                        && !c.is_direct_attack
                        && c.zone == Some(zone)
                        && c.index == Some(index)
                        && c.controller.map_or(true, |p| p == player)
                }),
            })
            .map(|candidate| candidate.key.clone());

        match key {
            Some(key) => self.toggle_candidate(&key),
            None => Ok(ClickOutcome::Ignored("Not a valid target".to_string())),
        }
    }

    /// A click on a seat's life display: picks the direct-attack option.
    pub fn handle_player_click(&mut self, defender: PlayerId) -> Result<ClickOutcome, EngineError> {
        let session = self.active_session.as_ref().ok_or_else(no_session)?;
        if !defender.is_known() {
            return Ok(ClickOutcome::Ignored("No such seat".to_string()));
        }
        let key = session
            .current_requirement()
            .and_then(|r| r.direct_attack_candidate(defender))
            .map(|c| c.key.clone());
        match key {
            Some(key) => self.toggle_candidate(&key),
            None => Ok(ClickOutcome::Ignored("Cannot target that player".to_string())),
        }
    }

    /// Toggle a candidate of the current requirement.
    ///
    /// A single-choice requirement replaces its answer. With auto-advance,
    /// filling a requirement moves to the next one.
    pub fn toggle_candidate(&mut self, key: &str) -> Result<ClickOutcome, EngineError> {
        if self.selection_phase != SelectionPhase::Selecting {
            return Ok(ClickOutcome::Ignored("Selection is not accepting choices".to_string()));
        }
        let session = self.active_session.as_mut().ok_or_else(no_session)?;
        let cursor = session.cursor;
        let Some(requirement) = session.contract.requirements.get(cursor) else {
            return Err(EngineError::Selection("No requirement to answer".to_string()));
        };
        if requirement.candidate(key).is_none() {
            return Ok(ClickOutcome::Ignored("Not a valid target".to_string()));
        }
        let max = requirement.max;

        let chosen = &mut session.chosen[cursor];
        let outcome = if let Some(position) = chosen.iter().position(|k| k == key) {
            chosen.remove(position);
            ClickOutcome::Deselected(key.to_string())
        } else if chosen.len() < max {
            chosen.push(key.to_string());
            ClickOutcome::Selected(key.to_string())
        } else if max == 1 {
            chosen.clear();
            chosen.push(key.to_string());
            ClickOutcome::Selected(key.to_string())
        } else {
            return Ok(ClickOutcome::Ignored("Maximum selections reached".to_string()));
        };

        let filled = chosen.len() == max;
        if filled && session.auto_advance && matches!(outcome, ClickOutcome::Selected(_)) {
            self.advance_target_selection()?;
        }
        Ok(outcome)
    }

    /// Move past the current requirement, or to confirmation after the last.
    pub fn advance_target_selection(&mut self) -> Result<SelectionPhase, EngineError> {
        if self.selection_phase != SelectionPhase::Selecting {
            return Err(EngineError::Selection("Selection is not accepting choices".to_string()));
        }
        let presenter = self.presenter();
        let session = self.active_session.as_mut().ok_or_else(no_session)?;
        let Some(requirement) = session.contract.requirements.get(session.cursor) else {
            return Err(EngineError::Selection("No requirement to answer".to_string()));
        };
        if session.chosen[session.cursor].len() < requirement.min {
            return Err(EngineError::Selection(format!("Select at least {}", requirement.min)));
        }

        let frontend = frontend_for(session.mode);
        let phase = if session.cursor + 1 < session.contract.requirements.len() {
            session.cursor += 1;
            frontend.focus(presenter.as_ref(), session);
            SelectionPhase::Selecting
        } else {
            frontend.confirm(presenter.as_ref(), session);
            SelectionPhase::Confirming
        };
        self.selection_phase = phase;
        Ok(phase)
    }

    /// Answer every requirement at once, then finish.
    pub fn submit_target_selection(&mut self, selections: SelectionMap) -> ActionResult {
        if self.selection_phase == SelectionPhase::Resolving {
            return ActionResult::fail("Selection is already resolving");
        }
        let Some(session) = self.active_session.as_mut() else {
            return ActionResult::from_error(&no_session());
        };
        if let Err(err) = session.contract.check_selections(&selections) {
            return ActionResult::from_error(&err);
        }
        session.chosen = session
            .contract
            .requirements
            .iter()
            .map(|r| selections.get(&r.id).cloned().unwrap_or_default())
            .collect();
        self.selection_phase = SelectionPhase::Confirming;
        self.finish_target_selection()
    }

    /// Run the session's action with the collected answer.
    ///
    /// An incomplete answer leaves the session open. A failed action on a
    /// committed activation runs the session's rollback.
    pub fn finish_target_selection(&mut self) -> ActionResult {
        let Some(mut session) = self.active_session.take() else {
            return ActionResult::from_error(&no_session());
        };
        let selections = session.selections();
        if let Err(err) = session.contract.check_selections(&selections) {
            self.active_session = Some(session);
            return ActionResult::from_error(&err);
        }

        self.selection_phase = SelectionPhase::Resolving;
        frontend_for(session.mode).close(self.presenter.as_ref());
        debug!(kind = %session.contract.kind, "selection resolving");

        let result = match session.execute.take() {
            Some(execute) => ActionResult::normalize(execute(self, &selections)),
            None => ActionResult::ok(),
        };

        if result.is_failure() && session.activation.committed {
            if let Some(rollback) = session.rollback.take() {
                info!(reason = ?result.reason, "undoing committed activation");
                rollback(self);
            }
        }

        let cards = if result.is_failure() {
            Vec::new()
        } else {
            session.contract.resolve_cards(&selections)
        };
        session.respond(cards);

        if self.active_session.is_none() {
            self.selection_phase = SelectionPhase::Idle;
        }
        self.presenter.render(&self.duel);
        result
    }

    /// Abandon the session. Returns false if there is none or it forbids
    /// cancelling.
    pub fn cancel_target_selection(&mut self) -> bool {
        let prevent_cancel = match &self.active_session {
            Some(session) => session.contract.ui.prevent_cancel,
            None => return false,
        };
        if prevent_cancel {
            self.game_log("This choice cannot be cancelled.");
            return false;
        }
        let Some(mut session) = self.active_session.take() else {
            return false;
        };

        self.selection_phase = SelectionPhase::Idle;
        frontend_for(session.mode).close(self.presenter.as_ref());
        session.respond(Vec::new());
        if session.activation.committed {
            if let Some(rollback) = session.rollback.take() {
                rollback(self);
            }
        }
        info!(kind = %session.contract.kind, "selection cancelled");
        true
    }

    /// Drop any session without running its action or rollback.
    pub fn force_clear_target_selection(&mut self, reason: &str) {
        self.selection_phase = SelectionPhase::Idle;
        if let Some(mut session) = self.active_session.take() {
            frontend_for(session.mode).close(self.presenter.as_ref());
            session.respond(Vec::new());
            debug!(reason, kind = %session.contract.kind, "selection cleared");
        }
    }

    /// Ask the player to pick among cards.
    ///
    /// The receiver yields the picked cards, or an empty list if the
    /// session is cancelled or cleared.
    pub fn ask_player_to_select_cards(
        &mut self,
        request: CardPickRequest,
    ) -> Result<oneshot::Receiver<Vec<EntityId>>, EngineError> {
        if request.cards.is_empty() {
            return Err(EngineError::Selection("No valid targets".to_string()));
        }
        let candidates = candidates_from_cards(&self.duel, &request.cards);
        let mut raw = RawSelectionContract::new("card_pick").with_requirement(
            RawRequirement::new("cards")
                .with_count(request.min, request.max)
                .with_candidates(candidates),
        );
        raw.ui.title = request.title;
        raw.ui.prevent_cancel = Some(request.prevent_cancel);
        raw.ui.use_field_targeting = request.use_field_targeting;

        let (tx, rx) = oneshot::channel();
        let session = SessionRequest::new(raw, |_, _| Ok(ActionResult::ok())).with_responder(tx);
        self.start_target_selection_session(session)?;
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardId, CardInstance};
    use crate::core::DuelConfig;
    use crate::selection::RawCandidate;
    use std::cell::Cell;
    use std::rc::Rc;

    fn p0() -> PlayerId {
        PlayerId::new(0)
    }

    fn p1() -> PlayerId {
        PlayerId::new(1)
    }

    fn setup() -> (Engine, Vec<EntityId>) {
        let mut engine = Engine::headless(DuelConfig::default());
        let mut ids = Vec::new();
        for atk in [1000, 1500, 2000] {
            let card = CardInstance::monster(EntityId(0), CardId::new(1), "Foe", p1(), atk, 0);
            ids.push(engine.duel.spawn_card(card, p1(), ZoneKind::Field).unwrap());
        }
        (engine, ids)
    }

    fn field_contract(engine: &Engine, cards: &[EntityId], min: usize, max: usize) -> RawSelectionContract {
        RawSelectionContract::new("target").with_requirement(
            RawRequirement::new("target")
                .with_count(min, max)
                .with_candidates(candidates_from_cards(&engine.duel, cards)),
        )
    }

    #[test]
    fn test_field_targeting_flow() {
        let (mut engine, ids) = setup();
        let hit = Rc::new(Cell::new(None));
        let seen = Rc::clone(&hit);
        let contract = field_contract(&engine, &ids, 1, 1);
        let request = SessionRequest::new(contract, move |_, selections| {
            seen.set(selections.get("target").map(|keys| keys.len()));
            Ok(ActionResult::ok())
        })
        .with_overrides(ContractOverrides {
            auto_advance: Some(false),
            ..ContractOverrides::default()
        });

        let mode = engine.start_target_selection_session(request).unwrap();
        assert_eq!(mode, SelectionMode::FieldTargeting);
        assert_eq!(engine.selection_phase(), SelectionPhase::Selecting);

        let outcome = engine.handle_board_click(p1(), ZoneKind::Field, 1).unwrap();
        assert!(matches!(outcome, ClickOutcome::Selected(_)));

        // Single choice: a second click replaces the first.
        engine.handle_board_click(p1(), ZoneKind::Field, 2).unwrap();
        let session = engine.active_session().unwrap();
        assert_eq!(session.chosen(0).len(), 1);
        assert!(session.chosen(0)[0].ends_with(&ids[2].raw().to_string()));

        assert_eq!(engine.advance_target_selection().unwrap(), SelectionPhase::Confirming);
        let result = engine.finish_target_selection();

        assert!(result.success);
        assert_eq!(hit.get(), Some(1));
        assert_eq!(engine.selection_phase(), SelectionPhase::Idle);
        assert!(engine.active_session().is_none());
    }

    #[test]
    fn test_click_on_non_candidate_is_ignored() {
        let (mut engine, ids) = setup();
        let contract = field_contract(&engine, &ids[..1], 1, 1);
        engine
            .start_target_selection_session(SessionRequest::new(contract, |_, _| Ok(ActionResult::ok())))
            .unwrap();

        let outcome = engine.handle_board_click(p1(), ZoneKind::Field, 2).unwrap();
        let empty = engine.handle_board_click(p0(), ZoneKind::Field, 0).unwrap();

        assert!(matches!(outcome, ClickOutcome::Ignored(_)));
        assert!(matches!(empty, ClickOutcome::Ignored(_)));
    }

    #[test]
    fn test_auto_advance_reaches_confirming() {
        let (mut engine, ids) = setup();
        let contract = field_contract(&engine, &ids, 2, 2);
        engine
            .start_target_selection_session(SessionRequest::new(contract, |_, _| Ok(ActionResult::ok())))
            .unwrap();

        engine.handle_board_click(p1(), ZoneKind::Field, 0).unwrap();
        assert_eq!(engine.selection_phase(), SelectionPhase::Selecting);
        engine.handle_board_click(p1(), ZoneKind::Field, 1).unwrap();

        assert_eq!(engine.selection_phase(), SelectionPhase::Confirming);
        let ignored = engine.handle_board_click(p1(), ZoneKind::Field, 2).unwrap();
        assert!(matches!(ignored, ClickOutcome::Ignored(_)));
    }

    #[test]
    fn test_advance_requires_minimum() {
        let (mut engine, ids) = setup();
        let contract = field_contract(&engine, &ids, 2, 3);
        engine
            .start_target_selection_session(SessionRequest::new(contract, |_, _| Ok(ActionResult::ok())))
            .unwrap();
        engine.handle_board_click(p1(), ZoneKind::Field, 0).unwrap();

        let err = engine.advance_target_selection().unwrap_err();

        assert_eq!(err.to_string(), "Select at least 2");
        assert_eq!(engine.selection_phase(), SelectionPhase::Selecting);
    }

    #[test]
    fn test_finish_with_incomplete_answer_keeps_session() {
        let (mut engine, ids) = setup();
        let contract = field_contract(&engine, &ids, 1, 1);
        engine
            .start_target_selection_session(SessionRequest::new(contract, |_, _| Ok(ActionResult::ok())))
            .unwrap();

        let result = engine.finish_target_selection();

        assert!(result.is_failure());
        assert!(engine.active_session().is_some());
    }

    #[test]
    fn test_modal_submit() {
        let mut engine = Engine::headless(DuelConfig::default());
        let card = CardInstance::monster(EntityId(0), CardId::new(1), "Recruit", p0(), 100, 100);
        let id = engine.duel.spawn_card(card, p0(), ZoneKind::Graveyard).unwrap();
        let contract = RawSelectionContract::new("revive").with_requirement(
            RawRequirement::new("card").with_candidates(candidates_from_cards(&engine.duel, &[id])),
        );
        let request = SessionRequest::new(contract, move |engine, selections| {
            assert_eq!(selections["card"].len(), 1);
            engine.duel.move_card(id, p0(), ZoneKind::Hand, Default::default())?;
            Ok(ActionResult::ok())
        });

        assert_eq!(engine.start_target_selection_session(request).unwrap(), SelectionMode::Modal);
        assert!(engine.handle_board_click(p0(), ZoneKind::Graveyard, 0).is_err());

        let key = engine.active_session().unwrap().contract().requirements[0].candidates[0].key.clone();
        let mut answer = SelectionMap::new();
        answer.insert("card".into(), vec![key]);
        let result = engine.submit_target_selection(answer);

        assert!(result.success);
        assert!(engine.duel.is_in(id, p0(), ZoneKind::Hand));
    }

    #[test]
    fn test_cancel_runs_rollback_when_committed() {
        let (mut engine, ids) = setup();
        let undone = Rc::new(Cell::new(false));
        let flag = Rc::clone(&undone);
        let contract = field_contract(&engine, &ids, 1, 1);
        let request = SessionRequest::new(contract, |_, _| Ok(ActionResult::ok()))
            .with_activation(ActivationContext::committed(None))
            .with_rollback(move |_| flag.set(true));
        engine.start_target_selection_session(request).unwrap();

        assert!(engine.cancel_target_selection());
        assert!(undone.get());
        assert_eq!(engine.selection_phase(), SelectionPhase::Idle);
        assert!(!engine.cancel_target_selection());
    }

    #[test]
    fn test_prevent_cancel() {
        let (mut engine, ids) = setup();
        let contract = field_contract(&engine, &ids, 1, 1).prevent_cancel();
        engine
            .start_target_selection_session(SessionRequest::new(contract, |_, _| Ok(ActionResult::ok())))
            .unwrap();

        assert!(!engine.cancel_target_selection());
        assert!(engine.active_session().is_some());
    }

    #[test]
    fn test_failed_execute_rolls_back_committed() {
        let (mut engine, ids) = setup();
        let undone = Rc::new(Cell::new(0));
        let count = Rc::clone(&undone);
        let contract = field_contract(&engine, &ids, 1, 1);
        let request = SessionRequest::new(contract, |_, _| Err(EngineError::effect("Target vanished")))
            .with_activation(ActivationContext::committed(None))
            .with_rollback(move |_| count.set(count.get() + 1));
        engine.start_target_selection_session(request).unwrap();
        engine.handle_board_click(p1(), ZoneKind::Field, 0).unwrap();

        let result = engine.finish_target_selection();

        assert_eq!(result.reason.as_deref(), Some("Target vanished"));
        assert_eq!(undone.get(), 1);
    }

    #[test]
    fn test_no_valid_targets() {
        let mut engine = Engine::headless(DuelConfig::default());
        let contract = RawSelectionContract::new("target")
            .with_requirement(RawRequirement::new("target").with_zones(vec![ZoneKind::Field]));

        let err = engine
            .start_target_selection_session(SessionRequest::new(contract, |_, _| Ok(ActionResult::ok())))
            .unwrap_err();

        assert_eq!(err.to_string(), "No valid targets");
        assert_eq!(engine.selection_phase(), SelectionPhase::Idle);
    }

    #[test]
    fn test_click_on_unknown_seat_is_ignored() {
        let (mut engine, ids) = setup();
        let contract = field_contract(&engine, &ids, 1, 1);
        engine
            .start_target_selection_session(SessionRequest::new(contract, |_, _| Ok(ActionResult::ok())))
            .unwrap();

        let board = engine.handle_board_click(PlayerId::new(2), ZoneKind::Field, 0).unwrap();
        let player = engine.handle_player_click(PlayerId::new(7)).unwrap();

        assert!(matches!(board, ClickOutcome::Ignored(_)));
        assert!(matches!(player, ClickOutcome::Ignored(_)));
        assert_eq!(engine.selection_phase(), SelectionPhase::Selecting);
    }

    #[test]
    fn test_second_session_is_refused() {
        let (mut engine, ids) = setup();
        let first = field_contract(&engine, &ids, 1, 1);
        let second = field_contract(&engine, &ids, 1, 1);
        engine
            .start_target_selection_session(SessionRequest::new(first, |_, _| Ok(ActionResult::ok())))
            .unwrap();

        let err = engine
            .start_target_selection_session(SessionRequest::new(second, |_, _| Ok(ActionResult::ok())))
            .unwrap_err();

        assert_eq!(err.to_string(), "A selection is already in progress");
        assert_eq!(engine.selection_phase(), SelectionPhase::Selecting);
        assert_eq!(engine.active_session().unwrap().cursor(), 0);
    }

    #[test]
    fn test_direct_attack_click() {
        let (mut engine, ids) = setup();
        let contract = RawSelectionContract::new("attack_target").with_requirement(
            RawRequirement::new("target")
                .with_candidates(candidates_from_cards(&engine.duel, &ids))
                .with_candidate(RawCandidate::direct_attack(p1())),
        );
        engine
            .start_target_selection_session(SessionRequest::new(contract, |_, _| Ok(ActionResult::ok())))
            .unwrap();

        assert_eq!(engine.handle_player_click(p1()).unwrap(), ClickOutcome::Selected("direct".into()));
        assert!(matches!(engine.handle_player_click(p0()).unwrap(), ClickOutcome::Ignored(_)));
    }

    #[test]
    fn test_ask_player_to_select_cards() {
        let (mut engine, ids) = setup();
        let mut rx = engine
            .ask_player_to_select_cards(CardPickRequest::new(ids.clone()).with_count(1, 2))
            .unwrap();

        engine.handle_board_click(p1(), ZoneKind::Field, 0).unwrap();
        engine.handle_board_click(p1(), ZoneKind::Field, 2).unwrap();
        assert_eq!(engine.selection_phase(), SelectionPhase::Confirming);
        assert!(engine.finish_target_selection().success);

        assert_eq!(rx.try_recv().unwrap(), vec![ids[0], ids[2]]);
    }

    #[test]
    fn test_ask_player_cancel_yields_empty() {
        let (mut engine, ids) = setup();
        let mut rx = engine.ask_player_to_select_cards(CardPickRequest::new(ids)).unwrap();

        assert!(engine.cancel_target_selection());

        assert_eq!(rx.try_recv().unwrap(), Vec::<EntityId>::new());
    }
}

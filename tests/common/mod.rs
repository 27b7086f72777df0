//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use rust_duel::cards::{CardId, CardInstance};
use rust_duel::core::{DuelConfig, DuelState, EntityId, GameResult, PlayerId, ZoneKind};
use rust_duel::presenter::Presenter;
use rust_duel::selection::{
    normalize_selection_contract, ContractOverrides, RawCandidate, RawRequirement, RawSelectionContract,
    SelectionContract,
};
use rust_duel::Engine;

/// Install a test subscriber once. `RUST_LOG=rust_duel=debug` shows the
/// resolution trace.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn p0() -> PlayerId {
    PlayerId::new(0)
}

pub fn p1() -> PlayerId {
    PlayerId::new(1)
}

pub fn engine() -> Engine {
    init_tracing();
    Engine::headless(DuelConfig::default())
}

/// Spawn a face-up attack-position monster.
pub fn monster(engine: &mut Engine, owner: PlayerId, zone: ZoneKind, attack: i64, defense: i64) -> EntityId {
    let card = CardInstance::monster(EntityId(0), CardId::new(1), "Monster", owner, attack, defense);
    engine.duel.spawn_card(card, owner, zone).unwrap()
}

/// How many zone slots hold `card`, across both seats.
pub fn occurrences(state: &DuelState, card: EntityId) -> usize {
    PlayerId::all()
        .map(|p| state.zones(p).iter_slots().filter(|&(_, _, id)| id == card).count())
        .sum()
}

/// A one-requirement contract over the given cards.
pub fn choose_contract(state: &DuelState, kind: &str, cards: &[EntityId]) -> SelectionContract {
    let candidates: Vec<RawCandidate> = rust_duel::selection::candidates_from_cards(state, cards);
    let raw = RawSelectionContract::new(kind).with_requirement(
        RawRequirement::new("choice")
            .with_zones(vec![ZoneKind::Field])
            .with_candidates(candidates),
    );
    normalize_selection_contract(&raw, &ContractOverrides::default()).unwrap()
}

/// A presenter that records every call.
#[derive(Default)]
pub struct RecordingPresenter {
    calls: RefCell<Vec<String>>,
}

impl RecordingPresenter {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.split(':').next() == Some(name)).count()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }
}

impl Presenter for RecordingPresenter {
    fn log(&self, message: &str) {
        self.record(format!("log:{message}"));
    }

    fn render(&self, _state: &DuelState) {
        self.record("render");
    }

    fn refresh_indicators(&self, _state: &DuelState) {
        self.record("refresh_indicators");
    }

    fn pause(&self, millis: u64) {
        self.record(format!("pause:{millis}"));
    }

    fn show_field_targeting_controls(&self, contract: &SelectionContract) {
        self.record(format!("show_field_targeting_controls:{}", contract.kind));
    }

    fn hide_field_targeting_controls(&self) {
        self.record("hide_field_targeting_controls");
    }

    fn show_target_selection(&self, contract: &SelectionContract) {
        self.record(format!("show_target_selection:{}", contract.kind));
    }

    fn hide_target_selection(&self) {
        self.record("hide_target_selection");
    }

    fn show_selection_confirm(&self, contract: &SelectionContract) {
        self.record(format!("show_selection_confirm:{}", contract.kind));
    }

    fn highlight_candidates(&self, cards: &[EntityId]) {
        self.record(format!("highlight_candidates:{}", cards.len()));
    }

    fn clear_highlights(&self) {
        self.record("clear_highlights");
    }

    fn show_game_over(&self, result: GameResult) {
        self.record(format!("show_game_over:{result:?}"));
    }
}

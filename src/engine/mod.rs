//! The rules engine.
//!
//! `Engine` owns the duel state together with the runtime bookkeeping the
//! rules core needs around it: the zone-operation depth counter, the event
//! bus, parked continuations, and the selection session. Collaborators
//! (effect engine, presenter) are shared `Rc` trait objects so their methods
//! can take `&mut Engine` while the engine holds them.
//!
//! Functionality is split across modules that each add an `impl Engine`
//! block:
//!
//! - `transaction`: `run_zone_op`, snapshot capture/restore
//! - `invariants`: `assert_state_invariants`
//! - `actions`: duel setup, summoning, turn changes
//! - `crate::triggers`: event emission and trigger resolution
//! - `crate::selection`: selection sessions
//! - `crate::combat`: attack availability and battle resolution

pub mod actions;
pub mod invariants;
pub mod outcome;
pub mod ownership;
pub mod transaction;

use std::rc::Rc;

use tracing::info;

use crate::combat::{PendingAttack, PendingTieDestruction};
use crate::core::{DuelConfig, DuelState};
use crate::effects::{EffectEngine, NullEffectEngine};
use crate::presenter::{NullPresenter, Presenter};
use crate::selection::{SelectionPhase, SelectionSession};
use crate::triggers::{EventBus, PendingEventSelection};

pub use invariants::{InvariantIssue, InvariantOptions, InvariantReport, IssueCode};
pub use outcome::ActionResult;
pub use ownership::{
    normalize_card_ownership, normalize_relative_player_id, normalize_zone_card_ownership,
    OwnershipContext, OwnershipMeta,
};
pub use transaction::{TransactionStats, ZoneOpMeta};

/// The rules engine for one duel.
pub struct Engine {
    /// The duel being played.
    pub duel: DuelState,

    pub(crate) effects: Rc<dyn EffectEngine>,
    pub(crate) presenter: Rc<dyn Presenter>,
    pub(crate) bus: EventBus,

    pub(crate) zone_op_depth: u32,
    pub(crate) tx_stats: TransactionStats,

    pub(crate) event_depth: u32,
    pub(crate) resolution_counter: u64,
    pub(crate) pending_event_selection: Option<PendingEventSelection>,

    pub(crate) pending_attack: Option<PendingAttack>,
    pub(crate) pending_tie_destruction: Option<PendingTieDestruction>,
    pub(crate) last_attack_negated: bool,

    pub(crate) selection_phase: SelectionPhase,
    pub(crate) active_session: Option<SelectionSession>,
}

impl Engine {
    /// Create an engine over a fresh duel.
    pub fn new(config: DuelConfig, effects: Rc<dyn EffectEngine>, presenter: Rc<dyn Presenter>) -> Self {
        Self::from_state(DuelState::new(config), effects, presenter)
    }

    /// Create an engine over an existing duel state.
    pub fn from_state(duel: DuelState, effects: Rc<dyn EffectEngine>, presenter: Rc<dyn Presenter>) -> Self {
        Self {
            duel,
            effects,
            presenter,
            bus: EventBus::default(),
            zone_op_depth: 0,
            tx_stats: TransactionStats::default(),
            event_depth: 0,
            resolution_counter: 0,
            pending_event_selection: None,
            pending_attack: None,
            pending_tie_destruction: None,
            last_attack_negated: false,
            selection_phase: SelectionPhase::Idle,
            active_session: None,
        }
    }

    /// Engine with no card effects and no presentation.
    pub fn headless(config: DuelConfig) -> Self {
        Self::new(config, Rc::new(NullEffectEngine), Rc::new(NullPresenter))
    }

    /// Replace the effect engine (builder pattern).
    #[must_use]
    pub fn with_effects(mut self, effects: Rc<dyn EffectEngine>) -> Self {
        self.effects = effects;
        self
    }

    /// Replace the presenter (builder pattern).
    #[must_use]
    pub fn with_presenter(mut self, presenter: Rc<dyn Presenter>) -> Self {
        self.presenter = presenter;
        self
    }

    /// The effect engine.
    #[must_use]
    pub fn effects(&self) -> Rc<dyn EffectEngine> {
        Rc::clone(&self.effects)
    }

    /// The presenter.
    #[must_use]
    pub fn presenter(&self) -> Rc<dyn Presenter> {
        Rc::clone(&self.presenter)
    }

    /// Write a player-facing log line.
    pub fn game_log(&self, message: &str) {
        info!(target: "duel", "{message}");
        self.presenter.log(message);
    }

    /// Set when a response negated the attack being declared.
    pub fn negate_attack(&mut self) {
        self.last_attack_negated = true;
    }

    #[must_use]
    pub fn last_attack_negated(&self) -> bool {
        self.last_attack_negated
    }

    /// Whether a question to a player is still outstanding: a parked
    /// resolution, attack or tie, or an open selection session.
    #[must_use]
    pub fn choice_pending(&self) -> bool {
        self.pending_event_selection.is_some()
            || self.pending_attack.is_some()
            || self.pending_tie_destruction.is_some()
            || self.active_session.is_some()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("turn", &self.duel.turn_number)
            .field("active_player", &self.duel.active_player)
            .field("zone_op_depth", &self.zone_op_depth)
            .field("event_depth", &self.event_depth)
            .field("selection_phase", &self.selection_phase)
            .field("pending_event_selection", &self.pending_event_selection.is_some())
            .finish_non_exhaustive()
    }
}

//! # rust-duel
//!
//! The rules core of a two-player duel card game: it moves cards between
//! zones, resolves combat, and runs triggered abilities that may stop
//! mid-resolution to ask a player something and later resume exactly where
//! they stopped.
//!
//! ## Design Principles
//!
//! 1. **Atomic zone changes**: Every multi-step mutation runs inside
//!    `Engine::run_zone_op`. The outermost call snapshots the zones, checks
//!    invariants on commit, and restores the snapshot on failure.
//!
//! 2. **Suspension is data**: A resolution waiting on a player choice is a
//!    plain, serializable record on the engine. Nothing blocks; the caller
//!    resumes it whenever the answer arrives.
//!
//! 3. **Collaborators at the seams**: What cards do (`EffectEngine`) and how
//!    things are shown (`Presenter`) are traits. The core knows neither.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: Zones are `im::Vector`s, so a snapshot
//!   shares structure with the live state instead of copying it.
//!
//! - **Per-engine state**: Pending selections, parked combat and the live
//!   selection session are fields of one `Engine`, never globals.
//!
//! ## Modules
//!
//! - `core`: Entity IDs, seats, configuration, RNG and duel state
//! - `zones`: Per-seat zone storage and snapshots
//! - `cards`: Card instances
//! - `engine`: The `Engine`, transactions, ownership, invariants, actions
//! - `triggers`: Events, the listener bus and resumable trigger resolution
//! - `effects`: The effect-engine interface and a tag-dispatched registry
//! - `selection`: Selection contracts and the session state machine
//! - `combat`: Attack availability and battle resolution
//! - `presenter`: UI hooks

pub mod core;
pub mod zones;
pub mod cards;
pub mod error;
pub mod engine;
pub mod triggers;
pub mod effects;
pub mod selection;
pub mod combat;
pub mod presenter;

// Re-export commonly used types
pub use crate::core::{
    EntityId, PlayerId, PlayerMap, PlayerRef,
    GameRng,
    DuelConfig, ZoneKind,
    DuelState, GameResult, PlayerState,
};

pub use crate::zones::{PlayerZones, ZonePosition, ZoneSnapshot};

pub use crate::cards::{BattlePosition, CardFlags, CardId, CardInstance, CardKind};

pub use crate::error::EngineError;

pub use crate::engine::{
    ActionResult, Engine,
    InvariantIssue, InvariantOptions, InvariantReport, IssueCode,
    TransactionStats, ZoneOpMeta,
};

pub use crate::triggers::{
    names, GameEvent, EventBus,
    TriggerEntry, TriggerId, TriggerCollection, CompletionHook,
    EventResolution, PendingEventSelection, ResumeContext,
};

pub use crate::effects::{
    ActivationOutcome, DestroyOutcome, DestroyRequest, EffectEngine, NullEffectEngine, TriggerContext,
    ActionRegistry, RegistryEffectEngine, WatchCondition, Watcher,
};

pub use crate::selection::{
    normalize_selection_contract, ContractOverrides,
    RawSelectionContract, RawRequirement, RawCandidate,
    SelectionContract, SelectionMap,
    ActivationContext, CardPickRequest, ClickOutcome, SelectionMode, SelectionPhase, SelectionSession, SessionRequest,
};

pub use crate::combat::{AttackAvailability, AttackMode, CombatOutcome, PendingAttack, PendingTieDestruction};

pub use crate::presenter::{NullPresenter, Presenter};

//! Target selection.
//!
//! ## Key Types
//!
//! - `RawSelectionContract`: A choice as an effect describes it
//! - `SelectionContract`: The validated, defaulted form
//! - `SelectionSession`: One live choice and its phase
//! - `SelectionMap`: An answer, requirement id to chosen candidate keys
//!
//! Contracts are presented either by clicking the board (field targeting)
//! or in a modal picker; both feed the same session state machine.

use std::collections::BTreeMap;

pub mod contract;
pub mod frontend;
pub mod session;

/// Requirement id to chosen candidate keys.
pub type SelectionMap = BTreeMap<String, Vec<String>>;

pub use contract::{
    can_use_field_targeting, candidates_from_cards, normalize_selection_contract, Candidate, ContractOverrides,
    OwnerScope, RawCandidate, RawCount, RawRequirement, RawSelectionContract, RawSelectionUi, Requirement,
    SelectionContract, SelectionUi,
};
pub use frontend::{frontend_for, FieldTargetingFrontend, ModalFrontend, SelectionFrontend};
pub use session::{
    ActivationContext, CardPickRequest, ClickOutcome, ExecuteFn, RollbackFn, SelectionMode, SelectionPhase,
    SelectionSession, SessionRequest,
};

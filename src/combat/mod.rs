//! Combat.
//!
//! - `availability`: who may attack, with which allowance, at what
//! - `resolver`: declaration, responses, battle math and the parked
//!   continuations (declared attack, tie destruction)

pub mod availability;
pub mod resolver;

pub use availability::{
    attack_availability, attack_target_candidates, check_attack_target, AttackAvailability, AttackMode,
};
pub use resolver::{CombatOutcome, FinishCombatOptions, PendingAttack, PendingTieDestruction};

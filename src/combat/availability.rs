//! Attack availability.
//!
//! A monster gets `1 + extra_attacks` ordinary attacks per turn, then one
//! more if it holds the second-attack bonus. A monster that may attack every
//! opposing monster instead stays available while some opposing monster has
//! not been hit this turn.

use serde::{Deserialize, Serialize};

use crate::cards::BattlePosition;
use crate::core::{DuelState, EntityId, ZoneKind};
use crate::engine::Engine;
use crate::selection::RawCandidate;

/// Which allowance an attack spends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackMode {
    Ordinary,
    SecondAttack,
    AttackAll,
}

/// Whether a monster can declare an attack right now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttackAvailability {
    Available(AttackMode),
    Unavailable(String),
}

impl AttackAvailability {
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, AttackAvailability::Available(_))
    }

    /// The mode, or the player-facing reason it cannot attack.
    pub fn mode(&self) -> Result<AttackMode, String> {
        match self {
            AttackAvailability::Available(mode) => Ok(*mode),
            AttackAvailability::Unavailable(reason) => Err(reason.clone()),
        }
    }
}

fn unavailable(reason: &str) -> AttackAvailability {
    AttackAvailability::Unavailable(reason.to_string())
}

/// Check whether `attacker` can declare an attack.
#[must_use]
pub fn attack_availability(state: &DuelState, attacker: EntityId) -> AttackAvailability {
    let Some(card) = state.card(attacker) else {
        return unavailable("Unknown attacker");
    };
    if !card.is_monster() {
        return unavailable("Only monsters can attack");
    }
    let Some(controller) = card.controller_id() else {
        return unavailable("Attacker has no controller");
    };
    if !state.is_in(attacker, controller, ZoneKind::Field) {
        return unavailable("Attacker is not on the field");
    }
    if state.game_over.is_some() {
        return unavailable("The duel is over");
    }
    if state.active_player != controller {
        return unavailable("It is not your turn");
    }
    if card.face_down {
        return unavailable("Face-down monsters cannot attack");
    }
    if card.flags.cannot_attack {
        return unavailable("This monster cannot attack this turn");
    }
    if card.position != BattlePosition::Attack {
        return unavailable("Monsters in defense position cannot attack");
    }

    let flags = &card.flags;
    if flags.attack_all_monsters {
        let unhit = state
            .opponent_monsters(controller)
            .iter()
            .any(|m| !flags.attacked_targets.contains(m));
        if unhit {
            return AttackAvailability::Available(AttackMode::AttackAll);
        }
        if flags.has_attacked() {
            return unavailable("This monster has already attacked every opposing monster");
        }
    }
    if flags.attacks_used < 1 + flags.extra_attacks {
        return AttackAvailability::Available(AttackMode::Ordinary);
    }
    if flags.second_attack && !flags.second_attack_used {
        return AttackAvailability::Available(AttackMode::SecondAttack);
    }
    unavailable("This monster has already attacked")
}

/// Check an attack target for an available attacker.
///
/// `None` is a direct attack.
pub fn check_attack_target(
    state: &DuelState,
    attacker: EntityId,
    mode: AttackMode,
    target: Option<EntityId>,
) -> Result<(), String> {
    let card = state.card(attacker).ok_or("Unknown attacker")?;
    let controller = card.controller_id().ok_or("Attacker has no controller")?;
    let defender = controller.opponent();

    match target {
        Some(target) => {
            if !state.is_in(target, defender, ZoneKind::Field) {
                return Err("Target is not on the opponent's field".to_string());
            }
            if mode == AttackMode::AttackAll && card.flags.attacked_targets.contains(&target) {
                return Err("This monster has already attacked that target".to_string());
            }
            Ok(())
        }
        None => {
            if card.flags.cannot_attack_directly {
                return Err("This monster cannot attack directly".to_string());
            }
            if !state.opponent_monsters(controller).is_empty() && !card.flags.direct_attack {
                return Err("Cannot attack directly while the opponent controls monsters".to_string());
            }
            Ok(())
        }
    }
}

/// Selectable targets for an attacker: opposing monsters, plus the direct
/// attack when it is allowed. Candidate keys are the card ids, `direct` for
/// the direct attack.
#[must_use]
pub fn attack_target_candidates(state: &DuelState, attacker: EntityId) -> Vec<RawCandidate> {
    let Ok(mode) = attack_availability(state, attacker).mode() else {
        return Vec::new();
    };
    let Some(controller) = state.card(attacker).and_then(|c| c.controller_id()) else {
        return Vec::new();
    };
    let defender = controller.opponent();

    let mut candidates: Vec<RawCandidate> = state
        .opponent_monsters(controller)
        .into_iter()
        .enumerate()
        .filter(|&(_, target)| check_attack_target(state, attacker, mode, Some(target)).is_ok())
        .map(|(index, target)| {
            let mut candidate = RawCandidate::card(target, ZoneKind::Field, index, defender);
            candidate.key = Some(target.raw().to_string());
            candidate.name = state.card(target).map(|c| c.name.clone());
            candidate
        })
        .collect();
    if check_attack_target(state, attacker, mode, None).is_ok() {
        candidates.push(RawCandidate::direct_attack(defender));
    }
    candidates
}

impl Engine {
    /// Check whether `attacker` can declare an attack.
    #[must_use]
    pub fn get_attack_availability(&self, attacker: EntityId) -> AttackAvailability {
        attack_availability(&self.duel, attacker)
    }

    /// Spend the allowance `mode` names. Does nothing once the attacker has
    /// left its controller's field.
    pub fn mark_attack_used(&mut self, attacker: EntityId, mode: AttackMode, target: Option<EntityId>) {
        let Some(controller) = self.duel.card(attacker).and_then(|c| c.controller_id()) else {
            return;
        };
        if !self.duel.is_in(attacker, controller, ZoneKind::Field) {
            return;
        }
        let Some(card) = self.duel.card_mut(attacker) else {
            return;
        };
        let flags = &mut card.flags;
        match (mode, target) {
            (AttackMode::Ordinary, _) | (AttackMode::AttackAll, None) => flags.attacks_used += 1,
            (AttackMode::SecondAttack, _) => flags.second_attack_used = true,
            (AttackMode::AttackAll, Some(target)) => {
                if !flags.attacked_targets.contains(&target) {
                    flags.attacked_targets.push(target);
                }
            }
        }
    }
}

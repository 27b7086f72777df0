//! Battle resolution.
//!
//! An attack runs in three steps: validate and declare, let responses to
//! the declaration resolve, then do the battle math. Destruction always goes
//! through `EffectEngine::destroy_card`, which may need a player choice. When
//! it does, combat stops and returns that need. A tie that stops on the
//! attacker's destruction parks a `PendingTieDestruction`, so that resuming
//! the choice destroys the target next without touching the attacker again.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cards::BattlePosition;
use crate::core::{EntityId, PlayerId, ZoneKind};
use crate::effects::{DestroyOutcome, DestroyRequest};
use crate::engine::{ActionResult, Engine, ZoneOpMeta};
use crate::error::EngineError;
use crate::selection::{
    ContractOverrides, RawRequirement, RawSelectionContract, SelectionContract, SelectionMode, SessionRequest,
};
use crate::triggers::{names, GameEvent};

use super::availability::{attack_target_candidates, check_attack_target, AttackMode};

/// What an attack did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CombatOutcome {
    pub result: ActionResult,
    /// A response negated the attack.
    pub negated: bool,
    /// Cards destroyed by this battle, in order.
    pub destroyed: Vec<EntityId>,
    /// Battle damage dealt, per seat.
    pub damage: Vec<(PlayerId, i64)>,
    /// Life gained from battle-heal abilities.
    pub healed: Vec<(PlayerId, i64)>,
}

impl CombatOutcome {
    fn failed(reason: impl Into<String>) -> Self {
        Self {
            result: ActionResult::fail(reason),
            ..Self::default()
        }
    }

    /// Damage dealt to `player`.
    #[must_use]
    pub fn damage_to(&self, player: PlayerId) -> i64 {
        self.damage.iter().filter(|(p, _)| *p == player).map(|(_, d)| d).sum()
    }
}

/// An attack parked while responses to its declaration wait on a choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAttack {
    pub attacker: EntityId,
    pub target: Option<EntityId>,
    pub mode: AttackMode,
}

/// The second half of a tie, parked while the attacker's destruction waits
/// on a choice.
///
/// Stats and heal flags are captured before the attacker leaves the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTieDestruction {
    pub attacker: EntityId,
    pub target: EntityId,
    pub attacker_controller: PlayerId,
    pub attack: i64,
    pub attacker_heals: bool,
    pub target_heals: bool,
}

/// Options for `finish_combat`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FinishCombatOptions {
    pub mode: AttackMode,
    /// Finish a parked tie: only the target is destroyed, and the attack is
    /// not marked used again.
    pub resume_from_tie: bool,
}

impl FinishCombatOptions {
    #[must_use]
    pub fn new(mode: AttackMode) -> Self {
        Self {
            mode,
            resume_from_tie: false,
        }
    }

    #[must_use]
    pub fn resume_tie() -> Self {
        Self {
            mode: AttackMode::Ordinary,
            resume_from_tie: true,
        }
    }
}

enum Step {
    Done,
    Paused(SelectionContract),
}

struct Combatant {
    controller: PlayerId,
    attack: i64,
    defense: i64,
    position: BattlePosition,
    piercing: bool,
    heals: bool,
}

impl Combatant {
    fn read(engine: &Engine, id: EntityId) -> Result<Self, EngineError> {
        let card = engine.duel.require_card(id)?;
        let (controller, _, _) = engine.duel.locate(id).ok_or(EngineError::NotInZone(id))?;
        Ok(Self {
            controller,
            attack: card.attack(),
            defense: card.defense(),
            position: card.position,
            piercing: card.flags.piercing,
            heals: card.flags.battle_heal,
        })
    }
}

impl Engine {
    /// Declare an attack and resolve it.
    ///
    /// `target` is `None` for a direct attack. Returns `needs_selection` in
    /// the result when a response or a destruction is waiting on a choice;
    /// the attack then finishes when that choice is resumed. Refused while
    /// another choice is still outstanding.
    pub fn resolve_combat(&mut self, attacker: EntityId, target: Option<EntityId>) -> CombatOutcome {
        if self.choice_pending() {
            return CombatOutcome::failed("A choice is still pending");
        }
        let mode = match self.get_attack_availability(attacker).mode() {
            Ok(mode) => mode,
            Err(reason) => return CombatOutcome::failed(reason),
        };
        if let Err(reason) = check_attack_target(&self.duel, attacker, mode, target) {
            return CombatOutcome::failed(reason);
        }
        let Some(player) = self.duel.card(attacker).and_then(|c| c.controller_id()) else {
            return CombatOutcome::failed("Attacker has no controller");
        };

        if let Some(card) = self.duel.card(attacker) {
            let line = match target.and_then(|t| self.duel.card(t)) {
                Some(defender) => format!("{} attacks {}.", card.name, defender.name),
                None => format!("{} attacks directly.", card.name),
            };
            self.game_log(&line);
        }

        self.last_attack_negated = false;
        let declared = self.emit(GameEvent::attack_declared(attacker, target, player));
        if !declared.ok {
            warn!(reason = ?declared.reason, "attack declaration resolved with errors");
        }

        let attack = PendingAttack { attacker, target, mode };
        if declared.needs_selection {
            debug!(%attacker, "attack parked on a response");
            self.pending_attack = Some(attack);
            let mut outcome = CombatOutcome::default();
            outcome.result.needs_selection = true;
            outcome.result.selection_contract = declared.selection_contract;
            return outcome;
        }
        self.continue_declared_attack(attack)
    }

    /// Open a selection session for choosing what `attacker` attacks. Picking
    /// resolves the attack.
    pub fn start_attack_selection(&mut self, attacker: EntityId) -> Result<SelectionMode, EngineError> {
        if let Err(reason) = self.get_attack_availability(attacker).mode() {
            return Err(EngineError::AttackUnavailable(reason));
        }
        let contract = RawSelectionContract::new("attack_target")
            .with_requirement(
                RawRequirement::new("target").with_candidates(attack_target_candidates(&self.duel, attacker)),
            )
            .with_message("Choose an attack target");

        let request = SessionRequest::new(contract, move |engine, selections| {
            let key = selections
                .get("target")
                .and_then(|keys| keys.first())
                .ok_or_else(|| EngineError::Selection("No attack target chosen".to_string()))?;
            let target = if key == "direct" {
                None
            } else {
                let raw = key
                    .parse::<u32>()
                    .map_err(|_| EngineError::Selection(format!("Invalid attack target {key}")))?;
                Some(EntityId(raw))
            };
            Ok(engine.resolve_combat(attacker, target).result)
        })
        .with_overrides(ContractOverrides {
            auto_advance: Some(true),
            ..ContractOverrides::default()
        });
        self.start_target_selection_session(request)
    }

    fn continue_declared_attack(&mut self, attack: PendingAttack) -> CombatOutcome {
        let PendingAttack { attacker, target, mode } = attack;

        if self.last_attack_negated {
            self.mark_attack_used(attacker, mode, target);
            self.game_log("The attack was negated.");
            info!(%attacker, "attack negated");
            let outcome = CombatOutcome {
                result: ActionResult::ok(),
                negated: true,
                ..CombatOutcome::default()
            };
            return self.close_combat(outcome);
        }

        let on_field = self
            .duel
            .card(attacker)
            .and_then(|c| c.controller_id())
            .is_some_and(|p| self.duel.is_in(attacker, p, ZoneKind::Field));
        if !on_field {
            return self.close_combat(CombatOutcome::failed("The attacking monster left the field"));
        }
        if let Some(target) = target {
            if self.duel.locate(target).map(|(_, zone, _)| zone) != Some(ZoneKind::Field) {
                self.mark_attack_used(attacker, mode, Some(target));
                return self.close_combat(CombatOutcome::failed("The attack target is no longer on the field"));
            }
            if let Err(err) = self.flip_attack_target(target) {
                self.mark_attack_used(attacker, mode, Some(target));
                return self.close_combat(CombatOutcome::failed(err.to_string()));
            }
        }

        self.finish_combat(attacker, target, FinishCombatOptions::new(mode))
    }

    fn flip_attack_target(&mut self, target: EntityId) -> Result<(), EngineError> {
        if !self.duel.require_card(target)?.face_down {
            return Ok(());
        }
        self.run_zone_op("flip_attack_target", ZoneOpMeta::default(), |e| {
            e.duel.require_card_mut(target)?.face_down = false;
            Ok(())
        })?;
        let name = self.duel.require_card(target)?.name.clone();
        self.game_log(&format!("{name} is flipped face-up."));
        self.presenter.pause(self.duel.config.flip_pause_ms);

        let mut event = GameEvent::new(names::CARD_FLIPPED).with_target(target);
        if let Some((holder, _, _)) = self.duel.locate(target) {
            event = event.with_player(holder);
        }
        self.notify(&event);
        Ok(())
    }

    /// Battle math between a declared attacker and its target.
    ///
    /// Every exit marks the attack used (except a resumed tie, which was
    /// marked when it paused), checks for a winner and refreshes indicators.
    pub fn finish_combat(
        &mut self,
        attacker: EntityId,
        target: Option<EntityId>,
        options: FinishCombatOptions,
    ) -> CombatOutcome {
        let mut outcome = CombatOutcome::default();
        let step = if options.resume_from_tie {
            match self.pending_tie_destruction.take() {
                Some(tie) if tie.attacker == attacker && Some(tie.target) == target => {
                    self.finish_tie(tie, &mut outcome)
                }
                Some(tie) => {
                    self.pending_tie_destruction = Some(tie);
                    Err(EngineError::Selection("Parked tie does not match this battle".to_string()))
                }
                None => Err(EngineError::Selection("No tie to resume".to_string())),
            }
        } else {
            self.battle(attacker, target, &mut outcome)
        };

        outcome.result = match step {
            Ok(Step::Done) => ActionResult::ok(),
            Ok(Step::Paused(contract)) => ActionResult::needs_selection(contract),
            Err(err) => ActionResult::from_error(&err),
        };
        if !options.resume_from_tie {
            self.mark_attack_used(attacker, options.mode, target);
        }
        self.close_combat(outcome)
    }

    fn battle(
        &mut self,
        attacker: EntityId,
        target: Option<EntityId>,
        outcome: &mut CombatOutcome,
    ) -> Result<Step, EngineError> {
        let attacking = Combatant::read(self, attacker)?;
        let Some(target) = target else {
            let defender = attacking.controller.opponent();
            self.deal_battle_damage(defender, attacker, attacking.attack, outcome);
            return Ok(Step::Done);
        };
        let defending = Combatant::read(self, target)?;

        if defending.position == BattlePosition::Defense {
            if attacking.attack > defending.defense {
                if attacking.piercing {
                    let excess = attacking.attack - defending.defense;
                    self.deal_battle_damage(defending.controller, attacker, excess, outcome);
                }
                let heal = attacking.heals.then_some((attacking.controller, defending.attack));
                return self.destroy_by_battle(target, attacker, heal, outcome);
            }
            if attacking.attack < defending.defense {
                let reflected = defending.defense - attacking.attack;
                self.deal_battle_damage(attacking.controller, target, reflected, outcome);
            }
            return Ok(Step::Done);
        }

        if attacking.attack > defending.attack {
            let diff = attacking.attack - defending.attack;
            self.deal_battle_damage(defending.controller, attacker, diff, outcome);
            let heal = attacking.heals.then_some((attacking.controller, defending.attack));
            return self.destroy_by_battle(target, attacker, heal, outcome);
        }
        if attacking.attack < defending.attack {
            let diff = defending.attack - attacking.attack;
            self.deal_battle_damage(attacking.controller, target, diff, outcome);
            let heal = defending.heals.then_some((defending.controller, attacking.attack));
            return self.destroy_by_battle(attacker, target, heal, outcome);
        }

        let tie = PendingTieDestruction {
            attacker,
            target,
            attacker_controller: attacking.controller,
            attack: attacking.attack,
            attacker_heals: attacking.heals,
            target_heals: defending.heals,
        };
        let heal = defending.heals.then_some((defending.controller, attacking.attack));
        match self.destroy_by_battle(attacker, target, heal, outcome)? {
            Step::Paused(contract) => {
                debug!(%attacker, %target, "tie parked on the attacker's destruction");
                self.pending_tie_destruction = Some(tie);
                Ok(Step::Paused(contract))
            }
            Step::Done => self.finish_tie(tie, outcome),
        }
    }

    /// Destroy the target of a tie whose attacker has already been dealt with.
    fn finish_tie(&mut self, tie: PendingTieDestruction, outcome: &mut CombatOutcome) -> Result<Step, EngineError> {
        if self.duel.locate(tie.target).map(|(_, zone, _)| zone) != Some(ZoneKind::Field) {
            debug!(target = %tie.target, "tie target already left the field");
            return Ok(Step::Done);
        }
        let heal = tie.attacker_heals.then_some((tie.attacker_controller, tie.attack));
        self.destroy_by_battle(tie.target, tie.attacker, heal, outcome)
    }

    fn destroy_by_battle(
        &mut self,
        destroyed: EntityId,
        destroyer: EntityId,
        heal: Option<(PlayerId, i64)>,
        outcome: &mut CombatOutcome,
    ) -> Result<Step, EngineError> {
        let (holder, _, _) = self.duel.locate(destroyed).ok_or(EngineError::NotInZone(destroyed))?;
        let request = DestroyRequest::battle(destroyer, Some(holder.opponent()));
        let name = self.duel.require_card(destroyed)?.name.clone();

        let effects = self.effects();
        match effects.destroy_card(self, destroyed, &request)? {
            DestroyOutcome::NeedsSelection(contract) => return Ok(Step::Paused(contract)),
            DestroyOutcome::Survived => {
                self.game_log(&format!("{name} was not destroyed."));
                return Ok(Step::Done);
            }
            DestroyOutcome::Destroyed => {}
        }

        info!(card = %destroyed, by = %destroyer, "destroyed by battle");
        self.game_log(&format!("{name} was destroyed by battle."));
        outcome.destroyed.push(destroyed);
        if let Some((player, amount)) = heal.filter(|&(_, amount)| amount > 0) {
            self.duel.gain_life(player, amount);
            outcome.healed.push((player, amount));
        }

        let resolution = self.emit(GameEvent::battle_destroy(destroyer, destroyed, holder));
        match resolution.selection_contract {
            Some(contract) if resolution.needs_selection => Ok(Step::Paused(contract)),
            _ => Ok(Step::Done),
        }
    }

    fn deal_battle_damage(&mut self, player: PlayerId, source: EntityId, amount: i64, outcome: &mut CombatOutcome) {
        if amount <= 0 {
            return;
        }
        let life = self.duel.inflict_damage(player, amount);
        info!(%player, amount, life, "battle damage");
        self.game_log(&format!("{player} takes {amount} battle damage."));
        outcome.damage.push((player, amount));
        self.notify(&GameEvent::battle_damage(player, source, amount));
    }

    fn close_combat(&mut self, outcome: CombatOutcome) -> CombatOutcome {
        if self.duel.game_over.is_none() {
            if let Some(result) = self.duel.check_win_condition() {
                info!(?result, "duel decided in battle");
                self.presenter.show_game_over(result);
            }
        }
        self.presenter.refresh_indicators(&self.duel);
        outcome
    }

    /// Continue combat parked behind a resolved choice: a declared attack
    /// first, then a tie.
    pub fn resume_parked_combat(&mut self) -> Option<CombatOutcome> {
        if self.pending_event_selection.is_some() {
            return None;
        }
        if let Some(attack) = self.pending_attack.take() {
            return Some(self.continue_declared_attack(attack));
        }
        let tie = self.pending_tie_destruction?;
        Some(self.finish_combat(tie.attacker, Some(tie.target), FinishCombatOptions::resume_tie()))
    }

    /// The parked attack, if any.
    #[must_use]
    pub fn pending_attack(&self) -> Option<&PendingAttack> {
        self.pending_attack.as_ref()
    }

    /// The parked tie, if any.
    #[must_use]
    pub fn pending_tie_destruction(&self) -> Option<&PendingTieDestruction> {
        self.pending_tie_destruction.as_ref()
    }
}

//! Player actions outside combat: setting up the duel, drawing, summoning
//! and passing the turn.
//!
//! Zone changes run through `run_zone_op`, and every action refuses to run
//! once the duel is decided.

use tracing::{debug, info};

use crate::cards::BattlePosition;
use crate::core::{EntityId, PlayerId, ZoneKind};
use crate::error::EngineError;
use crate::triggers::{names, GameEvent};
use crate::zones::ZonePosition;

use super::outcome::ActionResult;
use super::transaction::ZoneOpMeta;
use super::Engine;

impl Engine {
    /// Shuffle both decks, draw opening hands and begin the first seat's turn.
    ///
    /// A deck shorter than the opening hand is drawn out.
    pub fn start_duel(&mut self) -> Result<(), EngineError> {
        let opening = self.duel.config.opening_hand;
        self.run_zone_op("start_duel", ZoneOpMeta::default(), |e| {
            for player in PlayerId::all() {
                e.duel.shuffle_deck(player);
                let available = e.duel.zones(player).len(ZoneKind::Deck).min(opening);
                for _ in 0..available {
                    e.duel.draw_card(player)?;
                }
            }
            Ok(())
        })?;

        let first = PlayerId::new(0);
        self.duel.start_turn(first);
        self.game_log("The duel begins.");
        self.notify(&GameEvent::new(names::TURN_START).with_player(first));
        self.presenter.render(&self.duel);
        Ok(())
    }

    /// Draw one card for `player`.
    pub fn draw(&mut self, player: PlayerId) -> Result<EntityId, EngineError> {
        if self.duel.game_over.is_some() {
            return Err(EngineError::GameOver);
        }
        self.run_zone_op("draw", ZoneOpMeta::default(), |e| e.duel.draw_card(player))
    }

    /// Summon a monster from its controller's hand to the field.
    ///
    /// A face-up summon announces `after_summon`; if a response to it needs
    /// a choice, the result carries the contract. Refused while a choice is
    /// still outstanding.
    pub fn normal_summon(&mut self, card: EntityId, position: BattlePosition, face_down: bool) -> ActionResult {
        if self.duel.game_over.is_some() {
            return ActionResult::from_error(&EngineError::GameOver);
        }
        if self.choice_pending() {
            return ActionResult::fail("A choice is still pending");
        }
        let player = self.duel.active_player;
        if !self.duel.is_in(card, player, ZoneKind::Hand) {
            return ActionResult::fail("That card is not in your hand");
        }
        match self.duel.card(card) {
            Some(instance) if instance.is_monster() => {}
            _ => return ActionResult::fail("Only monsters can be summoned"),
        }

        let summoned = self.run_zone_op("normal_summon", ZoneOpMeta::default(), |e| {
            e.duel.move_card(card, player, ZoneKind::Field, ZonePosition::Top)?;
            let instance = e.duel.require_card_mut(card)?;
            instance.position = position;
            instance.face_down = face_down;
            Ok(())
        });
        if let Err(err) = summoned {
            debug!(%card, error = %err, "summon failed");
            return ActionResult::from_error(&err);
        }

        if face_down {
            self.game_log(&format!("{player} sets a monster."));
            self.presenter.render(&self.duel);
            return ActionResult::ok();
        }

        if let Some(instance) = self.duel.card(card) {
            let line = format!("{player} summons {}.", instance.name);
            self.game_log(&line);
        }
        self.presenter.render(&self.duel);

        let resolution = self.emit(GameEvent::after_summon(card, player, ZoneKind::Hand));
        match resolution.selection_contract {
            Some(contract) if resolution.needs_selection => ActionResult::needs_selection(contract),
            _ => ActionResult::ok(),
        }
    }

    /// Pass the turn to the other seat, which then draws.
    ///
    /// Refused while a choice is still outstanding.
    pub fn end_turn(&mut self) -> ActionResult {
        if self.duel.game_over.is_some() {
            return ActionResult::from_error(&EngineError::GameOver);
        }
        if self.choice_pending() {
            return ActionResult::fail("A choice is still pending");
        }

        let next = self.duel.active_player.opponent();
        self.duel.start_turn(next);
        info!(player = %next, turn = self.duel.turn_number, "turn started");
        self.game_log(&format!("Turn {}: {next}.", self.duel.turn_number));

        if let Err(err) = self.draw(next) {
            debug!(player = %next, error = %err, "no turn draw");
        }
        self.notify(&GameEvent::new(names::TURN_START).with_player(next));
        self.presenter.refresh_indicators(&self.duel);
        ActionResult::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardId, CardInstance};
    use crate::core::DuelConfig;
    use std::cell::Cell;
    use std::rc::Rc;

    fn p0() -> PlayerId {
        PlayerId::new(0)
    }

    fn monster(engine: &mut Engine, owner: PlayerId, zone: ZoneKind) -> EntityId {
        let card = CardInstance::monster(EntityId(0), CardId::new(1), "Recruit", owner, 1000, 1000);
        engine.duel.spawn_card(card, owner, zone).unwrap()
    }

    #[test]
    fn test_start_duel_draws_opening_hands() {
        let mut engine = Engine::headless(DuelConfig::default().with_opening_hand(3));
        for player in PlayerId::all() {
            for _ in 0..5 {
                monster(&mut engine, player, ZoneKind::Deck);
            }
        }

        engine.start_duel().unwrap();

        for player in PlayerId::all() {
            assert_eq!(engine.duel.zones(player).len(ZoneKind::Hand), 3);
            assert_eq!(engine.duel.zones(player).len(ZoneKind::Deck), 2);
        }
        assert_eq!(engine.duel.active_player, p0());
    }

    #[test]
    fn test_normal_summon() {
        let mut engine = Engine::headless(DuelConfig::default());
        let card = monster(&mut engine, p0(), ZoneKind::Hand);
        let seen = Rc::new(Cell::new(false));
        let flag = Rc::clone(&seen);
        engine.on(names::AFTER_SUMMON, move |_, event| {
            flag.set(event.source.is_some());
            Ok(())
        });

        let result = engine.normal_summon(card, BattlePosition::Attack, false);

        assert!(result.success);
        assert!(seen.get());
        assert!(engine.duel.is_in(card, p0(), ZoneKind::Field));
    }

    #[test]
    fn test_summon_into_full_field_rolls_back() {
        let mut engine = Engine::headless(DuelConfig::default().with_capacities(1, 5));
        monster(&mut engine, p0(), ZoneKind::Field);
        let card = monster(&mut engine, p0(), ZoneKind::Hand);

        let result = engine.normal_summon(card, BattlePosition::Defense, true);

        assert!(!result.success);
        assert_eq!(result.reason.as_deref(), Some("Field is full"));
        assert!(result.rolled_back);
        assert!(engine.duel.is_in(card, p0(), ZoneKind::Hand));
    }

    #[test]
    fn test_end_turn_draws_for_next_seat() {
        let mut engine = Engine::headless(DuelConfig::default());
        let p1 = PlayerId::new(1);
        monster(&mut engine, p1, ZoneKind::Deck);

        assert!(engine.end_turn().success);

        assert_eq!(engine.duel.active_player, p1);
        assert_eq!(engine.duel.turn_number, 2);
        assert_eq!(engine.duel.zones(p1).len(ZoneKind::Hand), 1);
    }
}

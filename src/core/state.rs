//! Duel state: seats, zones and the card store.
//!
//! ## DuelState
//!
//! - Both seats (life total, zones)
//! - The card store, keyed by `EntityId`
//! - Turn bookkeeping and the game result
//! - Per-seat deterministic RNG streams for deck shuffles
//!
//! Zone operations here are the primitive, unguarded moves. Anything a card
//! effect triggers should run them inside `Engine::run_zone_op` so a failure
//! rolls back cleanly.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::{DuelConfig, ZoneKind};
use super::entity::EntityId;
use super::player::{PlayerId, PlayerMap, PlayerRef};
use super::rng::GameRng;
use crate::cards::{CardInstance, CardKind};
use crate::error::EngineError;
use crate::zones::{PlayerZones, ZonePosition};

/// Result of a finished duel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// Single winner.
    Winner(PlayerId),
    /// Both life totals reached zero together.
    Draw,
}

impl GameResult {
    /// Check if a player won.
    #[must_use]
    pub fn is_winner(&self, player: PlayerId) -> bool {
        matches!(self, GameResult::Winner(p) if *p == player)
    }
}

/// One seat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,
    pub name: String,
    pub life: i64,
    pub zones: PlayerZones,
}

/// Full duel state.
#[derive(Clone, Debug)]
pub struct DuelState {
    /// Limits and defaults.
    pub config: DuelConfig,

    /// Both seats.
    pub players: PlayerMap<PlayerState>,

    /// Card instances by entity ID.
    pub cards: FxHashMap<EntityId, CardInstance>,

    /// Turn number (starts at 1).
    pub turn_number: u32,

    /// Whose turn it is.
    pub active_player: PlayerId,

    /// Set once a win condition is met.
    pub game_over: Option<GameResult>,

    rngs: PlayerMap<GameRng>,
    next_entity_id: u32,
}

impl DuelState {
    /// Create an empty duel.
    #[must_use]
    pub fn new(config: DuelConfig) -> Self {
        let root = GameRng::new(config.seed);
        Self {
            players: PlayerMap::new(|id| PlayerState {
                id,
                name: format!("Player {}", id.0 + 1),
                life: config.starting_life,
                zones: PlayerZones::new(),
            }),
            cards: FxHashMap::default(),
            turn_number: 1,
            active_player: PlayerId::new(0),
            game_over: None,
            rngs: PlayerMap::new(|id| root.for_context(&format!("deck:{}", id.0))),
            next_entity_id: EntityId::FIRST_CARD,
            config,
        }
    }

    // === Seats ===

    #[must_use]
    pub fn player(&self, id: PlayerId) -> &PlayerState {
        &self.players[id]
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut PlayerState {
        &mut self.players[id]
    }

    #[must_use]
    pub fn zones(&self, id: PlayerId) -> &PlayerZones {
        &self.players[id].zones
    }

    pub fn zones_mut(&mut self, id: PlayerId) -> &mut PlayerZones {
        &mut self.players[id].zones
    }

    // === Cards ===

    /// Allocate a new entity ID.
    pub fn alloc_entity(&mut self) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    /// Put a new card into the store and into a zone.
    ///
    /// The card receives a fresh entity id, which is returned.
    pub fn spawn_card(
        &mut self,
        mut card: CardInstance,
        player: PlayerId,
        zone: ZoneKind,
    ) -> Result<EntityId, EngineError> {
        self.check_placement(&card, zone)?;
        self.check_capacity(player, zone)?;
        let id = self.alloc_entity();
        card.entity_id = id;
        if zone.is_board_visible() {
            card.controller = PlayerRef::Absolute(player);
        }
        self.cards.insert(id, card);
        self.zones_mut(player).insert(zone, id, ZonePosition::Top);
        Ok(id)
    }

    #[must_use]
    pub fn card(&self, id: EntityId) -> Option<&CardInstance> {
        self.cards.get(&id)
    }

    pub fn card_mut(&mut self, id: EntityId) -> Option<&mut CardInstance> {
        self.cards.get_mut(&id)
    }

    /// Get a card or fail with `UnknownCard`.
    pub fn require_card(&self, id: EntityId) -> Result<&CardInstance, EngineError> {
        self.cards.get(&id).ok_or(EngineError::UnknownCard(id))
    }

    /// Get a card mutably or fail with `UnknownCard`.
    pub fn require_card_mut(&mut self, id: EntityId) -> Result<&mut CardInstance, EngineError> {
        self.cards.get_mut(&id).ok_or(EngineError::UnknownCard(id))
    }

    // === Zones ===

    /// Find which seat and zone hold a card.
    #[must_use]
    pub fn locate(&self, card: EntityId) -> Option<(PlayerId, ZoneKind, usize)> {
        self.players
            .iter()
            .find_map(|(id, p)| p.zones.position_of(card).map(|(zone, index)| (id, zone, index)))
    }

    /// Check whether a card is on `player`'s side in `zone`.
    #[must_use]
    pub fn is_in(&self, card: EntityId, player: PlayerId, zone: ZoneKind) -> bool {
        matches!(self.locate(card), Some((p, z, _)) if p == player && z == zone)
    }

    /// Fail with `ZoneFull` if `zone` cannot take another card.
    pub fn check_capacity(&self, player: PlayerId, zone: ZoneKind) -> Result<(), EngineError> {
        match self.config.capacity(zone) {
            Some(limit) if self.zones(player).len(zone) >= limit => {
                Err(EngineError::ZoneFull(zone, player))
            }
            _ => Ok(()),
        }
    }

    fn check_placement(&self, card: &CardInstance, zone: ZoneKind) -> Result<(), EngineError> {
        let allowed = match zone {
            ZoneKind::Field => card.kind == CardKind::Monster,
            ZoneKind::SpellTrap => matches!(card.kind, CardKind::Spell | CardKind::Trap),
            ZoneKind::FieldSpell => card.kind == CardKind::FieldSpell,
            _ => true,
        };
        if allowed {
            Ok(())
        } else {
            Err(EngineError::InvalidPlacement { card: card.entity_id, zone })
        }
    }

    /// Move a card to `to_player`'s `to_zone`.
    ///
    /// Returns where the card came from. The moved card comes under
    /// `to_player`'s control; cards leaving the board for any other zone lose
    /// their board state.
    pub fn move_card(
        &mut self,
        card: EntityId,
        to_player: PlayerId,
        to_zone: ZoneKind,
        position: ZonePosition,
    ) -> Result<(PlayerId, ZoneKind), EngineError> {
        let (from_player, from_zone, _) = self.locate(card).ok_or(EngineError::NotInZone(card))?;
        self.check_placement(self.require_card(card)?, to_zone)?;
        if (from_player, from_zone) != (to_player, to_zone) {
            self.check_capacity(to_player, to_zone)?;
        }

        self.zones_mut(from_player).remove(card);
        self.zones_mut(to_player).insert(to_zone, card, position);

        let leaving_board = from_zone.is_board_visible() && !to_zone.is_board_visible();
        if leaving_board {
            self.detach_equip(card);
        }
        let instance = self.require_card_mut(card)?;
        instance.controller = PlayerRef::Absolute(to_player);
        if leaving_board {
            instance.leave_field();
        }

        debug!(%card, from = %from_zone, to = %to_zone, "moved card");
        Ok((from_player, from_zone))
    }

    fn detach_equip(&mut self, equip: EntityId) {
        for host in self.cards.values_mut() {
            host.equips.retain(|&e| e != equip);
        }
    }

    /// Send a card to its owner's graveyard.
    pub fn send_to_graveyard(&mut self, card: EntityId) -> Result<(PlayerId, ZoneKind), EngineError> {
        let (holder, _, _) = self.locate(card).ok_or(EngineError::NotInZone(card))?;
        let owner = self.require_card(card)?.owner_id().unwrap_or(holder);
        self.move_card(card, owner, ZoneKind::Graveyard, ZonePosition::Top)
    }

    /// Draw the top card of a seat's deck into its hand.
    pub fn draw_card(&mut self, player: PlayerId) -> Result<EntityId, EngineError> {
        let card = self
            .zones_mut(player)
            .pop_top(ZoneKind::Deck)
            .ok_or(EngineError::DeckEmpty(player))?;
        self.zones_mut(player).insert(ZoneKind::Hand, card, ZonePosition::Top);
        Ok(card)
    }

    /// Shuffle a seat's deck with that seat's RNG stream.
    pub fn shuffle_deck(&mut self, player: PlayerId) {
        let mut order: Vec<EntityId> = self.zones(player).deck.iter().copied().collect();
        self.rngs[player].shuffle(&mut order);
        self.zones_mut(player).deck = order.into_iter().collect();
    }

    /// Monsters on the opposing field, in slot order.
    #[must_use]
    pub fn opponent_monsters(&self, player: PlayerId) -> Vec<EntityId> {
        self.zones(player.opponent()).cards_in(ZoneKind::Field)
    }

    // === Life ===

    /// Reduce a seat's life total, flooring at zero. Returns the new total.
    pub fn inflict_damage(&mut self, player: PlayerId, amount: i64) -> i64 {
        let state = self.player_mut(player);
        state.life = (state.life - amount.max(0)).max(0);
        state.life
    }

    /// Increase a seat's life total. Returns the new total.
    pub fn gain_life(&mut self, player: PlayerId, amount: i64) -> i64 {
        let state = self.player_mut(player);
        state.life += amount.max(0);
        state.life
    }

    // === Turns ===

    /// Begin `player`'s turn: advance the counter and clear per-turn flags.
    pub fn start_turn(&mut self, player: PlayerId) {
        if player != self.active_player {
            self.turn_number += 1;
        }
        self.active_player = player;
        for card in self.cards.values_mut() {
            card.flags.reset_turn();
        }
    }

    /// Record a result once a life total reaches zero.
    pub fn check_win_condition(&mut self) -> Option<GameResult> {
        if self.game_over.is_some() {
            return self.game_over;
        }
        let p0 = PlayerId::new(0);
        let p1 = PlayerId::new(1);
        let result = match (self.player(p0).life <= 0, self.player(p1).life <= 0) {
            (true, true) => Some(GameResult::Draw),
            (true, false) => Some(GameResult::Winner(p1)),
            (false, true) => Some(GameResult::Winner(p0)),
            (false, false) => None,
        };
        self.game_over = result;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardId;

    fn p0() -> PlayerId {
        PlayerId::new(0)
    }

    fn monster(attack: i64) -> CardInstance {
        CardInstance::monster(EntityId(0), CardId::new(1), "Test Monster", p0(), attack, 1000)
    }

    #[test]
    fn test_new_state() {
        let state = DuelState::new(DuelConfig::default());

        assert_eq!(state.player(p0()).life, 8000);
        assert_eq!(state.turn_number, 1);
        assert_eq!(state.active_player, p0());
        assert!(state.cards.is_empty());
    }

    #[test]
    fn test_spawn_and_locate() {
        let mut state = DuelState::new(DuelConfig::default());
        let id = state.spawn_card(monster(1000), p0(), ZoneKind::Hand).unwrap();

        assert_eq!(id, EntityId(EntityId::FIRST_CARD));
        assert_eq!(state.card(id).unwrap().entity_id, id);
        assert_eq!(state.locate(id), Some((p0(), ZoneKind::Hand, 0)));
    }

    #[test]
    fn test_field_capacity() {
        let config = DuelConfig::default().with_capacities(1, 1);
        let mut state = DuelState::new(config);
        let a = state.spawn_card(monster(1000), p0(), ZoneKind::Hand).unwrap();
        let b = state.spawn_card(monster(1000), p0(), ZoneKind::Hand).unwrap();

        state.move_card(a, p0(), ZoneKind::Field, ZonePosition::Top).unwrap();
        let err = state.move_card(b, p0(), ZoneKind::Field, ZonePosition::Top).unwrap_err();

        assert_eq!(err.to_string(), "Field is full");
        assert!(state.is_in(b, p0(), ZoneKind::Hand));
    }

    #[test]
    fn test_invalid_placement() {
        let mut state = DuelState::new(DuelConfig::default());
        let spell = CardInstance::new(EntityId(0), CardId::new(2), "Spell", CardKind::Spell, p0());
        let id = state.spawn_card(spell, p0(), ZoneKind::Hand).unwrap();

        let err = state.move_card(id, p0(), ZoneKind::Field, ZonePosition::Top).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPlacement { .. }));
    }

    #[test]
    fn test_leaving_field_resets_board_state() {
        let mut state = DuelState::new(DuelConfig::default());
        let id = state.spawn_card(monster(1000), p0(), ZoneKind::Field).unwrap();
        state.card_mut(id).unwrap().flags.attacks_used = 1;
        state.card_mut(id).unwrap().face_down = true;

        state.send_to_graveyard(id).unwrap();

        let card = state.card(id).unwrap();
        assert!(state.is_in(id, p0(), ZoneKind::Graveyard));
        assert_eq!(card.flags.attacks_used, 0);
        assert!(!card.face_down);
    }

    #[test]
    fn test_control_change_move() {
        let mut state = DuelState::new(DuelConfig::default());
        let p1 = PlayerId::new(1);
        let id = state.spawn_card(monster(1000), p0(), ZoneKind::Field).unwrap();

        state.move_card(id, p1, ZoneKind::Field, ZonePosition::Top).unwrap();

        let card = state.card(id).unwrap();
        assert_eq!(card.controller_id(), Some(p1));
        assert_eq!(card.owner_id(), Some(p0()));
    }

    #[test]
    fn test_draw_and_shuffle() {
        let mut state = DuelState::new(DuelConfig::default().with_seed(9));
        let mut ids = Vec::new();
        for _ in 0..10 {
            ids.push(state.spawn_card(monster(100), p0(), ZoneKind::Deck).unwrap());
        }

        state.shuffle_deck(p0());
        assert_eq!(state.zones(p0()).len(ZoneKind::Deck), 10);

        let top = *state.zones(p0()).deck.last().unwrap();
        assert_eq!(state.draw_card(p0()).unwrap(), top);
        assert!(state.is_in(top, p0(), ZoneKind::Hand));

        let empty = PlayerId::new(1);
        assert_eq!(state.draw_card(empty), Err(EngineError::DeckEmpty(empty)));
    }

    #[test]
    fn test_life_and_win_condition() {
        let mut state = DuelState::new(DuelConfig::default().with_starting_life(1000));
        let p1 = PlayerId::new(1);

        assert_eq!(state.inflict_damage(p1, 600), 400);
        assert_eq!(state.check_win_condition(), None);

        assert_eq!(state.inflict_damage(p1, 600), 0);
        assert_eq!(state.check_win_condition(), Some(GameResult::Winner(p0())));
        assert!(state.game_over.unwrap().is_winner(p0()));
    }

    #[test]
    fn test_start_turn_resets_flags() {
        let mut state = DuelState::new(DuelConfig::default());
        let id = state.spawn_card(monster(1000), p0(), ZoneKind::Field).unwrap();
        state.card_mut(id).unwrap().flags.attacks_used = 1;

        state.start_turn(PlayerId::new(1));

        assert_eq!(state.turn_number, 2);
        assert_eq!(state.active_player, PlayerId::new(1));
        assert_eq!(state.card(id).unwrap().flags.attacks_used, 0);
    }
}

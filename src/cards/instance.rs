//! Card instances - runtime card state.
//!
//! `CardInstance` is the one live object per physical card. It carries every
//! mutable field a rollback must be able to restore: ownership, face and
//! battle position, stats and their temporary deltas, per-turn flags,
//! counters and equip attachments.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::entity::EntityId;
use crate::core::player::{PlayerId, PlayerRef};

/// Catalog identifier (which printed card this is).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl CardId {
    /// Create a new catalog ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Broad card category. Decides which zones a card may be played to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Monster,
    Spell,
    Trap,
    FieldSpell,
}

/// Battle position of a monster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattlePosition {
    #[default]
    Attack,
    Defense,
}

/// Battle-related flags.
///
/// Usage counters and temporary deltas are cleared every turn; granted
/// abilities (piercing, attack-all, second attack, battle heal) persist until
/// the card leaves the field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFlags {
    /// Ordinary attacks declared this turn.
    pub attacks_used: u32,
    /// Ordinary attacks allowed per turn beyond the first.
    pub extra_attacks: u32,
    /// May attack once more after ordinary attacks are spent.
    pub second_attack: bool,
    /// The second-attack bonus has been spent this turn.
    pub second_attack_used: bool,
    /// May attack every opposing monster once per turn.
    pub attack_all_monsters: bool,
    /// Opposing monsters already hit this turn in attack-all mode.
    pub attacked_targets: Vec<EntityId>,
    /// Cannot declare an attack this turn.
    pub cannot_attack: bool,
    /// Cannot attack the opponent directly.
    pub cannot_attack_directly: bool,
    /// May attack directly even while the opponent controls monsters.
    pub direct_attack: bool,
    /// Inflicts piercing damage against defense-position monsters.
    pub piercing: bool,
    /// Controller gains life equal to the ATK of a monster this card
    /// destroys by battle.
    pub battle_heal: bool,
    /// Temporary ATK modifier, cleared at turn start.
    pub attack_delta: i64,
    /// Temporary DEF modifier, cleared at turn start.
    pub defense_delta: i64,
}

impl CardFlags {
    /// Clear everything that only lasts for one turn.
    pub fn reset_turn(&mut self) {
        self.attacks_used = 0;
        self.second_attack_used = false;
        self.attacked_targets.clear();
        self.cannot_attack = false;
        self.attack_delta = 0;
        self.defense_delta = 0;
    }

    /// Whether any attack has been declared with this card this turn.
    #[must_use]
    pub fn has_attacked(&self) -> bool {
        self.attacks_used > 0 || self.second_attack_used || !self.attacked_targets.is_empty()
    }
}

/// A card instance in a duel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInstance {
    /// Unique entity ID for this instance.
    pub entity_id: EntityId,

    /// Catalog reference.
    pub card_id: CardId,

    /// Display name, used in logs.
    pub name: String,

    /// Card category.
    pub kind: CardKind,

    /// Owner (who started with this card).
    pub owner: PlayerRef,

    /// Controller. Diverges from owner under control-change effects.
    pub controller: PlayerRef,

    /// Is this card face-down?
    pub face_down: bool,

    /// Battle position (meaningful for monsters).
    pub position: BattlePosition,

    /// Printed ATK.
    pub base_attack: i64,

    /// Printed DEF.
    pub base_defense: i64,

    /// Battle flags and per-turn usage.
    #[serde(default)]
    pub flags: CardFlags,

    /// Counters as a keyed multiset.
    #[serde(default)]
    pub counters: FxHashMap<String, u32>,

    /// Cards equipped to this one.
    #[serde(default)]
    pub equips: Vec<EntityId>,

    /// Game-specific integer state the core does not interpret.
    #[serde(default)]
    pub state: FxHashMap<String, i64>,
}

impl CardInstance {
    /// Create a face-up, attack-position card owned and controlled by `owner`.
    #[must_use]
    pub fn new(
        entity_id: EntityId,
        card_id: CardId,
        name: impl Into<String>,
        kind: CardKind,
        owner: PlayerId,
    ) -> Self {
        Self {
            entity_id,
            card_id,
            name: name.into(),
            kind,
            owner: PlayerRef::Absolute(owner),
            controller: PlayerRef::Absolute(owner),
            face_down: false,
            position: BattlePosition::Attack,
            base_attack: 0,
            base_defense: 0,
            flags: CardFlags::default(),
            counters: FxHashMap::default(),
            equips: Vec::new(),
            state: FxHashMap::default(),
        }
    }

    /// Create a monster with printed stats.
    #[must_use]
    pub fn monster(
        entity_id: EntityId,
        card_id: CardId,
        name: impl Into<String>,
        owner: PlayerId,
        attack: i64,
        defense: i64,
    ) -> Self {
        let mut card = Self::new(entity_id, card_id, name, CardKind::Monster, owner);
        card.base_attack = attack;
        card.base_defense = defense;
        card
    }

    /// Set the battle position (builder pattern).
    #[must_use]
    pub fn in_position(mut self, position: BattlePosition) -> Self {
        self.position = position;
        self
    }

    /// Set face-down (builder pattern).
    #[must_use]
    pub fn face_down(mut self) -> Self {
        self.face_down = true;
        self
    }

    /// Current ATK, never below zero.
    #[must_use]
    pub fn attack(&self) -> i64 {
        (self.base_attack + self.flags.attack_delta).max(0)
    }

    /// Current DEF, never below zero.
    #[must_use]
    pub fn defense(&self) -> i64 {
        (self.base_defense + self.flags.defense_delta).max(0)
    }

    #[must_use]
    pub fn is_monster(&self) -> bool {
        self.kind == CardKind::Monster
    }

    /// Resolved owner seat, if the field holds a concrete seat.
    #[must_use]
    pub fn owner_id(&self) -> Option<PlayerId> {
        self.owner.absolute()
    }

    /// Resolved controller seat, if the field holds a concrete seat.
    #[must_use]
    pub fn controller_id(&self) -> Option<PlayerId> {
        self.controller.absolute()
    }

    /// Number of counters of a kind.
    #[must_use]
    pub fn counter(&self, kind: &str) -> u32 {
        self.counters.get(kind).copied().unwrap_or(0)
    }

    /// Add counters of a kind.
    pub fn add_counters(&mut self, kind: impl Into<String>, amount: u32) {
        *self.counters.entry(kind.into()).or_insert(0) += amount;
    }

    /// Remove up to `amount` counters. Returns how many were removed.
    pub fn remove_counters(&mut self, kind: &str, amount: u32) -> u32 {
        let Some(current) = self.counters.get_mut(kind) else {
            return 0;
        };
        let removed = amount.min(*current);
        *current -= removed;
        if *current == 0 {
            self.counters.remove(kind);
        }
        removed
    }

    /// Get a state value with a default.
    #[must_use]
    pub fn get_state(&self, key: &str, default: i64) -> i64 {
        self.state.get(key).copied().unwrap_or(default)
    }

    /// Set a state value.
    pub fn set_state(&mut self, key: impl Into<String>, value: i64) {
        self.state.insert(key.into(), value);
    }

    /// Reset everything that only exists while the card is on the field.
    ///
    /// Called when a card moves from the field or spell/trap zone to any
    /// zone that is not on the board.
    pub fn leave_field(&mut self) {
        self.flags = CardFlags::default();
        self.face_down = false;
        self.position = BattlePosition::Attack;
        self.counters.clear();
        self.equips.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> CardInstance {
        CardInstance::monster(EntityId(10), CardId::new(1), "Warrior", PlayerId::new(0), 1800, 1200)
    }

    #[test]
    fn test_new_card_defaults() {
        let card = card();
        assert_eq!(card.owner_id(), Some(PlayerId::new(0)));
        assert_eq!(card.controller_id(), Some(PlayerId::new(0)));
        assert_eq!(card.position, BattlePosition::Attack);
        assert!(!card.face_down);
        assert!(card.is_monster());
    }

    #[test]
    fn test_stat_deltas_floor_at_zero() {
        let mut card = card();
        card.flags.attack_delta = 500;
        assert_eq!(card.attack(), 2300);

        card.flags.defense_delta = -5000;
        assert_eq!(card.defense(), 0);
    }

    #[test]
    fn test_counters_multiset() {
        let mut card = card();
        card.add_counters("spell", 2);
        card.add_counters("spell", 1);
        assert_eq!(card.counter("spell"), 3);

        assert_eq!(card.remove_counters("spell", 5), 3);
        assert_eq!(card.counter("spell"), 0);
        assert!(card.counters.is_empty());
        assert_eq!(card.remove_counters("missing", 1), 0);
    }

    #[test]
    fn test_reset_turn_keeps_granted_abilities() {
        let mut card = card();
        card.flags.attacks_used = 1;
        card.flags.piercing = true;
        card.flags.attacked_targets.push(EntityId(20));
        card.flags.attack_delta = 300;

        card.flags.reset_turn();

        assert_eq!(card.flags.attacks_used, 0);
        assert!(card.flags.attacked_targets.is_empty());
        assert_eq!(card.flags.attack_delta, 0);
        assert!(card.flags.piercing);
    }

    #[test]
    fn test_leave_field_clears_board_state() {
        let mut card = card().in_position(BattlePosition::Defense).face_down();
        card.flags.piercing = true;
        card.add_counters("wedge", 1);
        card.equips.push(EntityId(30));

        card.leave_field();

        assert!(!card.face_down);
        assert_eq!(card.position, BattlePosition::Attack);
        assert!(!card.flags.piercing);
        assert!(card.counters.is_empty());
        assert!(card.equips.is_empty());
    }
}

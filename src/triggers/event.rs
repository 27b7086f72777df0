//! Game event types.
//!
//! Events represent things that happen during a duel. An event is a name
//! plus contextual data. The engine emits a handful of built-in events (see
//! `names`); card scripts may emit any other name.

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, PlayerId, ZoneKind};

/// Names of the events the engine itself emits.
pub mod names {
    /// An attack was declared. Source is the attacker, target the attacked
    /// monster (absent for direct attacks), player the attacking seat.
    pub const ATTACK_DECLARED: &str = "attack_declared";
    /// A monster was destroyed by battle. Source is the destroyer, target the
    /// destroyed monster.
    pub const BATTLE_DESTROY: &str = "battle_destroy";
    /// A monster was summoned. Source is the monster, player its controller.
    pub const AFTER_SUMMON: &str = "after_summon";
    /// A face-down card was flipped face-up.
    pub const CARD_FLIPPED: &str = "card_flipped";
    /// Battle damage was dealt. Player is the damaged seat, value 0 the amount.
    pub const BATTLE_DAMAGE: &str = "battle_damage";
    /// A card was destroyed and sent to the graveyard.
    pub const CARD_DESTROYED: &str = "card_destroyed";
    /// A seat's turn began.
    pub const TURN_START: &str = "turn_start";

    /// Events after which the defending seat gets a trap window.
    pub const TRAP_WINDOW_EVENTS: [&str; 2] = [AFTER_SUMMON, ATTACK_DECLARED];
}

/// A game event with contextual data.
///
/// ## Event Data
///
/// - `name`: What kind of event this is
/// - `source`: The entity that caused the event (if any)
/// - `target`: The entity affected by the event (if any)
/// - `player`: The seat associated with the event (if any)
/// - `values`: Numeric values (damage amount, etc.)
/// - `zones`: Zone information (source zone, destination zone)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// The event name.
    pub name: String,

    /// The entity that caused/initiated the event.
    pub source: Option<EntityId>,

    /// The entity that was affected by the event.
    pub target: Option<EntityId>,

    /// The seat associated with the event.
    pub player: Option<PlayerId>,

    /// Numeric values associated with the event.
    pub values: Vec<i64>,

    /// Zone information (source zone, destination zone, etc.).
    pub zones: Vec<ZoneKind>,

    /// String keys for custom event data.
    pub tags: Vec<String>,
}

impl GameEvent {
    /// Create a new event with just a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            target: None,
            player: None,
            values: Vec::new(),
            zones: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Set the source entity (builder pattern).
    #[must_use]
    pub fn with_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the target entity (builder pattern).
    #[must_use]
    pub fn with_target(mut self, target: EntityId) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the target entity if there is one (builder pattern).
    #[must_use]
    pub fn with_optional_target(mut self, target: Option<EntityId>) -> Self {
        self.target = target;
        self
    }

    /// Set the associated seat (builder pattern).
    #[must_use]
    pub fn with_player(mut self, player: PlayerId) -> Self {
        self.player = Some(player);
        self
    }

    /// Add a numeric value (builder pattern).
    #[must_use]
    pub fn with_value(mut self, value: i64) -> Self {
        self.values.push(value);
        self
    }

    /// Add zone information (builder pattern).
    #[must_use]
    pub fn with_zone(mut self, zone: ZoneKind) -> Self {
        self.zones.push(zone);
        self
    }

    /// Add a tag (builder pattern).
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Get a value by index, or a default.
    #[must_use]
    pub fn value(&self, index: usize, default: i64) -> i64 {
        self.values.get(index).copied().unwrap_or(default)
    }

    /// Get a zone by index, or None.
    #[must_use]
    pub fn zone(&self, index: usize) -> Option<ZoneKind> {
        self.zones.get(index).copied()
    }

    /// Check if event has a specific tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Check the event name.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }
}

/// Builders for the engine's own events.
impl GameEvent {
    /// An attack declaration.
    pub fn attack_declared(attacker: EntityId, target: Option<EntityId>, player: PlayerId) -> Self {
        Self::new(names::ATTACK_DECLARED)
            .with_source(attacker)
            .with_optional_target(target)
            .with_player(player)
    }

    /// A battle destruction.
    pub fn battle_destroy(destroyer: EntityId, destroyed: EntityId, player: PlayerId) -> Self {
        Self::new(names::BATTLE_DESTROY)
            .with_source(destroyer)
            .with_target(destroyed)
            .with_player(player)
    }

    /// A summon.
    pub fn after_summon(card: EntityId, controller: PlayerId, from: ZoneKind) -> Self {
        Self::new(names::AFTER_SUMMON)
            .with_source(card)
            .with_player(controller)
            .with_zone(from)
            .with_zone(ZoneKind::Field)
    }

    /// Battle damage to a seat.
    ///
    /// Values[0] = damage amount
    pub fn battle_damage(player: PlayerId, source: EntityId, amount: i64) -> Self {
        Self::new(names::BATTLE_DAMAGE)
            .with_player(player)
            .with_source(source)
            .with_value(amount)
    }
}

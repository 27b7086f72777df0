//! Duel configuration types.
//!
//! - `ZoneKind`: The fixed set of zones every seat owns
//! - `DuelConfig`: Limits and defaults the engine reads at runtime
//!
//! Capacities and life totals are configuration, not constants, so a
//! variant ruleset (or a test) can tighten them without touching the engine.

use serde::{Deserialize, Serialize};

/// Zone identifier.
///
/// Six ordered zones plus the singleton field-spell slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    Hand,
    Field,
    #[serde(alias = "spellTrap")]
    SpellTrap,
    Graveyard,
    Deck,
    #[serde(alias = "extraDeck")]
    ExtraDeck,
    #[serde(alias = "fieldSpell")]
    FieldSpell,
}

impl ZoneKind {
    /// The six ordered zones, in canonical scan order.
    pub const SEQUENCES: [ZoneKind; 6] = [
        ZoneKind::Hand,
        ZoneKind::Field,
        ZoneKind::SpellTrap,
        ZoneKind::Graveyard,
        ZoneKind::Deck,
        ZoneKind::ExtraDeck,
    ];

    /// Zones a player can click on the board.
    #[must_use]
    pub const fn is_board_visible(self) -> bool {
        matches!(self, ZoneKind::Field | ZoneKind::SpellTrap | ZoneKind::FieldSpell)
    }

    /// Snake-case name, matching the serialized form.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ZoneKind::Hand => "hand",
            ZoneKind::Field => "field",
            ZoneKind::SpellTrap => "spell_trap",
            ZoneKind::Graveyard => "graveyard",
            ZoneKind::Deck => "deck",
            ZoneKind::ExtraDeck => "extra_deck",
            ZoneKind::FieldSpell => "field_spell",
        }
    }
}

impl std::fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Complete duel configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelConfig {
    /// Life total each seat starts with.
    pub starting_life: i64,

    /// Maximum monsters on a seat's field.
    pub field_capacity: usize,

    /// Maximum cards in a seat's spell/trap zone.
    pub spell_trap_capacity: usize,

    /// Cards drawn by each seat when the duel starts.
    pub opening_hand: usize,

    /// How long the presenter is asked to hold a flip before battle math.
    pub flip_pause_ms: u64,

    /// Whether board-click selection advances once a requirement is full.
    pub field_targeting_auto_advance: bool,

    /// Diagnostic mode: invariant checks inside the engine fail the operation
    /// instead of logging.
    pub fail_fast_invariants: bool,

    /// RNG seed for deck shuffles.
    pub seed: u64,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            starting_life: 8000,
            field_capacity: 5,
            spell_trap_capacity: 5,
            opening_hand: 5,
            flip_pause_ms: 400,
            field_targeting_auto_advance: true,
            fail_fast_invariants: false,
            seed: 0,
        }
    }
}

impl DuelConfig {
    /// Create the standard configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the starting life total.
    #[must_use]
    pub fn with_starting_life(mut self, life: i64) -> Self {
        self.starting_life = life;
        self
    }

    /// Set the field and spell/trap capacities.
    #[must_use]
    pub fn with_capacities(mut self, field: usize, spell_trap: usize) -> Self {
        self.field_capacity = field;
        self.spell_trap_capacity = spell_trap;
        self
    }

    /// Set the opening hand size.
    #[must_use]
    pub fn with_opening_hand(mut self, cards: usize) -> Self {
        self.opening_hand = cards;
        self
    }

    /// Enable fail-fast invariant checking.
    #[must_use]
    pub fn fail_fast(mut self) -> Self {
        self.fail_fast_invariants = true;
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Capacity of a zone, if it is bounded.
    #[must_use]
    pub fn capacity(&self, zone: ZoneKind) -> Option<usize> {
        match zone {
            ZoneKind::Field => Some(self.field_capacity),
            ZoneKind::SpellTrap => Some(self.spell_trap_capacity),
            ZoneKind::FieldSpell => Some(1),
            _ => None,
        }
    }
}

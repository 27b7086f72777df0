//! Per-seat zone storage.
//!
//! `PlayerZones` holds the six ordered zones of one seat plus the field-spell
//! slot. Zones store card identities; the cards themselves live in the duel's
//! card store.
//!
//! Zones are `im::Vector`s, so cloning a seat's zones (which every snapshot
//! does) shares structure instead of copying.
//!
//! For ordered zones the top is the **end** of the vector: a deck draws from
//! the back, and `ZonePosition::Top` appends.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::core::config::ZoneKind;
use crate::core::entity::EntityId;

/// Position for inserting a card into an ordered zone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZonePosition {
    /// Add to top of zone (end of the vector).
    #[default]
    Top,
    /// Add to bottom of zone.
    Bottom,
    /// Insert at specific index, clamped to the zone length.
    Index(usize),
}

/// The zones owned by one seat.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerZones {
    pub hand: Vector<EntityId>,
    pub field: Vector<EntityId>,
    pub spell_trap: Vector<EntityId>,
    pub graveyard: Vector<EntityId>,
    pub deck: Vector<EntityId>,
    pub extra_deck: Vector<EntityId>,
    pub field_spell: Option<EntityId>,
}

impl PlayerZones {
    /// Create empty zones.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow an ordered zone. `None` for the field-spell slot.
    #[must_use]
    pub fn zone(&self, kind: ZoneKind) -> Option<&Vector<EntityId>> {
        match kind {
            ZoneKind::Hand => Some(&self.hand),
            ZoneKind::Field => Some(&self.field),
            ZoneKind::SpellTrap => Some(&self.spell_trap),
            ZoneKind::Graveyard => Some(&self.graveyard),
            ZoneKind::Deck => Some(&self.deck),
            ZoneKind::ExtraDeck => Some(&self.extra_deck),
            ZoneKind::FieldSpell => None,
        }
    }

    /// Mutably borrow an ordered zone. `None` for the field-spell slot.
    pub fn zone_mut(&mut self, kind: ZoneKind) -> Option<&mut Vector<EntityId>> {
        match kind {
            ZoneKind::Hand => Some(&mut self.hand),
            ZoneKind::Field => Some(&mut self.field),
            ZoneKind::SpellTrap => Some(&mut self.spell_trap),
            ZoneKind::Graveyard => Some(&mut self.graveyard),
            ZoneKind::Deck => Some(&mut self.deck),
            ZoneKind::ExtraDeck => Some(&mut self.extra_deck),
            ZoneKind::FieldSpell => None,
        }
    }

    /// Cards in a zone, in order. The field-spell slot yields zero or one card.
    #[must_use]
    pub fn cards_in(&self, kind: ZoneKind) -> Vec<EntityId> {
        match self.zone(kind) {
            Some(zone) => zone.iter().copied().collect(),
            None => self.field_spell.into_iter().collect(),
        }
    }

    /// Number of cards in a zone.
    #[must_use]
    pub fn len(&self, kind: ZoneKind) -> usize {
        match self.zone(kind) {
            Some(zone) => zone.len(),
            None => usize::from(self.field_spell.is_some()),
        }
    }

    /// Card at a slot. The field-spell slot only has index 0.
    #[must_use]
    pub fn card_at(&self, kind: ZoneKind, index: usize) -> Option<EntityId> {
        match self.zone(kind) {
            Some(zone) => zone.get(index).copied(),
            None if index == 0 => self.field_spell,
            None => None,
        }
    }

    /// First location of a card in these zones.
    #[must_use]
    pub fn position_of(&self, card: EntityId) -> Option<(ZoneKind, usize)> {
        self.iter_slots()
            .find(|&(_, _, id)| id == card)
            .map(|(kind, index, _)| (kind, index))
    }

    /// Check if a card is anywhere in these zones.
    #[must_use]
    pub fn contains(&self, card: EntityId) -> bool {
        self.position_of(card).is_some()
    }

    /// Iterate over every (zone, index, card) slot, field-spell slot last.
    pub fn iter_slots(&self) -> impl Iterator<Item = (ZoneKind, usize, EntityId)> + '_ {
        ZoneKind::SEQUENCES
            .iter()
            .flat_map(move |&kind| {
                self.zone(kind)
                    .into_iter()
                    .flat_map(move |zone| zone.iter().enumerate().map(move |(i, &id)| (kind, i, id)))
            })
            .chain(self.field_spell.map(|id| (ZoneKind::FieldSpell, 0, id)))
    }

    /// Insert a card without any capacity check.
    ///
    /// Inserting into an occupied field-spell slot replaces it and returns the
    /// previous occupant.
    pub fn insert(&mut self, kind: ZoneKind, card: EntityId, position: ZonePosition) -> Option<EntityId> {
        let Some(zone) = self.zone_mut(kind) else {
            return self.field_spell.replace(card);
        };
        match position {
            ZonePosition::Top => zone.push_back(card),
            ZonePosition::Bottom => zone.push_front(card),
            ZonePosition::Index(i) => {
                let idx = i.min(zone.len());
                zone.insert(idx, card);
            }
        }
        None
    }

    /// Remove the first occurrence of a card.
    ///
    /// Returns where it was, or `None` if it was not here.
    pub fn remove(&mut self, card: EntityId) -> Option<(ZoneKind, usize)> {
        let (kind, index) = self.position_of(card)?;
        match self.zone_mut(kind) {
            Some(zone) => {
                zone.remove(index);
            }
            None => self.field_spell = None,
        }
        Some((kind, index))
    }

    /// Remove and return the top card of an ordered zone.
    pub fn pop_top(&mut self, kind: ZoneKind) -> Option<EntityId> {
        self.zone_mut(kind)?.pop_back()
    }

    /// Total cards across all zones.
    #[must_use]
    pub fn total_cards(&self) -> usize {
        self.iter_slots().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_positions() {
        let mut zones = PlayerZones::new();

        zones.insert(ZoneKind::Deck, EntityId(10), ZonePosition::Top);
        zones.insert(ZoneKind::Deck, EntityId(11), ZonePosition::Bottom);
        zones.insert(ZoneKind::Deck, EntityId(12), ZonePosition::Top);
        zones.insert(ZoneKind::Deck, EntityId(13), ZonePosition::Index(1));

        assert_eq!(
            zones.cards_in(ZoneKind::Deck),
            vec![EntityId(11), EntityId(13), EntityId(10), EntityId(12)]
        );
        assert_eq!(zones.pop_top(ZoneKind::Deck), Some(EntityId(12)));
    }

    #[test]
    fn test_field_spell_slot() {
        let mut zones = PlayerZones::new();

        assert_eq!(zones.insert(ZoneKind::FieldSpell, EntityId(20), ZonePosition::Top), None);
        assert_eq!(zones.len(ZoneKind::FieldSpell), 1);
        assert_eq!(zones.card_at(ZoneKind::FieldSpell, 0), Some(EntityId(20)));
        assert_eq!(zones.card_at(ZoneKind::FieldSpell, 1), None);

        let replaced = zones.insert(ZoneKind::FieldSpell, EntityId(21), ZonePosition::Top);
        assert_eq!(replaced, Some(EntityId(20)));

        assert_eq!(zones.remove(EntityId(21)), Some((ZoneKind::FieldSpell, 0)));
        assert_eq!(zones.field_spell, None);
    }

    #[test]
    fn test_position_and_remove() {
        let mut zones = PlayerZones::new();
        zones.insert(ZoneKind::Hand, EntityId(10), ZonePosition::Top);
        zones.insert(ZoneKind::Field, EntityId(11), ZonePosition::Top);
        zones.insert(ZoneKind::Field, EntityId(12), ZonePosition::Top);

        assert_eq!(zones.position_of(EntityId(12)), Some((ZoneKind::Field, 1)));
        assert_eq!(zones.remove(EntityId(11)), Some((ZoneKind::Field, 0)));
        assert_eq!(zones.position_of(EntityId(12)), Some((ZoneKind::Field, 0)));
        assert_eq!(zones.remove(EntityId(99)), None);
        assert_eq!(zones.total_cards(), 2);
    }

    #[test]
    fn test_iter_slots_order() {
        let mut zones = PlayerZones::new();
        zones.insert(ZoneKind::FieldSpell, EntityId(1), ZonePosition::Top);
        zones.insert(ZoneKind::Graveyard, EntityId(2), ZonePosition::Top);
        zones.insert(ZoneKind::Hand, EntityId(3), ZonePosition::Top);

        let slots: Vec<_> = zones.iter_slots().collect();
        assert_eq!(
            slots,
            vec![
                (ZoneKind::Hand, 0, EntityId(3)),
                (ZoneKind::Graveyard, 0, EntityId(2)),
                (ZoneKind::FieldSpell, 0, EntityId(1)),
            ]
        );
    }

    #[test]
    fn test_clone_is_independent() {
        let mut zones = PlayerZones::new();
        zones.insert(ZoneKind::Hand, EntityId(1), ZonePosition::Top);
        let copy = zones.clone();

        zones.insert(ZoneKind::Hand, EntityId(2), ZonePosition::Top);

        assert_eq!(copy.len(ZoneKind::Hand), 1);
        assert_eq!(zones.len(ZoneKind::Hand), 2);
    }
}

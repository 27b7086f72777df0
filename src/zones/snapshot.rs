//! Zone snapshots for transactional rollback.
//!
//! A `ZoneSnapshot` captures every seat's zones plus a full copy of every
//! card reachable from them. Zone vectors are persistent, so capturing them
//! is a reference-count bump; card copies are real clones, so later mutation
//! of counters or equip lists never aliases the snapshot.
//!
//! Snapshots exist only for rollback and are dropped on commit.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::cards::CardInstance;
use crate::core::{DuelState, EntityId, PlayerId, PlayerMap};

use super::board::PlayerZones;

/// Captured zone and card state.
#[derive(Clone, Debug)]
pub struct ZoneSnapshot {
    zones: PlayerMap<PlayerZones>,
    cards: FxHashMap<EntityId, CardInstance>,
    known: FxHashSet<EntityId>,
}

impl ZoneSnapshot {
    /// Capture the current zones and every card reachable from them.
    #[must_use]
    pub fn capture(state: &DuelState) -> Self {
        let zones = PlayerMap::new(|id| state.zones(id).clone());

        let mut cards = FxHashMap::default();
        for (_, player) in state.players.iter() {
            for (_, _, id) in player.zones.iter_slots() {
                if cards.contains_key(&id) {
                    continue;
                }
                if let Some(card) = state.card(id) {
                    cards.insert(id, card.clone());
                }
            }
        }

        Self {
            zones,
            cards,
            known: state.cards.keys().copied().collect(),
        }
    }

    /// Put zones and captured cards back.
    ///
    /// Zones are replaced wholesale. Every captured card is overwritten with
    /// its captured fields. Cards created after the capture are dropped from
    /// the store, since no restored zone can reference them. Returns the
    /// number of cards restored.
    ///
    /// Ownership normalization is the caller's responsibility.
    pub fn restore(&self, state: &mut DuelState) -> usize {
        for (id, zones) in self.zones.iter() {
            *state.zones_mut(id) = zones.clone();
        }

        state.cards.retain(|id, _| self.known.contains(id));

        let mut restored = 0;
        for (id, captured) in &self.cards {
            match state.cards.get_mut(id) {
                Some(card) => *card = captured.clone(),
                None => {
                    state.cards.insert(*id, captured.clone());
                }
            }
            restored += 1;
        }
        restored
    }

    /// Captured zones of one seat.
    #[must_use]
    pub fn zones(&self, player: PlayerId) -> &PlayerZones {
        &self.zones[player]
    }

    /// Captured copy of a card.
    #[must_use]
    pub fn card(&self, id: EntityId) -> Option<&CardInstance> {
        self.cards.get(&id)
    }

    /// Number of cards captured.
    #[must_use]
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }
}

/// Structural equality of one seat's zones between two snapshots.
///
/// Diagnostic helper; the engine never branches on it.
#[must_use]
pub fn compare_zone_snapshot(a: &ZoneSnapshot, b: &ZoneSnapshot, player: PlayerId) -> bool {
    a.zones(player) == b.zones(player)
}

//! Ownership normalization.
//!
//! Effects may write relative seat references (`Self_`, `Opponent`) into a
//! card's owner or controller, and may forget to update ownership after
//! moving a card across the table. The normalizer resolves the former and,
//! when asked, repairs the latter by making owner and controller agree with
//! the seat whose zone holds the card.

use rustc_hash::FxHashSet;

use crate::cards::CardInstance;
use crate::core::{DuelState, PlayerId, PlayerRef};

/// Which seat "self" and "opponent" refer to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OwnershipContext {
    pub player: PlayerId,
    pub opponent: PlayerId,
}

impl OwnershipContext {
    /// Context seen from `player`'s side of the table.
    #[must_use]
    pub const fn for_player(player: PlayerId) -> Self {
        Self {
            player,
            opponent: player.opponent(),
        }
    }
}

/// Options for `normalize_card_ownership`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OwnershipMeta {
    /// Overwrite owner and controller with `zone_owner`.
    pub enforce_zone_owner: bool,
    /// Seat whose zone currently holds the card, if known.
    pub zone_owner: Option<PlayerId>,
}

/// Resolve a relative seat reference.
#[must_use]
pub fn normalize_relative_player_id(value: PlayerRef, ctx: &OwnershipContext) -> PlayerRef {
    match value {
        PlayerRef::Self_ => PlayerRef::Absolute(ctx.player),
        PlayerRef::Opponent => PlayerRef::Absolute(ctx.opponent),
        other => other,
    }
}

/// Resolve a card's owner and controller. Returns whether anything changed.
pub fn normalize_card_ownership(
    card: &mut CardInstance,
    ctx: &OwnershipContext,
    meta: OwnershipMeta,
) -> bool {
    let mut owner = normalize_relative_player_id(card.owner, ctx);
    let mut controller = normalize_relative_player_id(card.controller, ctx);

    if meta.enforce_zone_owner {
        if let Some(zone_owner) = meta.zone_owner {
            owner = PlayerRef::Absolute(zone_owner);
            controller = PlayerRef::Absolute(zone_owner);
        }
    }

    let changed = owner != card.owner || controller != card.controller;
    card.owner = owner;
    card.controller = controller;
    changed
}

/// Normalize every card in every zone of both seats.
///
/// Relative references resolve from the holding seat's point of view. Each
/// card is visited once even if it is (wrongly) referenced from two slots;
/// the first slot in scan order wins. Returns the number of cards changed.
pub fn normalize_zone_card_ownership(state: &mut DuelState, enforce_zone_owner: bool) -> usize {
    let mut visited = FxHashSet::default();
    let mut placements = Vec::new();
    for (seat, player) in state.players.iter() {
        for (_, _, id) in player.zones.iter_slots() {
            if visited.insert(id) {
                placements.push((id, seat));
            }
        }
    }

    let mut changed = 0;
    for (id, seat) in placements {
        let Some(card) = state.cards.get_mut(&id) else {
            continue;
        };
        let meta = OwnershipMeta {
            enforce_zone_owner,
            zone_owner: Some(seat),
        };
        if normalize_card_ownership(card, &OwnershipContext::for_player(seat), meta) {
            changed += 1;
        }
    }
    changed
}

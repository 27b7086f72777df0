//! Card identity.
//!
//! Every card in a duel has a unique `EntityId`. Zones hold ids, never copies
//! of cards, so the id is what lookups, rollbacks and selection candidates key
//! on.
//!
//! ## ID Layout
//!
//! - `0..2`: Reserved for the two seats
//! - `2..`: Cards and tokens, allocated by the duel state
//!
//! ```
//! use rust_duel::core::EntityId;
//!
//! let first = EntityId(EntityId::FIRST_CARD);
//! assert!(!first.is_seat());
//! assert!(EntityId(1).is_seat());
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier for a card or token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// First id handed out to cards. Lower ids mirror the seat indices.
    pub const FIRST_CARD: u32 = 2;

    /// Check if this id falls in the range reserved for seats.
    #[must_use]
    pub const fn is_seat(self) -> bool {
        self.0 < Self::FIRST_CARD
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card#{}", self.0)
    }
}

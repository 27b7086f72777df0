//! Seat identification and per-seat data storage.
//!
//! ## PlayerId
//!
//! A duel has exactly two seats, `PlayerId(0)` and `PlayerId(1)`.
//!
//! ## PlayerRef
//!
//! What card effects write into owner/controller fields. Effects are allowed
//! to speak relatively ("give control to the opponent"); the ownership
//! normalizer resolves those sentinels to concrete seats.
//!
//! ## PlayerMap
//!
//! Per-seat data storage backed by `Vec` for O(1) access.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Number of seats in a duel.
pub const SEATS: usize = 2;

/// Seat identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw seat index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The other seat.
    #[must_use]
    pub const fn opponent(self) -> Self {
        Self(1 - (self.0 & 1))
    }

    /// Check that this id names one of the two seats.
    #[must_use]
    pub const fn is_known(self) -> bool {
        (self.0 as usize) < SEATS
    }

    /// Iterate over both seats.
    pub fn all() -> impl Iterator<Item = PlayerId> {
        (0..SEATS as u8).map(PlayerId)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// A possibly-relative reference to a seat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerRef {
    /// A concrete seat.
    Absolute(PlayerId),
    /// "The player this effect belongs to".
    Self_,
    /// "That player's opponent".
    Opponent,
}

impl PlayerRef {
    /// The concrete seat, if this reference is already resolved.
    #[must_use]
    pub const fn absolute(self) -> Option<PlayerId> {
        match self {
            PlayerRef::Absolute(id) => Some(id),
            PlayerRef::Self_ | PlayerRef::Opponent => None,
        }
    }

    /// Check whether this reference resolves to `player`.
    #[must_use]
    pub fn is(self, player: PlayerId) -> bool {
        self.absolute() == Some(player)
    }
}

impl From<PlayerId> for PlayerRef {
    fn from(id: PlayerId) -> Self {
        PlayerRef::Absolute(id)
    }
}

/// Per-seat data storage with O(1) access.
///
/// ```
/// use rust_duel::core::{PlayerId, PlayerMap};
///
/// let mut life: PlayerMap<i64> = PlayerMap::with_value(8000);
/// life[PlayerId::new(1)] -= 500;
/// assert_eq!(life[PlayerId::new(0)], 8000);
/// assert_eq!(life[PlayerId::new(1)], 7500);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    data: Vec<T>,
}

impl<T> PlayerMap<T> {
    /// Create a new PlayerMap with values from a factory function.
    pub fn new(factory: impl Fn(PlayerId) -> T) -> Self {
        Self {
            data: PlayerId::all().map(factory).collect(),
        }
    }

    /// Create a new PlayerMap with both entries set to the same value.
    pub fn with_value(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(|_| value.clone())
    }

    /// Create a new PlayerMap with default values.
    pub fn with_default() -> Self
    where
        T: Default,
    {
        Self::new(|_| T::default())
    }

    /// Get a reference to a seat's data.
    #[must_use]
    pub fn get(&self, player: PlayerId) -> &T {
        &self.data[player.index()]
    }

    /// Get a mutable reference to a seat's data.
    pub fn get_mut(&mut self, player: PlayerId) -> &mut T {
        &mut self.data[player.index()]
    }

    /// Iterate over (PlayerId, &T) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }

    /// Iterate over (PlayerId, &mut T) pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PlayerId, &mut T)> {
        self.data
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }
}

impl<T> Index<PlayerId> for PlayerMap<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &Self::Output {
        self.get(player)
    }
}

impl<T> IndexMut<PlayerId> for PlayerMap<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut Self::Output {
        self.get_mut(player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_basics() {
        let p0 = PlayerId::new(0);
        let p1 = PlayerId::new(1);

        assert_eq!(p0.index(), 0);
        assert_eq!(p0.opponent(), p1);
        assert_eq!(p1.opponent(), p0);
        assert!(p1.is_known());
        assert!(!PlayerId::new(2).is_known());
        assert_eq!(format!("{}", p0), "Player 0");
    }

    #[test]
    fn test_player_ref() {
        let p1 = PlayerId::new(1);
        assert_eq!(PlayerRef::from(p1).absolute(), Some(p1));
        assert_eq!(PlayerRef::Opponent.absolute(), None);
        assert!(PlayerRef::Absolute(p1).is(p1));
        assert!(!PlayerRef::Self_.is(p1));
    }

    #[test]
    fn test_player_map_new() {
        let map: PlayerMap<i32> = PlayerMap::new(|p| p.index() as i32 * 10);

        assert_eq!(map[PlayerId::new(0)], 0);
        assert_eq!(map[PlayerId::new(1)], 10);
    }

    #[test]
    fn test_player_map_iter_mut() {
        let mut map: PlayerMap<Vec<i32>> = PlayerMap::with_default();
        for (player, values) in map.iter_mut() {
            values.push(player.index() as i32);
        }

        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1], (PlayerId::new(1), &vec![1]));
    }

    #[test]
    fn test_player_map_serialization() {
        let map: PlayerMap<i32> = PlayerMap::new(|p| p.index() as i32 + 1);
        let json = serde_json::to_string(&map).unwrap();
        let deserialized: PlayerMap<i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(map, deserialized);
    }
}

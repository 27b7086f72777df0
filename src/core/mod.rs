//! Core duel types: entities, seats, configuration, RNG and state.
//!
//! Everything here is plain data plus the primitive, unguarded zone moves.
//! Transactions, invariants and resolution live in `engine`.

pub mod entity;
pub mod player;
pub mod rng;
pub mod config;
pub mod state;

pub use entity::EntityId;
pub use player::{PlayerId, PlayerMap, PlayerRef, SEATS};
pub use rng::GameRng;
pub use config::{DuelConfig, ZoneKind};
pub use state::{DuelState, GameResult, PlayerState};

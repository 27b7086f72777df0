//! Card instances.
//!
//! ## Key Types
//!
//! - `CardId`: Catalog identifier
//! - `CardKind`: Monster / spell / trap / field spell
//! - `CardInstance`: Runtime card state (ownership, stats, flags, counters)
//!
//! What a card *does* lives with the effect engine collaborator; the core only
//! stores the fields those effects mutate.

pub mod instance;

pub use instance::{BattlePosition, CardFlags, CardId, CardInstance, CardKind};

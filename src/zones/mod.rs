//! Zone storage and snapshots.
//!
//! ## Key Types
//!
//! - `ZoneKind`: The fixed zone set (from `core::config`)
//! - `PlayerZones`: One seat's zones
//! - `ZonePosition`: Position specifier for ordered zones
//! - `ZoneSnapshot`: Captured zones and card fields for rollback

pub mod board;
pub mod snapshot;

pub use board::{PlayerZones, ZonePosition};
pub use snapshot::{compare_zone_snapshot, ZoneSnapshot};

// Re-export zone kind from core for convenience
pub use crate::core::config::ZoneKind;

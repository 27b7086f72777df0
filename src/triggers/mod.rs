//! Events and triggered abilities.
//!
//! ## Key Components
//!
//! - [`GameEvent`]: An event that occurred, with contextual data
//! - [`EventBus`]: Name-keyed listeners that observe events
//! - [`TriggerEntry`]: One triggered ability waiting to resolve
//! - [`EventResolution`]: What resolving an event produced
//! - [`PendingEventSelection`]: A resolution paused on a player choice
//!
//! ## Flow
//!
//! `Engine::emit` notifies listeners, asks the effect engine which abilities
//! respond, and activates them in order. An ability that needs a choice
//! parks the resolution; `Engine::resume_pending_event_selection` picks it
//! up at the same entry once the choice is made.

mod bus;
mod entry;
mod event;
mod resolver;

pub use bus::{EventBus, Listener};
pub use entry::{CompletionHook, TriggerCollection, TriggerEntry, TriggerId};
pub use event::{names, GameEvent};
pub use resolver::{EntryResult, EntryStatus, EventResolution, PendingEventSelection, ResolveOptions, ResumeContext};

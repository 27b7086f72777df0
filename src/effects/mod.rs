//! Card effects.
//!
//! The rules core delegates everything card-specific to an `EffectEngine`:
//! - `EffectEngine`: Collects, activates and completes triggered abilities,
//!   destroys cards, and opens trap windows
//! - `ActionRegistry`: Handlers keyed by action tag
//! - `RegistryEffectEngine`: An `EffectEngine` built from watchers and the
//!   action registry
//!
//! ## Design Philosophy
//!
//! Trigger entries are data and behaviour lives behind tags, so a paused
//! resolution can be stored and resumed without holding closures.

mod engine;
mod registry;

pub use engine::{
    destroy_to_graveyard, ActivationOutcome, DestroyCause, DestroyOutcome, DestroyRequest, EffectEngine,
    NullEffectEngine, TriggerContext,
};
pub use registry::{ActionHandler, ActionRegistry, RegistryEffectEngine, WatchCondition, Watcher};

//! Engine error type.
//!
//! Every fallible engine operation returns `Result<_, EngineError>`. At the
//! API edge, errors become an `ActionResult` whose `reason` string is safe to
//! show to a player.

use crate::core::{EntityId, PlayerId, ZoneKind};
use crate::engine::invariants::InvariantIssue;

/// Errors raised by the rules core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Card id not present in the card store.
    #[error("Unknown card {0}")]
    UnknownCard(EntityId),

    /// Card is not in any zone.
    #[error("{0} is not in any zone")]
    NotInZone(EntityId),

    /// Zone at capacity.
    #[error("{} is full", zone_label(.0))]
    ZoneFull(ZoneKind, PlayerId),

    /// Card kind cannot go to that zone.
    #[error("{card} cannot be placed in {zone}")]
    InvalidPlacement { card: EntityId, zone: ZoneKind },

    /// Empty deck on draw.
    #[error("{0} has no cards left to draw")]
    DeckEmpty(PlayerId),

    /// Duel already decided.
    #[error("The duel is over")]
    GameOver,

    /// A root zone operation failed and its snapshot was restored.
    #[error("{reason}")]
    RolledBack { label: String, reason: String },

    /// Critical invariant issues in fail-fast mode.
    #[error("Invariant violation during {context}: {}", summarize(.issues))]
    InvariantViolation {
        context: String,
        issues: Vec<InvariantIssue>,
    },

    /// Selection session misuse or an invalid answer.
    #[error("{0}")]
    Selection(String),

    /// Attack declared by a card that cannot attack.
    #[error("{0}")]
    AttackUnavailable(String),

    /// An effect handler failed.
    #[error("{0}")]
    Effect(String),

    /// A parked continuation could not be encoded or decoded.
    #[error("Continuation codec error: {0}")]
    Codec(String),
}

impl EngineError {
    /// Build an effect failure from any message.
    pub fn effect(message: impl Into<String>) -> Self {
        EngineError::Effect(message.into())
    }

    /// Whether this error came back from a rolled-back root transaction.
    #[must_use]
    pub fn is_rolled_back(&self) -> bool {
        matches!(self, EngineError::RolledBack { .. })
    }
}

fn zone_label(zone: &ZoneKind) -> &'static str {
    match zone {
        ZoneKind::Hand => "Hand",
        ZoneKind::Field => "Field",
        ZoneKind::SpellTrap => "Spell/Trap zone",
        ZoneKind::Graveyard => "Graveyard",
        ZoneKind::Deck => "Deck",
        ZoneKind::ExtraDeck => "Extra Deck",
        ZoneKind::FieldSpell => "Field Spell zone",
    }
}

fn summarize(issues: &[InvariantIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.code.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(
            EngineError::ZoneFull(ZoneKind::Field, PlayerId::new(0)).to_string(),
            "Field is full"
        );
        assert_eq!(
            EngineError::RolledBack {
                label: "summon".into(),
                reason: "No valid targets".into()
            }
            .to_string(),
            "No valid targets"
        );
        assert_eq!(EngineError::UnknownCard(EntityId(7)).to_string(), "Unknown card Card#7");
    }

    #[test]
    fn test_is_rolled_back() {
        let err = EngineError::RolledBack { label: "x".into(), reason: "y".into() };
        assert!(err.is_rolled_back());
        assert!(!EngineError::GameOver.is_rolled_back());
    }
}

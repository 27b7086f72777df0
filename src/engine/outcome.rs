//! Normalized action results.
//!
//! Everything a caller (UI click handler, server action handler, bot) gets
//! back from a game action is an `ActionResult`. It says one of three things:
//! the action finished, it failed with a player-facing reason, or it is
//! waiting on a choice described by a selection contract.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::selection::SelectionContract;

/// Outcome of a game action.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub needs_selection: bool,
    pub selection_contract: Option<SelectionContract>,
    pub reason: Option<String>,
    pub rolled_back: bool,
}

impl ActionResult {
    /// The action completed.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// The action failed without touching state.
    #[must_use]
    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::default()
        }
    }

    /// The action is parked until a choice is supplied.
    #[must_use]
    pub fn needs_selection(contract: SelectionContract) -> Self {
        Self {
            success: false,
            needs_selection: true,
            selection_contract: Some(contract),
            ..Self::default()
        }
    }

    /// Render an engine error as a failure.
    #[must_use]
    pub fn from_error(err: &EngineError) -> Self {
        Self {
            reason: Some(err.to_string()),
            rolled_back: err.is_rolled_back(),
            ..Self::default()
        }
    }

    /// Collapse an operation's `Result` into a single outcome.
    #[must_use]
    pub fn normalize(result: Result<ActionResult, EngineError>) -> Self {
        match result {
            Ok(result) => result,
            Err(err) => Self::from_error(&err),
        }
    }

    /// Neither finished nor waiting: the action failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.success && !self.needs_selection
    }
}

impl From<Result<(), EngineError>> for ActionResult {
    fn from(result: Result<(), EngineError>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(err) => Self::from_error(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rolled_back_error() {
        let err = EngineError::RolledBack {
            label: "summon".into(),
            reason: "Field is full".into(),
        };
        let result = ActionResult::from_error(&err);

        assert!(!result.success);
        assert!(result.rolled_back);
        assert_eq!(result.reason.as_deref(), Some("Field is full"));
        assert!(result.is_failure());
    }

    #[test]
    fn test_normalize() {
        assert!(ActionResult::normalize(Ok(ActionResult::ok())).success);
        let failed = ActionResult::normalize(Err(EngineError::GameOver));
        assert_eq!(failed.reason.as_deref(), Some("The duel is over"));
        assert!(!failed.rolled_back);
    }
}

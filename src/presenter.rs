//! Presentation hooks.
//!
//! The rules core never draws anything. It tells a `Presenter` what
//! happened and what the player is being asked, and a UI (or a test
//! recorder) decides what to do with it. Every method has a no-op default,
//! so a presenter implements only what it shows.

use crate::core::{DuelState, EntityId, GameResult};
use crate::selection::SelectionContract;

/// UI collaborator.
pub trait Presenter {
    /// A line for the duel log.
    fn log(&self, _message: &str) {}

    /// Redraw the board from scratch.
    fn render(&self, _state: &DuelState) {}

    /// Refresh life totals, phase and attack indicators.
    fn refresh_indicators(&self, _state: &DuelState) {}

    /// Wait before continuing, for reveal animations.
    fn pause(&self, _millis: u64) {}

    fn show_field_targeting_controls(&self, _contract: &SelectionContract) {}

    fn hide_field_targeting_controls(&self) {}

    /// Open the combined picker.
    fn show_target_selection(&self, _contract: &SelectionContract) {}

    fn hide_target_selection(&self) {}

    /// Ask the player to confirm a completed selection.
    fn show_selection_confirm(&self, _contract: &SelectionContract) {}

    fn highlight_candidates(&self, _cards: &[EntityId]) {}

    fn clear_highlights(&self) {}

    fn show_game_over(&self, _result: GameResult) {}
}

/// A presenter that shows nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}

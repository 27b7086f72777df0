//! Selection frontends.
//!
//! A session is presented one of two ways. Field targeting lets the player
//! click cards on the board, one requirement at a time, with the current
//! requirement's candidates highlighted. The modal frontend shows a single
//! picker that collects every requirement at once. Both only talk to the
//! `Presenter`; the session state machine is shared.

use crate::core::EntityId;
use crate::presenter::Presenter;

use super::session::{SelectionMode, SelectionSession};

/// Presentation side of a selection session.
pub trait SelectionFrontend {
    /// The session started.
    fn open(&self, presenter: &dyn Presenter, session: &SelectionSession);

    /// The session moved to another requirement.
    fn focus(&self, _presenter: &dyn Presenter, _session: &SelectionSession) {}

    /// Every requirement is answered; waiting for confirmation.
    fn confirm(&self, _presenter: &dyn Presenter, _session: &SelectionSession) {}

    /// The session finished, was cancelled, or was cleared.
    fn close(&self, presenter: &dyn Presenter);
}

/// Click-on-the-board frontend.
#[derive(Clone, Copy, Debug, Default)]
pub struct FieldTargetingFrontend;

impl FieldTargetingFrontend {
    fn highlight_current(presenter: &dyn Presenter, session: &SelectionSession) {
        presenter.clear_highlights();
        if let Some(requirement) = session.current_requirement() {
            let cards: Vec<EntityId> = requirement.candidates.iter().filter_map(|c| c.card).collect();
            presenter.highlight_candidates(&cards);
        }
    }
}

impl SelectionFrontend for FieldTargetingFrontend {
    fn open(&self, presenter: &dyn Presenter, session: &SelectionSession) {
        presenter.show_field_targeting_controls(session.contract());
        Self::highlight_current(presenter, session);
    }

    fn focus(&self, presenter: &dyn Presenter, session: &SelectionSession) {
        Self::highlight_current(presenter, session);
    }

    fn confirm(&self, presenter: &dyn Presenter, session: &SelectionSession) {
        presenter.clear_highlights();
        presenter.show_selection_confirm(session.contract());
    }

    fn close(&self, presenter: &dyn Presenter) {
        presenter.clear_highlights();
        presenter.hide_field_targeting_controls();
    }
}

/// Combined picker frontend.
#[derive(Clone, Copy, Debug, Default)]
pub struct ModalFrontend;

impl SelectionFrontend for ModalFrontend {
    fn open(&self, presenter: &dyn Presenter, session: &SelectionSession) {
        presenter.show_target_selection(session.contract());
    }

    fn close(&self, presenter: &dyn Presenter) {
        presenter.hide_target_selection();
    }
}

/// The frontend for a mode.
#[must_use]
pub fn frontend_for(mode: SelectionMode) -> &'static dyn SelectionFrontend {
    match mode {
        SelectionMode::FieldTargeting => &FieldTargetingFrontend,
        SelectionMode::Modal => &ModalFrontend,
    }
}

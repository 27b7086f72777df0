//! State invariant checks.
//!
//! `assert_state_invariants` walks both seats and reports structural
//! problems: over-full zones, ghost duplicates, dangling slots, ownership
//! disagreeing with the holding seat, and a selection phase out of step with
//! the live session. It runs after every root zone operation and after every
//! event resolution.

use rustc_hash::FxHashMap;
use tracing::{error, warn};

use crate::core::{EntityId, PlayerId, ZoneKind};
use crate::error::EngineError;
use crate::selection::SelectionPhase;

use super::Engine;

/// Kind of invariant problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IssueCode {
    FieldOverCapacity,
    SpellTrapOverCapacity,
    CardInMultipleZones,
    FieldSpellInMultipleZones,
    EmptySlot,
    OwnerMismatch,
    ControllerMismatch,
    /// A session object while the phase is idle.
    StaleSelection,
    /// A non-idle phase with no session object.
    OrphanSelectionState,
}

impl IssueCode {
    /// Stable snake-case name for logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            IssueCode::FieldOverCapacity => "field_over_capacity",
            IssueCode::SpellTrapOverCapacity => "spell_trap_over_capacity",
            IssueCode::CardInMultipleZones => "card_in_multiple_zones",
            IssueCode::FieldSpellInMultipleZones => "field_spell_in_multiple_zones",
            IssueCode::EmptySlot => "empty_slot",
            IssueCode::OwnerMismatch => "owner_mismatch",
            IssueCode::ControllerMismatch => "controller_mismatch",
            IssueCode::StaleSelection => "stale_selection",
            IssueCode::OrphanSelectionState => "orphan_selection_state",
        }
    }
}

impl std::fmt::Display for IssueCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected problem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvariantIssue {
    pub code: IssueCode,
    pub critical: bool,
    pub player: Option<PlayerId>,
    pub card: Option<EntityId>,
    pub message: String,
}

impl InvariantIssue {
    fn critical(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            critical: true,
            player: None,
            card: None,
            message: message.into(),
        }
    }

    fn minor(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            critical: false,
            ..Self::critical(code, message)
        }
    }

    fn on_player(mut self, player: PlayerId) -> Self {
        self.player = Some(player);
        self
    }

    fn on_card(mut self, card: EntityId) -> Self {
        self.card = Some(card);
        self
    }
}

/// Options for `assert_state_invariants`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvariantOptions {
    /// Return an error when a critical issue is found.
    pub fail_fast: bool,
    /// Repair what can be repaired in place (dangling slots).
    pub normalize: bool,
}

impl Default for InvariantOptions {
    fn default() -> Self {
        Self {
            fail_fast: false,
            normalize: true,
        }
    }
}

/// Result of an invariant check.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InvariantReport {
    pub ok: bool,
    pub issues: Vec<InvariantIssue>,
    pub has_critical: bool,
    pub critical_issues: Vec<InvariantIssue>,
}

impl InvariantReport {
    fn from_issues(issues: Vec<InvariantIssue>) -> Self {
        let critical_issues: Vec<_> = issues.iter().filter(|i| i.critical).cloned().collect();
        Self {
            ok: issues.is_empty(),
            has_critical: !critical_issues.is_empty(),
            critical_issues,
            issues,
        }
    }

    /// Issues with a given code.
    pub fn with_code(&self, code: IssueCode) -> impl Iterator<Item = &InvariantIssue> {
        self.issues.iter().filter(move |i| i.code == code)
    }
}

impl Engine {
    /// Check structural invariants of the duel and the selection state.
    ///
    /// With `normalize`, zone slots naming cards missing from the store are
    /// removed and reported as non-critical. With `fail_fast`, any critical
    /// issue is returned as `EngineError::InvariantViolation`; otherwise the
    /// report is returned and critical issues are logged.
    pub fn assert_state_invariants(
        &mut self,
        label: &str,
        options: InvariantOptions,
    ) -> Result<InvariantReport, EngineError> {
        let mut issues = Vec::new();

        self.check_empty_slots(options.normalize, &mut issues);
        self.check_capacities(&mut issues);
        self.check_placements(&mut issues);
        self.check_selection_state(&mut issues);

        let report = InvariantReport::from_issues(issues);
        if report.has_critical {
            if options.fail_fast {
                return Err(EngineError::InvariantViolation {
                    context: label.to_string(),
                    issues: report.critical_issues,
                });
            }
            for issue in &report.critical_issues {
                error!(context = label, code = %issue.code, card = ?issue.card, "{}", issue.message);
            }
        } else if !report.ok {
            warn!(context = label, count = report.issues.len(), "non-critical invariant issues");
        }
        Ok(report)
    }

    /// Non-fatal check honoring the configured fail-fast mode.
    pub(crate) fn check_invariants(&mut self, label: &str) -> Result<InvariantReport, EngineError> {
        let options = InvariantOptions {
            fail_fast: self.duel.config.fail_fast_invariants,
            normalize: true,
        };
        self.assert_state_invariants(label, options)
    }

    fn check_empty_slots(&mut self, normalize: bool, issues: &mut Vec<InvariantIssue>) {
        let mut dangling = Vec::new();
        for (seat, player) in self.duel.players.iter() {
            for (zone, _, id) in player.zones.iter_slots() {
                if !self.duel.cards.contains_key(&id) {
                    dangling.push((seat, zone, id));
                }
            }
        }

        for (seat, zone, id) in dangling {
            let message = format!("{zone} slot holds {id}, which is not in the card store");
            let issue = if normalize {
                self.duel.zones_mut(seat).remove(id);
                InvariantIssue::minor(IssueCode::EmptySlot, message)
            } else {
                InvariantIssue::critical(IssueCode::EmptySlot, message)
            };
            issues.push(issue.on_player(seat).on_card(id));
        }
    }

    fn check_capacities(&self, issues: &mut Vec<InvariantIssue>) {
        let limits = [
            (ZoneKind::Field, IssueCode::FieldOverCapacity),
            (ZoneKind::SpellTrap, IssueCode::SpellTrapOverCapacity),
        ];
        for (seat, player) in self.duel.players.iter() {
            for (zone, code) in limits {
                let Some(limit) = self.duel.config.capacity(zone) else {
                    continue;
                };
                let count = player.zones.len(zone);
                if count > limit {
                    issues.push(
                        InvariantIssue::critical(code, format!("{zone} holds {count} cards (limit {limit})"))
                            .on_player(seat),
                    );
                }
            }
        }
    }

    fn check_placements(&self, issues: &mut Vec<InvariantIssue>) {
        let mut seen: FxHashMap<EntityId, Vec<(PlayerId, ZoneKind)>> = FxHashMap::default();
        let mut order = Vec::new();
        for (seat, player) in self.duel.players.iter() {
            for (zone, _, id) in player.zones.iter_slots() {
                let locations = seen.entry(id).or_default();
                if locations.is_empty() {
                    order.push(id);
                }
                locations.push((seat, zone));
            }
        }

        for id in order {
            let locations = &seen[&id];
            if locations.len() > 1 {
                let places: Vec<String> = locations
                    .iter()
                    .map(|(seat, zone)| format!("{seat} {zone}"))
                    .collect();
                let code = if locations.iter().any(|&(_, zone)| zone == ZoneKind::FieldSpell) {
                    IssueCode::FieldSpellInMultipleZones
                } else {
                    IssueCode::CardInMultipleZones
                };
                issues.push(
                    InvariantIssue::critical(
                        code,
                        format!("{id} appears in {}", places.join(", ")),
                    )
                    .on_card(id),
                );
            }

            let (holder, zone) = locations[0];
            let Some(card) = self.duel.card(id) else {
                continue;
            };
            if !card.owner.is(holder) {
                issues.push(
                    InvariantIssue::critical(
                        IssueCode::OwnerMismatch,
                        format!("{id} in {holder} {zone} has owner {:?}", card.owner),
                    )
                    .on_player(holder)
                    .on_card(id),
                );
            }
            if !card.controller.is(holder) {
                issues.push(
                    InvariantIssue::critical(
                        IssueCode::ControllerMismatch,
                        format!("{id} in {holder} {zone} has controller {:?}", card.controller),
                    )
                    .on_player(holder)
                    .on_card(id),
                );
            }
        }
    }

    /// Selection staleness is repaired on the spot and never critical.
    fn check_selection_state(&mut self, issues: &mut Vec<InvariantIssue>) {
        let has_session = self.active_session.is_some();
        match self.selection_phase {
            SelectionPhase::Selecting | SelectionPhase::Confirming if !has_session => {
                issues.push(InvariantIssue::minor(
                    IssueCode::OrphanSelectionState,
                    format!("selection phase {:?} without a session", self.selection_phase),
                ));
                self.selection_phase = SelectionPhase::Idle;
            }
            SelectionPhase::Idle if has_session => {
                issues.push(InvariantIssue::minor(
                    IssueCode::StaleSelection,
                    "selection session present while idle",
                ));
                self.force_clear_target_selection("stale");
            }
            _ => {}
        }
    }
}

//! Selection contracts.
//!
//! A selection contract describes a choice the player has to make: one or
//! more requirements, each with a count range, the zones it draws from, and
//! the concrete candidates. Effects build contracts loosely
//! (`RawSelectionContract`, deserializable from JSON with missing fields);
//! `normalize_selection_contract` turns that into the strict
//! `SelectionContract` the session and the UI work with, or rejects it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::warn;

use crate::core::{DuelState, EntityId, PlayerId, ZoneKind};
use crate::error::EngineError;

use super::SelectionMap;

/// Whose cards a requirement may pick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerScope {
    #[default]
    Player,
    Opponent,
    Either,
}

impl OwnerScope {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "player" | "self" | "own" => Some(OwnerScope::Player),
            "opponent" => Some(OwnerScope::Opponent),
            "either" | "any" | "both" => Some(OwnerScope::Either),
            _ => None,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            OwnerScope::Player => "player",
            OwnerScope::Opponent => "opponent",
            OwnerScope::Either => "either",
        }
    }
}

// === Raw (loose) shapes ===

/// Count range given as a nested object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCount {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

/// A candidate as an effect describes it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCandidate {
    pub zone: Option<ZoneKind>,
    #[serde(alias = "zoneIndex")]
    pub index: Option<usize>,
    #[serde(alias = "cardRef", alias = "card_ref")]
    pub card: Option<EntityId>,
    pub controller: Option<PlayerId>,
    pub key: Option<String>,
    pub name: Option<String>,
    #[serde(alias = "isDirectAttack")]
    pub is_direct_attack: bool,
}

impl RawCandidate {
    /// A card in a zone slot.
    #[must_use]
    pub fn card(card: EntityId, zone: ZoneKind, index: usize, controller: PlayerId) -> Self {
        Self {
            zone: Some(zone),
            index: Some(index),
            card: Some(card),
            controller: Some(controller),
            ..Self::default()
        }
    }

    /// The direct-attack option against `defender`.
    #[must_use]
    pub fn direct_attack(defender: PlayerId) -> Self {
        Self {
            controller: Some(defender),
            key: Some("direct".to_string()),
            name: Some("Direct attack".to_string()),
            is_direct_attack: true,
            ..Self::default()
        }
    }

    /// Set the display name (builder pattern).
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A requirement as an effect describes it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRequirement {
    pub id: Option<String>,
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub count: Option<RawCount>,
    pub zones: Option<Vec<ZoneKind>>,
    pub zone: Option<ZoneKind>,
    pub owner: Option<String>,
    pub filters: Vec<String>,
    pub candidates: Vec<RawCandidate>,
}

impl RawRequirement {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Set the count range (builder pattern).
    #[must_use]
    pub fn with_count(mut self, min: usize, max: usize) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Set the zones (builder pattern).
    #[must_use]
    pub fn with_zones(mut self, zones: Vec<ZoneKind>) -> Self {
        self.zones = Some(zones);
        self
    }

    /// Set the owner scope (builder pattern).
    #[must_use]
    pub fn with_owner(mut self, owner: OwnerScope) -> Self {
        self.owner = Some(owner.as_str().to_string());
        self
    }

    /// Add a candidate (builder pattern).
    #[must_use]
    pub fn with_candidate(mut self, candidate: RawCandidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    /// Add candidates (builder pattern).
    #[must_use]
    pub fn with_candidates(mut self, candidates: impl IntoIterator<Item = RawCandidate>) -> Self {
        self.candidates.extend(candidates);
        self
    }
}

/// UI hints as an effect describes them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSelectionUi {
    #[serde(alias = "useFieldTargeting")]
    pub use_field_targeting: Option<bool>,
    #[serde(alias = "preventCancel")]
    pub prevent_cancel: Option<bool>,
    #[serde(alias = "autoAdvance")]
    pub auto_advance: Option<bool>,
    pub title: Option<String>,
    pub message: Option<String>,
}

/// A selection contract as an effect describes it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSelectionContract {
    pub kind: Option<String>,
    pub requirements: Vec<RawRequirement>,
    pub ui: RawSelectionUi,
}

impl RawSelectionContract {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    /// Add a requirement (builder pattern).
    #[must_use]
    pub fn with_requirement(mut self, requirement: RawRequirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Forbid cancelling (builder pattern).
    #[must_use]
    pub fn prevent_cancel(mut self) -> Self {
        self.ui.prevent_cancel = Some(true);
        self
    }

    /// Set the prompt shown to the player (builder pattern).
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.ui.message = Some(message.into());
        self
    }
}

/// Caller-side adjustments applied on top of a raw contract.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContractOverrides {
    pub kind: Option<String>,
    pub use_field_targeting: Option<bool>,
    pub prevent_cancel: Option<bool>,
    pub auto_advance: Option<bool>,
    pub message: Option<String>,
}

// === Normalized shapes ===

/// A concrete option.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Unique within the requirement.
    pub key: String,
    pub zone: Option<ZoneKind>,
    pub index: Option<usize>,
    pub card: Option<EntityId>,
    pub controller: Option<PlayerId>,
    pub name: Option<String>,
    pub is_direct_attack: bool,
}

/// One thing the player must choose.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: String,
    pub min: usize,
    pub max: usize,
    pub zones: SmallVec<[ZoneKind; 3]>,
    pub owner: OwnerScope,
    pub filters: Vec<String>,
    pub candidates: Vec<Candidate>,
}

impl Requirement {
    /// Candidate by key.
    #[must_use]
    pub fn candidate(&self, key: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.key == key)
    }

    /// Candidate naming a card.
    #[must_use]
    pub fn candidate_for_card(&self, card: EntityId) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.card == Some(card))
    }

    /// The direct-attack candidate against `defender`, if offered.
    #[must_use]
    pub fn direct_attack_candidate(&self, defender: PlayerId) -> Option<&Candidate> {
        self.candidates
            .iter()
            .find(|c| c.is_direct_attack && c.controller.map_or(true, |p| p == defender))
    }

    /// Check a list of chosen keys against this requirement.
    pub fn check_choice(&self, keys: &[String]) -> Result<(), EngineError> {
        if keys.len() < self.min {
            return Err(EngineError::Selection(format!("Select at least {} for {}", self.min, self.id)));
        }
        if keys.len() > self.max {
            return Err(EngineError::Selection(format!("Select at most {} for {}", self.max, self.id)));
        }
        let mut seen = BTreeSet::new();
        for key in keys {
            if self.candidate(key).is_none() {
                return Err(EngineError::Selection(format!("Invalid choice {key} for {}", self.id)));
            }
            if !seen.insert(key.as_str()) {
                return Err(EngineError::Selection(format!("{key} chosen twice for {}", self.id)));
            }
        }
        Ok(())
    }
}

/// Presentation flags.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionUi {
    /// Pick on the board instead of in a modal.
    pub use_field_targeting: bool,
    pub prevent_cancel: bool,
    /// `None` means "use the engine default for the chosen frontend".
    pub auto_advance: Option<bool>,
    pub title: Option<String>,
    pub message: Option<String>,
}

/// A validated selection contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionContract {
    pub kind: String,
    pub requirements: Vec<Requirement>,
    pub ui: SelectionUi,
}

impl SelectionContract {
    /// Requirement by id.
    #[must_use]
    pub fn requirement(&self, id: &str) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.id == id)
    }

    /// Check a complete answer.
    pub fn check_selections(&self, selections: &SelectionMap) -> Result<(), EngineError> {
        if let Some(unknown) = selections.keys().find(|id| self.requirement(id).is_none()) {
            return Err(EngineError::Selection(format!("Unknown requirement {unknown}")));
        }
        for requirement in &self.requirements {
            let keys = selections.get(&requirement.id).map_or(&[][..], Vec::as_slice);
            requirement.check_choice(keys)?;
        }
        Ok(())
    }

    /// Cards named by an answer, in requirement order.
    #[must_use]
    pub fn resolve_cards(&self, selections: &SelectionMap) -> Vec<EntityId> {
        let mut cards = Vec::new();
        for requirement in &self.requirements {
            let Some(keys) = selections.get(&requirement.id) else {
                continue;
            };
            cards.extend(keys.iter().filter_map(|key| requirement.candidate(key).and_then(|c| c.card)));
        }
        cards
    }
}

impl From<SelectionContract> for RawSelectionContract {
    fn from(contract: SelectionContract) -> Self {
        let requirements = contract
            .requirements
            .into_iter()
            .map(|r| RawRequirement {
                id: Some(r.id),
                min: Some(r.min),
                max: Some(r.max),
                count: None,
                zones: Some(r.zones.into_vec()),
                zone: None,
                owner: Some(r.owner.as_str().to_string()),
                filters: r.filters,
                candidates: r
                    .candidates
                    .into_iter()
                    .map(|c| RawCandidate {
                        zone: c.zone,
                        index: c.index,
                        card: c.card,
                        controller: c.controller,
                        key: Some(c.key),
                        name: c.name,
                        is_direct_attack: c.is_direct_attack,
                    })
                    .collect(),
            })
            .collect();
        Self {
            kind: Some(contract.kind),
            requirements,
            ui: RawSelectionUi {
                use_field_targeting: Some(contract.ui.use_field_targeting),
                prevent_cancel: Some(contract.ui.prevent_cancel),
                auto_advance: contract.ui.auto_advance,
                title: contract.ui.title,
                message: contract.ui.message,
            },
        }
    }
}

fn reject(reason: impl Into<String>) -> EngineError {
    EngineError::Selection(reason.into())
}

fn candidate_key(candidate: &RawCandidate) -> String {
    if candidate.is_direct_attack {
        return "direct".to_string();
    }
    let zone = candidate.zone.map_or("none", ZoneKind::name);
    let index = candidate.index.map_or_else(|| "-".to_string(), |i| i.to_string());
    let card = candidate.card.map_or_else(|| "-".to_string(), |c| c.raw().to_string());
    format!("{zone}:{index}:{card}")
}

fn normalize_requirement(raw: &RawRequirement, position: usize, kind: &str) -> Result<Requirement, EngineError> {
    let id = raw.id.clone().unwrap_or_else(|| format!("req_{position}"));

    let count = raw.count.unwrap_or_default();
    let min = raw.min.or(count.min).unwrap_or(1);
    let max = raw.max.or(count.max).unwrap_or(min);
    if min == 0 {
        return Err(reject(format!("Requirement {id} must ask for at least one choice")));
    }
    if min > max {
        return Err(reject(format!("Requirement {id} asks for {min} to {max} choices")));
    }

    let zones: SmallVec<[ZoneKind; 3]> = if let Some(zones) = raw.zones.as_ref().filter(|z| !z.is_empty()) {
        zones.iter().copied().collect()
    } else if let Some(zone) = raw.zone {
        smallvec::smallvec![zone]
    } else {
        let mut inferred: SmallVec<[ZoneKind; 3]> = SmallVec::new();
        for zone in raw.candidates.iter().filter_map(|c| c.zone) {
            if !inferred.contains(&zone) {
                inferred.push(zone);
            }
        }
        let direct_attack = raw.candidates.iter().any(|c| c.is_direct_attack);
        if inferred.is_empty() && (kind == "position_select" || direct_attack) {
            inferred.push(ZoneKind::Field);
        }
        inferred
    };
    if zones.is_empty() {
        return Err(reject(format!("Requirement {id} has no zones")));
    }

    let owner = match raw.owner.as_deref() {
        None => OwnerScope::default(),
        Some(value) => OwnerScope::parse(value).unwrap_or_else(|| {
            warn!(requirement = %id, owner = value, "unknown owner scope, using player");
            OwnerScope::Player
        }),
    };

    let mut keys = BTreeSet::new();
    let mut candidates = Vec::with_capacity(raw.candidates.len());
    for candidate in &raw.candidates {
        let key = candidate.key.clone().unwrap_or_else(|| candidate_key(candidate));
        if !keys.insert(key.clone()) {
            return Err(reject(format!("Duplicate candidate {key} in {id}")));
        }
        candidates.push(Candidate {
            key,
            zone: candidate.zone,
            index: candidate.index,
            card: candidate.card,
            controller: candidate.controller,
            name: candidate.name.clone(),
            is_direct_attack: candidate.is_direct_attack,
        });
    }

    Ok(Requirement {
        id,
        min,
        max,
        zones,
        owner,
        filters: raw.filters.clone(),
        candidates,
    })
}

/// Whether every requirement can be answered by clicking the board: each
/// has candidates, all on board-visible zones (or a direct attack), all
/// controlled by a seated player. The requirement's declared zones do not
/// matter, only where its candidates are.
#[must_use]
pub fn can_use_field_targeting(contract: &SelectionContract) -> bool {
    contract.requirements.iter().all(|r| {
        !r.candidates.is_empty()
            && r.candidates.iter().all(|c| {
                (c.is_direct_attack || c.zone.is_some_and(ZoneKind::is_board_visible))
                    && c.controller.is_some_and(PlayerId::is_known)
            })
    })
}

/// Validate and fill defaults.
///
/// Count defaults to exactly one, and `max` defaults to `min`. Zones come
/// from the requirement, else from its candidates. Candidate keys default to
/// `zone:index:card`. Field targeting defaults to whether the contract can
/// be answered on the board.
pub fn normalize_selection_contract(
    raw: &RawSelectionContract,
    overrides: &ContractOverrides,
) -> Result<SelectionContract, EngineError> {
    let kind = overrides
        .kind
        .clone()
        .or_else(|| raw.kind.clone())
        .unwrap_or_else(|| "target".to_string());
    if raw.requirements.is_empty() {
        return Err(reject("Selection has no requirements"));
    }

    let mut ids = BTreeSet::new();
    let mut requirements = Vec::with_capacity(raw.requirements.len());
    for (position, requirement) in raw.requirements.iter().enumerate() {
        let requirement = normalize_requirement(requirement, position, &kind)?;
        if !ids.insert(requirement.id.clone()) {
            return Err(reject(format!("Duplicate requirement {}", requirement.id)));
        }
        requirements.push(requirement);
    }

    let mut contract = SelectionContract {
        kind,
        requirements,
        ui: SelectionUi {
            use_field_targeting: false,
            prevent_cancel: overrides.prevent_cancel.or(raw.ui.prevent_cancel).unwrap_or(false),
            auto_advance: overrides.auto_advance.or(raw.ui.auto_advance),
            title: raw.ui.title.clone(),
            message: overrides.message.clone().or_else(|| raw.ui.message.clone()),
        },
    };
    let field_ok = can_use_field_targeting(&contract);
    contract.ui.use_field_targeting = overrides
        .use_field_targeting
        .or(raw.ui.use_field_targeting)
        .map_or(field_ok, |wanted| wanted && field_ok);
    Ok(contract)
}

/// Candidates for cards wherever they currently are. Cards not in any zone
/// are left out.
#[must_use]
pub fn candidates_from_cards(state: &DuelState, cards: &[EntityId]) -> Vec<RawCandidate> {
    cards
        .iter()
        .filter_map(|&card| {
            let (holder, zone, index) = state.locate(card)?;
            let mut candidate = RawCandidate::card(card, zone, index, holder);
            candidate.name = state.card(card).map(|c| c.name.clone());
            Some(candidate)
        })
        .collect()
}

//! Transactional zone operations.
//!
//! `run_zone_op` wraps any mutation of zones or card fields. The outermost
//! (root) call captures a `ZoneSnapshot`; nested calls just run. When the
//! root finishes, ownership is normalized and invariants are checked; a
//! critical issue turns success into failure. A failed root restores its
//! snapshot, clears any selection session, re-renders and reports
//! `EngineError::RolledBack` carrying the original reason.
//!
//! Nested failures propagate unchanged so that the root decides.

use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::zones::ZoneSnapshot;

use super::ownership::normalize_zone_card_ownership;
use super::Engine;

/// Options for one zone operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoneOpMeta {
    /// After a root commit, force owner/controller to match the holding seat.
    /// Without it, the op itself must leave both fields agreeing with the
    /// holding seat or the commit fails with a mismatch.
    pub enforce_zone_owner: bool,
}

impl Default for ZoneOpMeta {
    fn default() -> Self {
        Self {
            enforce_zone_owner: true,
        }
    }
}

/// Counters over root transactions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransactionStats {
    pub roots: u64,
    pub commits: u64,
    pub rollbacks: u64,
}

impl Engine {
    /// Run `op` as a zone operation.
    ///
    /// Only the root call snapshots, validates and rolls back.
    pub fn run_zone_op<T>(
        &mut self,
        label: &str,
        meta: ZoneOpMeta,
        op: impl FnOnce(&mut Engine) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let snapshot = if self.zone_op_depth == 0 {
            self.tx_stats.roots += 1;
            Some(self.capture_zone_snapshot())
        } else {
            None
        };

        self.zone_op_depth += 1;
        let mut outcome = op(self);
        if outcome.is_ok() && snapshot.is_some() {
            if let Err(err) = self.commit_zone_op(label, meta) {
                outcome = Err(err);
            }
        }
        self.zone_op_depth -= 1;

        match (outcome, snapshot) {
            (Ok(value), Some(_)) => {
                self.tx_stats.commits += 1;
                debug!(label, "zone op committed");
                Ok(value)
            }
            (Ok(value), None) => Ok(value),
            (Err(err), None) => Err(err),
            (Err(err), Some(snapshot)) => Err(self.rollback_zone_op(label, &snapshot, err)),
        }
    }

    /// Nesting depth of the zone operation currently running.
    #[must_use]
    pub fn zone_op_depth(&self) -> u32 {
        self.zone_op_depth
    }

    /// Root transaction counters.
    #[must_use]
    pub fn transaction_stats(&self) -> TransactionStats {
        self.tx_stats
    }

    /// Capture zones and card fields for later restoration.
    #[must_use]
    pub fn capture_zone_snapshot(&self) -> ZoneSnapshot {
        ZoneSnapshot::capture(&self.duel)
    }

    /// Restore a snapshot, then re-normalize ownership.
    pub fn restore_zone_snapshot(&mut self, snapshot: &ZoneSnapshot) {
        let restored = snapshot.restore(&mut self.duel);
        normalize_zone_card_ownership(&mut self.duel, true);
        debug!(restored, "zone snapshot restored");
    }

    fn commit_zone_op(&mut self, label: &str, meta: ZoneOpMeta) -> Result<(), EngineError> {
        normalize_zone_card_ownership(&mut self.duel, meta.enforce_zone_owner);
        let report = self.check_invariants(label)?;
        if report.has_critical {
            return Err(EngineError::InvariantViolation {
                context: label.to_string(),
                issues: report.critical_issues,
            });
        }
        Ok(())
    }

    fn rollback_zone_op(&mut self, label: &str, snapshot: &ZoneSnapshot, err: EngineError) -> EngineError {
        self.restore_zone_snapshot(snapshot);
        self.force_clear_target_selection("rollback");

        let presenter = Rc::clone(&self.presenter);
        presenter.render(&self.duel);

        if let Err(check) = self.check_invariants(&format!("{label}:rollback")) {
            warn!(label, error = %check, "state still invalid after rollback");
        }

        self.tx_stats.rollbacks += 1;
        let reason = err.to_string();
        info!(label, reason = %reason, "zone op rolled back");
        EngineError::RolledBack {
            label: label.to_string(),
            reason,
        }
    }
}

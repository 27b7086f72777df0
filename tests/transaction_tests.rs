//! Zone transaction integration tests.
//!
//! These tests verify that root zone operations restore every zone and card
//! field on failure, that nesting rolls back exactly once, and that commit
//! validation catches duplicated cards.

mod common;

use common::{engine, monster, occurrences, p0, p1};
use rust_duel::core::{DuelConfig, ZoneKind};
use rust_duel::engine::{InvariantOptions, IssueCode, ZoneOpMeta};
use rust_duel::zones::{compare_zone_snapshot, ZonePosition};
use rust_duel::{Engine, EngineError};

/// A card moved hand -> field by a failing operation ends up back in hand.
#[test]
fn test_failed_op_returns_card_to_hand() {
    let mut engine = engine();
    let card = monster(&mut engine, p0(), ZoneKind::Hand, 1000, 1000);

    let result: Result<(), EngineError> = engine.run_zone_op("summon", ZoneOpMeta::default(), |e| {
        e.duel.move_card(card, p0(), ZoneKind::Field, ZonePosition::Top)?;
        Err(EngineError::effect("cost could not be paid"))
    });

    let err = result.unwrap_err();
    assert!(err.is_rolled_back());
    assert_eq!(err.to_string(), "cost could not be paid");
    assert!(engine.duel.is_in(card, p0(), ZoneKind::Hand));
    assert_eq!(engine.duel.zones(p0()).len(ZoneKind::Field), 0);
    assert_eq!(engine.zone_op_depth(), 0);
}

/// Zones and card fields after a rollback match a snapshot taken before.
#[test]
fn test_rollback_round_trip() {
    let mut engine = engine();
    let a = monster(&mut engine, p0(), ZoneKind::Field, 1500, 1000);
    let b = monster(&mut engine, p1(), ZoneKind::Field, 1200, 800);
    let c = monster(&mut engine, p0(), ZoneKind::Hand, 900, 900);
    engine.duel.card_mut(a).unwrap().add_counters("spell", 1);
    let before = engine.capture_zone_snapshot();
    let cards_before = engine.duel.cards.clone();

    let _ = engine.run_zone_op("mess", ZoneOpMeta::default(), |e| {
        e.duel.move_card(b, p0(), ZoneKind::Field, ZonePosition::Top)?;
        e.duel.send_to_graveyard(a)?;
        e.duel.move_card(c, p0(), ZoneKind::Field, ZonePosition::Bottom)?;
        e.duel.card_mut(c).unwrap().flags.attack_delta = 700;
        e.duel.card_mut(b).unwrap().add_counters("wedge", 3);
        Err::<(), _>(EngineError::effect("abort"))
    });

    let after = engine.capture_zone_snapshot();
    assert!(compare_zone_snapshot(&before, &after, p0()));
    assert!(compare_zone_snapshot(&before, &after, p1()));
    assert_eq!(engine.duel.cards, cards_before);
    assert_eq!(engine.transaction_stats().rollbacks, 1);
}

/// Failures inside nested operations roll back once, at the root.
#[test]
fn test_nested_failure_rolls_back_once() {
    let mut engine = engine();
    let card = monster(&mut engine, p0(), ZoneKind::Hand, 1000, 1000);

    let result = engine.run_zone_op("outer", ZoneOpMeta::default(), |e| {
        e.duel.move_card(card, p0(), ZoneKind::Field, ZonePosition::Top)?;
        e.run_zone_op("inner", ZoneOpMeta::default(), |e| {
            assert_eq!(e.zone_op_depth(), 2);
            e.duel.send_to_graveyard(card)?;
            Err::<(), _>(EngineError::effect("inner failed"))
        })
    });

    assert!(result.unwrap_err().is_rolled_back());
    let stats = engine.transaction_stats();
    assert_eq!(stats.roots, 1);
    assert_eq!(stats.rollbacks, 1);
    assert_eq!(stats.commits, 0);
    assert!(engine.duel.is_in(card, p0(), ZoneKind::Hand));
}

/// A nested failure the outer operation handles does not undo anything.
#[test]
fn test_handled_nested_failure_commits() {
    let mut engine = engine();
    let card = monster(&mut engine, p0(), ZoneKind::Hand, 1000, 1000);

    let result = engine.run_zone_op("outer", ZoneOpMeta::default(), |e| {
        e.duel.move_card(card, p0(), ZoneKind::Field, ZonePosition::Top)?;
        let inner: Result<(), EngineError> =
            e.run_zone_op("inner", ZoneOpMeta::default(), |_| Err(EngineError::effect("optional step")));
        assert!(!inner.unwrap_err().is_rolled_back());
        Ok(())
    });

    assert!(result.is_ok());
    assert!(engine.duel.is_in(card, p0(), ZoneKind::Field));
    assert_eq!(engine.transaction_stats().commits, 1);
}

/// A card left in two zones fails commit validation and is restored to one.
#[test]
fn test_no_ghost_duplication() {
    let mut engine = engine();
    let card = monster(&mut engine, p0(), ZoneKind::Field, 1000, 1000);

    let result = engine.run_zone_op("copy", ZoneOpMeta::default(), |e| {
        e.duel.zones_mut(p0()).insert(ZoneKind::Graveyard, card, ZonePosition::Top);
        Ok(())
    });

    match result {
        Err(EngineError::RolledBack { reason, .. }) => assert!(reason.contains("card_in_multiple_zones")),
        other => panic!("expected a rollback, got {other:?}"),
    }
    assert_eq!(occurrences(&engine.duel, card), 1);
    assert!(engine.duel.is_in(card, p0(), ZoneKind::Field));
}

/// Commit hands a card to the seat whose zone holds it.
#[test]
fn test_commit_normalizes_ownership() {
    let mut engine = engine();
    let card = monster(&mut engine, p0(), ZoneKind::Field, 1000, 1000);

    engine
        .run_zone_op("steal", ZoneOpMeta::default(), |e| {
            e.duel.zones_mut(p0()).remove(card);
            e.duel.zones_mut(p1()).insert(ZoneKind::Field, card, ZonePosition::Top);
            Ok(())
        })
        .unwrap();

    let instance = engine.duel.card(card).unwrap();
    assert_eq!(instance.controller_id(), Some(p1()));
    assert_eq!(instance.owner_id(), Some(p1()));
}

#[test]
fn test_fail_fast_check() {
    let mut engine = Engine::headless(DuelConfig::default().with_capacities(1, 1));
    let a = monster(&mut engine, p0(), ZoneKind::Field, 1000, 1000);
    let b = monster(&mut engine, p0(), ZoneKind::Hand, 1000, 1000);
    engine.duel.zones_mut(p0()).remove(b);
    engine.duel.zones_mut(p0()).insert(ZoneKind::Field, b, ZonePosition::Top);

    let report = engine
        .assert_state_invariants("audit", InvariantOptions::default())
        .unwrap();
    assert!(report.has_critical);
    assert_eq!(report.with_code(IssueCode::FieldOverCapacity).count(), 1);

    let strict = InvariantOptions {
        fail_fast: true,
        ..InvariantOptions::default()
    };
    let err = engine.assert_state_invariants("audit", strict).unwrap_err();
    assert!(matches!(err, EngineError::InvariantViolation { .. }));
    assert!(engine.duel.is_in(a, p0(), ZoneKind::Field));
}

//! Property test: any sequence of moves inside a failing zone operation
//! leaves zones and cards exactly as they were.

mod common;

use common::{engine, monster, p0, p1};
use proptest::prelude::*;
use rust_duel::core::{PlayerId, ZoneKind};
use rust_duel::engine::ZoneOpMeta;
use rust_duel::zones::{compare_zone_snapshot, ZonePosition};
use rust_duel::EngineError;

const ZONES: [ZoneKind; 4] = [ZoneKind::Hand, ZoneKind::Field, ZoneKind::Graveyard, ZoneKind::Deck];

#[derive(Clone, Debug)]
struct Move {
    card: usize,
    seat: u8,
    zone: usize,
    top: bool,
    bump_attack: i64,
}

fn move_strategy() -> impl Strategy<Value = Move> {
    (0..6usize, 0..2u8, 0..ZONES.len(), any::<bool>(), -500..500i64).prop_map(
        |(card, seat, zone, top, bump_attack)| Move {
            card,
            seat,
            zone,
            top,
            bump_attack,
        },
    )
}

proptest! {
    #[test]
    fn failed_op_restores_everything(moves in prop::collection::vec(move_strategy(), 1..20)) {
        let mut engine = engine();
        let mut cards = Vec::new();
        for (i, zone) in [ZoneKind::Hand, ZoneKind::Field, ZoneKind::Deck].into_iter().enumerate() {
            cards.push(monster(&mut engine, p0(), zone, 1000 + i as i64 * 100, 800));
            cards.push(monster(&mut engine, p1(), zone, 1100 + i as i64 * 100, 900));
        }
        let before = engine.capture_zone_snapshot();
        let cards_before = engine.duel.cards.clone();

        let result = engine.run_zone_op("shuffle_about", ZoneOpMeta::default(), |e| {
            for m in &moves {
                let card = cards[m.card];
                let position = if m.top { ZonePosition::Top } else { ZonePosition::Bottom };
                let _ = e.duel.move_card(card, PlayerId::new(m.seat), ZONES[m.zone], position);
                if let Some(instance) = e.duel.card_mut(card) {
                    instance.flags.attack_delta += m.bump_attack;
                    instance.add_counters("moved", 1);
                }
            }
            Err::<(), _>(EngineError::effect("abandoned"))
        });

        prop_assert!(result.unwrap_err().is_rolled_back());
        let after = engine.capture_zone_snapshot();
        prop_assert!(compare_zone_snapshot(&before, &after, p0()));
        prop_assert!(compare_zone_snapshot(&before, &after, p1()));
        prop_assert_eq!(&engine.duel.cards, &cards_before);
    }
}

//! Benchmarks for zone snapshots and rolled-back zone operations.
//!
//! Run with: `cargo bench --bench snapshot`

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_duel::{
    CardId, CardInstance, DuelConfig, Engine, EngineError, EntityId, PlayerId, ZoneKind, ZoneOpMeta, ZonePosition,
};

/// An engine with `per_seat` cards in each seat's deck plus a small board.
fn populated(per_seat: usize) -> Engine {
    let mut engine = Engine::headless(DuelConfig::default());
    for player in PlayerId::all() {
        for i in 0..per_seat {
            let card = CardInstance::monster(EntityId(0), CardId::new(i as u32), "Filler", player, 1000, 1000);
            let _ = engine.duel.spawn_card(card, player, ZoneKind::Deck);
        }
        for _ in 0..3 {
            let card = CardInstance::monster(EntityId(0), CardId::new(0), "Guard", player, 1500, 1200);
            let _ = engine.duel.spawn_card(card, player, ZoneKind::Field);
        }
    }
    engine
}

fn benchmark_capture(c: &mut Criterion) {
    let mut group = c.benchmark_group("Snapshot");

    for size in [40, 200, 1000] {
        let engine = populated(size);
        group.bench_with_input(BenchmarkId::new("capture", size), &engine, |b, engine| {
            b.iter(|| black_box(engine.capture_zone_snapshot()));
        });

        let mut engine = populated(size);
        let snapshot = engine.capture_zone_snapshot();
        group.bench_with_input(BenchmarkId::new("restore", size), &snapshot, |b, snapshot| {
            b.iter(|| engine.restore_zone_snapshot(black_box(snapshot)));
        });
    }
    group.finish();
}

fn benchmark_rollback(c: &mut Criterion) {
    let mut engine = populated(40);
    let p0 = PlayerId::new(0);

    c.bench_function("rolled_back_draw_and_summon", |b| {
        b.iter(|| {
            let result = engine.run_zone_op("bench", ZoneOpMeta::default(), |e| {
                let card = e.duel.draw_card(p0)?;
                e.duel.move_card(card, p0, ZoneKind::Field, ZonePosition::Top)?;
                Err::<(), _>(EngineError::effect("bench"))
            });
            black_box(result)
        });
    });
}

criterion_group!(benches, benchmark_capture, benchmark_rollback);
criterion_main!(benches);

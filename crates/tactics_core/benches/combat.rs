//! Combat benchmarks for tactics_core.
//!
//! Run with: `cargo bench -p tactics_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tactics_core::combat::resolve_attack;
use tactics_core::prelude::*;
use tactics_test_utils::fixtures::{controller, fixed_f, oracle_war_catalog, skirmish};

/// Measures a single attack resolution between two catalog units.
pub fn resolve_benchmark(c: &mut Criterion) {
    let catalog = oracle_war_catalog();
    let (Some(cavalry), Some(archer)) = (catalog.unit("cavalry"), catalog.unit("archer")) else {
        return;
    };
    let mut attacker = Unit::from_template(UnitId(1), cavalry, Faction::Enemy, GridPos::new(0, 0));
    attacker.move_distance = 4;
    let defender = Unit::from_template(UnitId(2), archer, Faction::Player, GridPos::new(0, 1));

    c.bench_function("resolve_attack", |b| {
        b.iter(|| resolve_attack(black_box(&attacker), black_box(&defender), black_box(fixed_f(0.25))));
    });
}

/// Measures a whole synchronous enemy turn on a crowded field.
pub fn enemy_turn_benchmark(c: &mut Criterion) {
    let player: Vec<Placement> = (0..12)
        .map(|col| Placement::new("infantry", 15, col))
        .collect();
    let enemy: Vec<Placement> = (0..12)
        .flat_map(|col| [Placement::new("cavalry", 0, col), Placement::new("militia", 1, col)])
        .collect();
    let start = controller(oracle_war_catalog(), skirmish(16, 12, player, enemy));

    c.bench_function("enemy_turn_24_units", |b| {
        b.iter_batched(
            || start.clone(),
            |mut tc| {
                let _ = tc.end_turn();
                black_box(tc.tick(0))
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, resolve_benchmark, enemy_turn_benchmark);
criterion_main!(benches);

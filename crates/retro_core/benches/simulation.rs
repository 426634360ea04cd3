//! Simulation benchmarks for retro_core.
//!
//! Run with: `cargo bench -p retro_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use retro_core::config::SimConfig;
use retro_core::math::Vec2Fixed;
use retro_core::pathfinding::find_path;
use retro_core::simulation::{GameState, TickIntents};
use retro_core::world::{GridCell, WorldBounds};

/// Pathfinding across the classic arena and a larger grid.
pub fn pathfinding_benchmark(c: &mut Criterion) {
    let arena = WorldBounds::new(16, 16);
    c.bench_function("find_path 16x16 corner to player", |b| {
        b.iter(|| find_path(&arena, black_box(GridCell::new(14, 14)), black_box(GridCell::new(5, 4))));
    });

    let large = WorldBounds::new(128, 128);
    c.bench_function("find_path 128x128 diagonal", |b| {
        b.iter(|| find_path(&large, black_box(GridCell::new(0, 0)), black_box(GridCell::new(127, 127))));
    });
}

/// Whole ticks of the classic opening with the player strafing and firing.
pub fn step_benchmark(c: &mut Criterion) {
    c.bench_function("step classic 300 ticks", |b| {
        b.iter(|| {
            let mut state = GameState::new_default(SimConfig::default()).unwrap();
            for tick in 0..300u64 {
                let direction = if (tick / 30) % 2 == 0 {
                    Vec2Fixed::from_ints(0, 1)
                } else {
                    Vec2Fixed::from_ints(0, -1)
                };
                state.step(TickIntents {
                    move_direction: direction,
                    fire: true,
                });
            }
            black_box(state.state_hash())
        });
    });
}

criterion_group!(benches, pathfinding_benchmark, step_benchmark);
criterion_main!(benches);

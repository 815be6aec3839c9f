//! Simulation benchmarks for flotilla_core.
//!
//! Run with: `cargo bench -p flotilla_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use flotilla_core::geometry::Aabb;
use flotilla_core::math::{Fixed, Vec2Fixed};
use flotilla_core::navigation::{NavConfig, NavigationMode};
use flotilla_core::prelude::Team;
use flotilla_core::world::{InputIntents, ShipPlacement, World, WorldConfig};

fn vec2(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::new(Fixed::from_num(x), Fixed::from_num(y))
}

fn tick_dt() -> Fixed {
    Fixed::ONE / Fixed::from_num(20)
}

/// Tick the default skirmish world: combat, projectiles and collision.
fn bench_world_tick(c: &mut Criterion) {
    c.bench_function("world_tick_default_skirmish", |b| {
        let mut world = World::new(WorldConfig::default()).unwrap();
        let idle = InputIntents::default();
        b.iter(|| {
            world.tick(black_box(&idle), tick_dt()).unwrap();
        });
    });
}

/// Build the visibility graph over the default obstacle layout.
fn bench_graph_build(c: &mut Criterion) {
    c.bench_function("visibility_graph_build", |b| {
        let config = WorldConfig::default();
        b.iter(|| {
            let world = World::new(black_box(config.clone())).unwrap();
            black_box(world);
        });
    });
}

/// Rebuild the distance field for a fresh order target each iteration.
fn bench_field_rebuild(c: &mut Criterion) {
    c.bench_function("distance_field_rebuild", |b| {
        // A single-team fleet so no combat thins the selection mid-run.
        let config = WorldConfig {
            nav: NavConfig {
                mode: NavigationMode::DistanceField,
                ..NavConfig::default()
            },
            initial_ships: (0..8)
                .map(|i| ShipPlacement {
                    team: Team::Ally,
                    position: vec2(2 * i - 8, -20),
                })
                .collect(),
            ..WorldConfig::default()
        };
        let mut world = World::new(config).unwrap();

        // Select everything once so each order dispatch rebuilds the field.
        let select = InputIntents {
            selection_box: Some(Aabb {
                min: vec2(-32, -32),
                max: vec2(32, 32),
            }),
            move_order_target: None,
        };
        world.tick(&select, tick_dt()).unwrap();

        let order = InputIntents {
            selection_box: None,
            move_order_target: Some(vec2(20, 20)),
        };
        b.iter(|| {
            world.tick(black_box(&order), tick_dt()).unwrap();
        });
    });
}

criterion_group!(benches, bench_world_tick, bench_graph_build, bench_field_rebuild);
criterion_main!(benches);

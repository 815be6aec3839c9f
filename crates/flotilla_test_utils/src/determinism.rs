//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation produces
//! identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism the simulation must keep out:
//!
//! - **Floating-point math**: Different CPUs can produce different
//!   results. Fixed-point arithmetic via [`flotilla_core::math::Fixed`]
//!   is used throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Entity iteration always follows dense array order instead.
//!
//! - **System randomness**: no unseeded random calls anywhere in the
//!   core.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual system determinism
//! 2. **Property tests**: random inputs must still produce deterministic
//!    outputs
//! 3. **Integration tests**: full scenarios are reproducible
//! 4. **Parallel tests**: N simulations running in parallel all match

use std::thread;

use flotilla_core::math::Fixed;
use flotilla_core::world::{InputIntents, World};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed
    /// error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - number of times to run the simulation
/// * `ticks` - number of ticks to simulate per run
/// * `setup` - function creating the initial state
/// * `step` - function advancing the state by one tick
/// * `hash` - function computing the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Simplified determinism verification for [`World`].
///
/// Runs the world twice with identical setup, idle input and a 20 Hz
/// tick, and verifies the final state hashes match exactly.
pub fn verify_world_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> World,
{
    let dt = Fixed::ONE / Fixed::from_num(20);
    let result = verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |world| {
            world
                .tick(&InputIntents::default(), dt)
                .expect("tick must not fail in a determinism run");
        },
        World::state_hash,
    );
    result.is_deterministic
}

/// Run N worlds in parallel and verify their final hashes all match.
///
/// Catches non-determinism that only manifests under thread scheduling
/// variations or memory layout differences.
///
/// # Panics
///
/// Panics if the parallel runs diverge or a worker thread panics.
pub fn verify_parallel_world_determinism<F>(setup_fn: F, num_sims: usize, num_ticks: u64)
where
    F: Fn() -> World + Sync,
{
    let dt = Fixed::ONE / Fixed::from_num(20);

    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut world = setup_fn();
                    for _ in 0..num_ticks {
                        world
                            .tick(&InputIntents::default(), dt)
                            .expect("tick must not fail in a determinism run");
                    }
                    world.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let diverged = hashes.windows(2).any(|w| w[0] != w[1]);
    assert!(!diverged, "parallel worlds diverged: {hashes:?}");
}

/// Compare two world runs tick-by-tick, finding the first divergence.
///
/// Returns `None` if the runs are identical, `Some(tick)` for the first
/// tick at which the hashes differ.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> World,
{
    let dt = Fixed::ONE / Fixed::from_num(20);
    let mut world1 = setup_fn();
    let mut world2 = setup_fn();

    if world1.state_hash() != world2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        world1
            .tick(&InputIntents::default(), dt)
            .expect("tick must not fail in a determinism run");
        world2
            .tick(&InputIntents::default(), dt)
            .expect("tick must not fail in a determinism run");

        if world1.state_hash() != world2.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Verify that a snapshot round-trip preserves world state exactly.
pub fn verify_snapshot_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> World,
{
    let dt = Fixed::ONE / Fixed::from_num(20);
    let mut world = setup_fn();

    for _ in 0..num_ticks {
        if world.tick(&InputIntents::default(), dt).is_err() {
            return false;
        }
    }

    let hash_before = world.state_hash();

    let bytes = match world.serialize() {
        Ok(b) => b,
        Err(_) => return false,
    };

    let restored = match World::deserialize(&bytes) {
        Ok(w) => w,
        Err(_) => return false,
    };

    hash_before == restored.state_hash()
}

/// Proptest strategies for determinism testing.
pub mod strategies {
    use proptest::prelude::*;

    use flotilla_core::math::{Fixed, Vec2Fixed};
    use flotilla_core::prelude::Team;
    use flotilla_core::world::ShipPlacement;

    /// Generate a fixed-point coordinate inside the default world.
    pub fn arb_fixed_position() -> impl Strategy<Value = Fixed> {
        (-30i32..30i32).prop_map(Fixed::from_num)
    }

    /// Generate a fixed-point 2D position inside the default world.
    pub fn arb_vec2_position() -> impl Strategy<Value = Vec2Fixed> {
        (arb_fixed_position(), arb_fixed_position()).prop_map(|(x, y)| Vec2Fixed::new(x, y))
    }

    /// Generate a team.
    pub fn arb_team() -> impl Strategy<Value = Team> {
        prop_oneof![Just(Team::Ally), Just(Team::Enemy)]
    }

    /// Generate a ship placement.
    pub fn arb_ship_placement() -> impl Strategy<Value = ShipPlacement> {
        (arb_team(), arb_vec2_position())
            .prop_map(|(team, position)| ShipPlacement { team, position })
    }

    /// Generate a list of ship placements.
    pub fn arb_fleet(max_ships: usize) -> impl Strategy<Value = Vec<ShipPlacement>> {
        proptest::collection::vec(arb_ship_placement(), 1..max_ships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{single_obstacle_config, two_versus_one_config};
    use flotilla_core::navigation::NavigationMode;
    use flotilla_core::world::WorldConfig;
    use proptest::prelude::*;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_default_world_determinism() {
        assert!(verify_world_determinism(
            || World::new(WorldConfig::default()).unwrap(),
            100,
        ));
    }

    #[test]
    fn test_combat_world_determinism() {
        assert!(verify_world_determinism(
            || World::new(two_versus_one_config()).unwrap(),
            200,
        ));
    }

    #[test]
    fn test_both_nav_backends_deterministic() {
        for mode in [NavigationMode::VisibilityGraph, NavigationMode::DistanceField] {
            assert!(verify_world_determinism(
                move || World::new(single_obstacle_config(mode)).unwrap(),
                100,
            ));
        }
    }

    #[test]
    fn test_no_divergence_in_combat_scenario() {
        let divergence = find_first_divergence(
            || World::new(two_versus_one_config()).unwrap(),
            200,
        );
        assert!(divergence.is_none(), "diverged at {divergence:?}");
    }

    #[test]
    fn test_parallel_worlds_match() {
        verify_parallel_world_determinism(
            || World::new(two_versus_one_config()).unwrap(),
            4,
            200,
        );
    }

    #[test]
    fn test_snapshot_roundtrip() {
        assert!(verify_snapshot_determinism(
            || World::new(two_versus_one_config()).unwrap(),
            50,
        ));
    }

    proptest! {
        /// Any random fleet layout must simulate deterministically.
        #[test]
        fn prop_random_fleets_are_deterministic(
            fleet in strategies::arb_fleet(12),
        ) {
            let fleet_clone = fleet.clone();
            let setup = move || {
                World::new(WorldConfig {
                    initial_ships: fleet_clone.clone(),
                    initial_buildings: Vec::new(),
                    ..WorldConfig::default()
                })
                .unwrap()
            };

            prop_assert!(verify_world_determinism(setup, 50));
        }

        /// Snapshot round-trips preserve state for arbitrary fleets.
        #[test]
        fn prop_snapshot_roundtrip_is_exact(
            fleet in strategies::arb_fleet(8),
            num_ticks in 0u64..50,
        ) {
            let fleet_clone = fleet.clone();
            let setup = move || {
                World::new(WorldConfig {
                    initial_ships: fleet_clone.clone(),
                    initial_buildings: Vec::new(),
                    ..WorldConfig::default()
                })
                .unwrap()
            };

            prop_assert!(verify_snapshot_determinism(setup, num_ticks));
        }
    }
}

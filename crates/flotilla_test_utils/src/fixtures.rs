//! Test fixtures and helpers.
//!
//! Pre-built world configurations for consistent testing.

use fixed::types::I32F32;

use flotilla_core::math::Vec2Fixed;
use flotilla_core::navigation::{NavConfig, NavigationMode};
use flotilla_core::world::{BuildingPlacement, ShipPlacement, WorldConfig};
use flotilla_core::prelude::Team;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point vector from integers.
#[must_use]
pub fn vec2(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::new(fixed(x), fixed(y))
}

/// One simulation tick at the usual 20 Hz rate.
#[must_use]
pub fn tick_dt() -> I32F32 {
    I32F32::ONE / fixed(20)
}

/// Two allies facing one enemy, all inside firing range, no obstacles.
///
/// Used by the combat scenarios: the outnumbered enemy dies within a few
/// cooldown cycles while both allies survive.
#[must_use]
pub fn two_versus_one_config() -> WorldConfig {
    WorldConfig {
        initial_ships: vec![
            ShipPlacement {
                team: Team::Ally,
                position: vec2(-4, 0),
            },
            ShipPlacement {
                team: Team::Ally,
                position: vec2(4, 0),
            },
            ShipPlacement {
                team: Team::Enemy,
                position: vec2(0, 6),
            },
        ],
        initial_buildings: Vec::new(),
        ..WorldConfig::default()
    }
}

/// A single ship west of a single rectangular building, with the given
/// navigation backend.
///
/// Move orders issued to the far side of the building must route (or
/// gradient-steer) around it.
#[must_use]
pub fn single_obstacle_config(mode: NavigationMode) -> WorldConfig {
    WorldConfig {
        nav: NavConfig {
            mode,
            ..NavConfig::default()
        },
        initial_ships: vec![ShipPlacement {
            team: Team::Ally,
            position: vec2(-15, 0),
        }],
        initial_buildings: vec![BuildingPlacement {
            position: vec2(0, 0),
            size: vec2(8, 8),
        }],
        ..WorldConfig::default()
    }
}

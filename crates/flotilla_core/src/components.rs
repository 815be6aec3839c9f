//! Entity definitions: ships, projectiles and buildings.
//!
//! Entities are pure data; behavior lives in the tick systems
//! ([`crate::combat`], [`crate::physics`]) and in the navigation engines.

use serde::{Deserialize, Serialize};

use crate::geometry::Aabb;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::navigation::Route;

/// Persistent ship identifier.
///
/// Issued by a monotonically increasing counter and never reused. The two
/// largest values are reserved as registry sentinels and are never issued.
pub type ShipId = u32;

/// Team affiliation. Combat targeting and friendly-fire exemption both
/// key off this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// Player-controlled ships.
    Ally,
    /// Hostile ships.
    Enemy,
}

/// A ship: the mobile, damageable, order-taking unit of the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    /// Unique, immutable identifier.
    pub id: ShipId,
    /// Team affiliation.
    pub team: Team,
    /// World position (center).
    pub position: Vec2Fixed,
    /// Facing angle in radians.
    #[serde(with = "fixed_serde")]
    pub rotation: Fixed,
    /// Box extents (full width/height).
    pub size: Vec2Fixed,
    /// Current velocity (world units per second).
    pub velocity: Vec2Fixed,
    /// Hit points. The ship is destroyed when this drops to zero or below.
    pub health: i32,
    /// Seconds between shots.
    #[serde(with = "fixed_serde")]
    pub fire_cooldown: Fixed,
    /// Countdown until the next shot; ready at zero or below.
    #[serde(with = "fixed_serde")]
    pub fire_timer: Fixed,
    /// Active move order, if any.
    pub move_order: Option<Route>,
}

impl Ship {
    /// The ship's collision box at its current position.
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_size(self.position, self.size)
    }

    /// Whether the ship's health has been depleted.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.health <= 0
    }
}

/// Parameters for spawning a ship. The store assigns the ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipSpawnParams {
    /// Team affiliation.
    pub team: Team,
    /// Initial world position.
    pub position: Vec2Fixed,
    /// Box extents.
    pub size: Vec2Fixed,
    /// Starting hit points.
    pub health: i32,
    /// Seconds between shots.
    #[serde(with = "fixed_serde")]
    pub fire_cooldown: Fixed,
}

/// A projectile in flight.
///
/// `owner` is a weak reference: the owning ship may be destroyed while the
/// projectile is still traveling, and consumers must treat a failed owner
/// lookup as a normal condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projectile {
    /// Ship that fired this projectile.
    pub owner: ShipId,
    /// Team copied from the owner at spawn time, for the friendly-fire
    /// exemption.
    pub team: Team,
    /// Damage dealt on impact.
    pub damage: i32,
    /// World position (center).
    pub position: Vec2Fixed,
    /// Box extents.
    pub size: Vec2Fixed,
    /// Current velocity (world units per second).
    pub velocity: Vec2Fixed,
}

impl Projectile {
    /// The projectile's collision box at its current position.
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_size(self.position, self.size)
    }
}

/// A static obstacle. Created at world init and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    /// World position (center).
    pub position: Vec2Fixed,
    /// Box extents.
    pub size: Vec2Fixed,
}

impl Building {
    /// The building's footprint box.
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_size(self.position, self.size)
    }
}

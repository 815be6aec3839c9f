//! Combat system: fire-cooldown state machine and target acquisition.
//!
//! Each ship runs a countdown timer. When it expires the ship looks for
//! the nearest living enemy and, if one exists, fires a projectile at the
//! enemy's current position (no lead prediction) and resets the timer. If
//! no enemy exists the expired timer is left alone and the search retries
//! next tick, so no cooldown time is wasted waiting out an empty field.

use serde::{Deserialize, Serialize};

use crate::components::{Projectile, Ship, ShipId};
use crate::error::Result;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::store::{DenseStore, ShipStore};

/// Weapon tuning shared by every ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponConfig {
    /// Damage each projectile deals on impact.
    pub projectile_damage: i32,
    /// Projectile travel speed in world units per second.
    #[serde(with = "fixed_serde")]
    pub projectile_speed: Fixed,
    /// Projectile box extents.
    pub projectile_size: Vec2Fixed,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            projectile_damage: 1,
            projectile_speed: Fixed::from_num(5),
            projectile_size: Vec2Fixed::splat(Fixed::ONE / Fixed::from_num(10)),
        }
    }
}

/// Advance fire timers and spawn projectiles for ready ships.
///
/// # Errors
///
/// Returns [`crate::error::SimError::CapacityExceeded`] if the projectile
/// store fills up mid-volley.
pub fn tick_combat(
    ships: &mut ShipStore,
    projectiles: &mut DenseStore<Projectile>,
    weapons: &WeaponConfig,
    dt: Fixed,
) -> Result<()> {
    for index in 0..ships.len() {
        let (ready, shooter_id) = {
            let ship = &ships.as_slice()[index];
            (ship.fire_timer <= Fixed::ZERO, ship.id)
        };

        if !ready {
            let ship = &mut ships.as_mut_slice()[index];
            ship.fire_timer -= dt;
            continue;
        }

        let Some(target_position) = find_nearest_enemy(ships.as_slice(), index) else {
            continue;
        };

        let shooter = &ships.as_slice()[index];
        let direction = (target_position - shooter.position).normalize();
        if direction == Vec2Fixed::ZERO {
            // Shooter and target are exactly stacked; hold fire this tick
            // rather than launch a projectile with no heading.
            continue;
        }

        projectiles.push(Projectile {
            owner: shooter_id,
            team: shooter.team,
            damage: weapons.projectile_damage,
            position: shooter.position,
            size: weapons.projectile_size,
            velocity: direction.scale(weapons.projectile_speed),
        })?;

        let ship = &mut ships.as_mut_slice()[index];
        ship.fire_timer = ship.fire_cooldown;
    }

    Ok(())
}

/// Position of the nearest living enemy of `ships[index]`.
///
/// Squared-distance comparison; ties go to the first candidate in array
/// order. Returns `None` when no enemy is alive.
#[must_use]
pub fn find_nearest_enemy(ships: &[Ship], index: usize) -> Option<Vec2Fixed> {
    let shooter = &ships[index];

    let mut nearest: Option<Vec2Fixed> = None;
    let mut min_dist = Fixed::MAX;

    for candidate in ships {
        if candidate.team == shooter.team {
            continue;
        }

        let dist = candidate.position.distance_squared(shooter.position);
        if dist < min_dist {
            nearest = Some(candidate.position);
            min_dist = dist;
        }
    }

    nearest
}

/// A projectile impact that dealt damage this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageEvent {
    /// Ship that was hit.
    pub target: ShipId,
    /// Damage dealt.
    pub damage: i32,
}

//! Physics tick: kinematic integration and AABB collision resolution.
//!
//! Integration is semi-implicit Euler with zero acceleration - ships and
//! projectiles are velocity-driven, not force-driven. Collision response
//! resolves interpenetrating boxes along the axis of smaller penetration
//! and zeroes the velocity component on that axis for whichever body
//! yields; buildings never move.

use crate::combat::DamageEvent;
use crate::components::{Building, Projectile, ShipId};
use crate::error::Result;
use crate::geometry::Aabb;
use crate::math::{Fixed, Vec2Fixed};
use crate::store::{DenseStore, ShipStore};

/// Deaths and impacts produced by one physics pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhysicsEvents {
    /// Ships destroyed this tick, in destruction order.
    pub deaths: Vec<ShipId>,
    /// Projectile impacts that dealt damage.
    pub damage_events: Vec<DamageEvent>,
}

/// Integrate positions and resolve all collisions for one tick.
///
/// # Errors
///
/// This pass only removes entities, so it cannot hit a capacity error;
/// the `Result` is part of the tick-system contract and currently always
/// succeeds.
pub fn tick_physics(
    ships: &mut ShipStore,
    projectiles: &mut DenseStore<Projectile>,
    buildings: &[Building],
    dt: Fixed,
) -> Result<PhysicsEvents> {
    let mut events = PhysicsEvents::default();

    integrate(ships, projectiles, dt);
    collide_projectiles(ships, projectiles, buildings, &mut events);
    collide_ships_with_buildings(ships, buildings);
    collide_ships_with_ships(ships);

    Ok(events)
}

/// Advance every position by its velocity. Acceleration is always zero
/// here, so the quadratic term of the integrator drops out.
fn integrate(ships: &mut ShipStore, projectiles: &mut DenseStore<Projectile>, dt: Fixed) {
    for projectile in projectiles.iter_mut() {
        projectile.position = projectile.position + projectile.velocity.scale(dt);
    }

    for ship in ships.as_mut_slice() {
        ship.position = ship.position + ship.velocity.scale(dt);
    }
}

/// Projectile-vs-building and projectile-vs-ship collision.
///
/// Destroying a projectile swaps the last live one into the current slot,
/// so the loop only advances its index when the current projectile
/// survived the tick.
fn collide_projectiles(
    ships: &mut ShipStore,
    projectiles: &mut DenseStore<Projectile>,
    buildings: &[Building],
    events: &mut PhysicsEvents,
) {
    let mut index = 0;
    while index < projectiles.len() {
        let projectile = *projectiles
            .get(index)
            .expect("index is bounded by the live count");
        let projectile_box = projectile.aabb();

        let mut destroyed = false;

        for building in buildings {
            if projectile_box.overlaps(&building.aabb()) {
                projectiles.swap_remove(index);
                destroyed = true;
                break;
            }
        }

        if !destroyed {
            for ship_index in 0..ships.len() {
                let (ship_id, ship_team, ship_box) = {
                    let ship = &ships.as_slice()[ship_index];
                    (ship.id, ship.team, ship.aabb())
                };

                if ship_id == projectile.owner {
                    continue;
                }

                if projectile_box.overlaps(&ship_box) {
                    // Friendly fire is disabled, but a friendly hit still
                    // consumes the projectile.
                    if ship_team != projectile.team {
                        apply_damage(ships, ship_id, projectile.damage, events);
                    }

                    projectiles.swap_remove(index);
                    destroyed = true;
                    break;
                }
            }
        }

        if !destroyed {
            index += 1;
        }
    }
}

/// Damage a ship, destroying it on depletion.
fn apply_damage(ships: &mut ShipStore, id: ShipId, damage: i32, events: &mut PhysicsEvents) {
    let Some(ship) = ships.get_mut(id) else {
        // Already gone; a stale hit is a no-op.
        return;
    };

    ship.health -= damage;
    events.damage_events.push(DamageEvent { target: id, damage });

    if ship.is_dead() {
        ships
            .destroy(id)
            .expect("a ship that was just damaged must be destroyable");
        events.deaths.push(id);
    }
}

/// Push ships out of building footprints. Buildings are immovable, so the
/// ship takes the whole correction, half the penetration per tick.
fn collide_ships_with_buildings(ships: &mut ShipStore, buildings: &[Building]) {
    for ship in ships.as_mut_slice() {
        for building in buildings {
            let ship_box = ship.aabb();
            let building_box = building.aabb();

            if !ship_box.overlaps(&building_box) {
                continue;
            }

            let penetration = penetration_depths(&ship_box, &building_box);
            if penetration.x > penetration.y {
                ship.velocity.x = Fixed::ZERO;
                if ship.position.x < building.position.x {
                    ship.position.x += penetration.x / Fixed::from_num(2);
                } else {
                    ship.position.x -= penetration.x / Fixed::from_num(2);
                }
            } else {
                ship.velocity.y = Fixed::ZERO;
                if ship.position.y < building.position.y {
                    ship.position.y += penetration.y / Fixed::from_num(2);
                } else {
                    ship.position.y -= penetration.y / Fixed::from_num(2);
                }
            }
        }
    }
}

/// Separate interpenetrating ship pairs symmetrically.
///
/// The resolution axis is the one with smaller penetration. The ship
/// moving slower along that axis has its velocity component zeroed (the
/// faster one keeps its momentum) and both are pushed apart by half the
/// penetration each.
fn collide_ships_with_ships(ships: &mut ShipStore) {
    let count = ships.len();
    if count < 2 {
        return;
    }

    let slice = ships.as_mut_slice();
    for i in 0..count - 1 {
        for j in i + 1..count {
            let (left, right) = slice.split_at_mut(j);
            let a = &mut left[i];
            let b = &mut right[0];

            let a_box = a.aabb();
            let b_box = b.aabb();
            if !a_box.overlaps(&b_box) {
                continue;
            }

            let penetration = penetration_depths(&a_box, &b_box);
            if penetration.x > penetration.y {
                if a.velocity.x.abs() > b.velocity.x.abs() {
                    b.velocity.x = Fixed::ZERO;
                } else {
                    a.velocity.x = Fixed::ZERO;
                }

                let half = penetration.x / Fixed::from_num(2);
                if a.position.x < b.position.x {
                    a.position.x += half;
                    b.position.x -= half;
                } else {
                    a.position.x -= half;
                    b.position.x += half;
                }
            } else {
                if a.velocity.y.abs() > b.velocity.y.abs() {
                    b.velocity.y = Fixed::ZERO;
                } else {
                    a.velocity.y = Fixed::ZERO;
                }

                let half = penetration.y / Fixed::from_num(2);
                if a.position.y < b.position.y {
                    a.position.y += half;
                    b.position.y -= half;
                } else {
                    a.position.y -= half;
                    b.position.y += half;
                }
            }
        }
    }
}

/// Signed per-axis penetration between two overlapping boxes.
///
/// Both components are negative while the boxes overlap; the axis with
/// the larger (closer to zero) component is the short way out.
fn penetration_depths(a: &Aabb, b: &Aabb) -> Vec2Fixed {
    let a_center = a.center();
    let a_half = a.half_extents();
    let b_center = b.center();
    let b_half = b.half_extents();

    (b_center - a_center).abs() - (a_half + b_half)
}

//! The world: owned simulation state and the tick-boundary API.
//!
//! The host drives three entry points in a strict order each frame:
//! build once with [`World::new`], advance with [`World::tick`], then read
//! [`World::render_state`]. All state is owned by the `World` value -
//! there are no process-wide singletons - and a single tick is one
//! synchronous pass: order intake, steering, combat, physics. Navigation
//! queries block inside the tick; issuing a new move order simply
//! replaces the previous route.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::combat::{tick_combat, WeaponConfig};
use crate::components::{Building, Projectile, Ship, ShipId, ShipSpawnParams, Team};
use crate::error::{Result, SimError};
use crate::geometry::Aabb;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};
use crate::navigation::{NavConfig, NavDebug, Navigator, Route, Steering};
use crate::physics::tick_physics;
use crate::selection::{select_ships, Camera};
use crate::store::{DenseStore, ShipStore};

/// Initial placement of one ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipPlacement {
    /// Team affiliation.
    pub team: Team,
    /// Spawn position.
    pub position: Vec2Fixed,
}

/// Initial placement of one building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingPlacement {
    /// Center position.
    pub position: Vec2Fixed,
    /// Footprint extents.
    pub size: Vec2Fixed,
}

/// Everything needed to build a [`World`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Maximum concurrent ships.
    pub max_ships: usize,
    /// Maximum concurrent projectiles.
    pub max_projectiles: usize,
    /// Maximum buildings.
    pub max_buildings: usize,
    /// Registry bucket count (power of two, well above `max_ships`).
    pub registry_capacity: usize,
    /// Navigation backend and tuning.
    pub nav: NavConfig,
    /// Weapon tuning.
    pub weapons: WeaponConfig,
    /// Ship hit points at spawn.
    pub ship_health: i32,
    /// Ship box extents.
    pub ship_size: Vec2Fixed,
    /// Seconds between shots.
    #[serde(with = "fixed_serde")]
    pub fire_cooldown: Fixed,
    /// Ship travel speed in world units per second.
    #[serde(with = "fixed_serde")]
    pub move_speed: Fixed,
    /// Ships present at init.
    pub initial_ships: Vec<ShipPlacement>,
    /// Buildings present at init.
    pub initial_buildings: Vec<BuildingPlacement>,
}

impl Default for WorldConfig {
    /// A small two-team skirmish with four obstacles.
    fn default() -> Self {
        let mut initial_ships = Vec::new();
        for i in 0..5i32 {
            let x = Fixed::from_num(2 * i - 5);
            initial_ships.push(ShipPlacement {
                team: Team::Ally,
                position: Vec2Fixed::new(x, Fixed::from_num(-5)),
            });
            initial_ships.push(ShipPlacement {
                team: Team::Enemy,
                position: Vec2Fixed::new(x, Fixed::from_num(5)),
            });
        }

        let building = |x: i32, y: i32| BuildingPlacement {
            position: Vec2Fixed::new(Fixed::from_num(x), Fixed::from_num(y)),
            size: Vec2Fixed::splat(Fixed::from_num(2)),
        };

        Self {
            max_ships: 32,
            max_projectiles: 256,
            max_buildings: 16,
            registry_capacity: 4096,
            nav: NavConfig::default(),
            weapons: WeaponConfig::default(),
            ship_health: 5,
            ship_size: Vec2Fixed::splat(Fixed::ONE),
            fire_cooldown: Fixed::from_num(2),
            move_speed: Fixed::from_num(2),
            initial_ships,
            initial_buildings: vec![
                building(-10, 2),
                building(8, -6),
                building(12, 9),
                building(-4, 12),
            ],
        }
    }
}

/// Host intents for one tick, already mapped to world space.
///
/// Hosts translate raw input through [`crate::selection::screen_to_world`]
/// and [`crate::selection::world_selection_box`] before handing it over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputIntents {
    /// Replace the current selection with ships overlapping this box.
    pub selection_box: Option<Aabb>,
    /// Order the current selection to move to this point.
    pub move_order_target: Option<Vec2Fixed>,
}

/// Events produced by one tick for the host layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Ships destroyed this tick.
    pub deaths: Vec<ShipId>,
    /// Projectile impacts that dealt damage.
    pub damage_events: Vec<crate::combat::DamageEvent>,
}

/// One ship as the renderer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipView {
    /// Persistent ID.
    pub id: ShipId,
    /// Team affiliation.
    pub team: Team,
    /// World position.
    pub position: Vec2Fixed,
    /// Box extents.
    pub size: Vec2Fixed,
    /// Current hit points.
    pub health: i32,
    /// Whether the ship is in the current selection.
    pub selected: bool,
}

/// One sprite-sized quad as the renderer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuadView {
    /// World position.
    pub position: Vec2Fixed,
    /// Box extents.
    pub size: Vec2Fixed,
}

/// The polyline a ship still has to travel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteView {
    /// Ship following the route.
    pub ship: ShipId,
    /// Remaining waypoints, ending at the literal order target.
    pub points: Vec<Vec2Fixed>,
}

/// Read-only projection of the world for the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderState {
    /// Live ships.
    pub ships: Vec<ShipView>,
    /// Live projectiles.
    pub projectiles: Vec<QuadView>,
    /// Buildings.
    pub buildings: Vec<QuadView>,
    /// Remaining route polylines for ships under move orders.
    pub routes: Vec<RouteView>,
    /// Navigation debug geometry for the active backend.
    pub nav_debug: NavDebug,
}

/// The simulation world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    config: WorldConfig,
    tick: u64,
    camera: Camera,
    ships: ShipStore,
    projectiles: DenseStore<Projectile>,
    buildings: DenseStore<Building>,
    navigator: Navigator,
    selected: Vec<ShipId>,
}

impl World {
    /// Build a world from its configuration: allocate the fixed-capacity
    /// stores, seed the initial scene, and construct the navigation
    /// backend over the building layout.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::CapacityExceeded`] if the initial scene does
    /// not fit the configured capacities.
    pub fn new(config: WorldConfig) -> Result<Self> {
        let mut ships = ShipStore::new(config.max_ships, config.registry_capacity);
        let mut buildings = DenseStore::new("building store", config.max_buildings);

        for placement in &config.initial_buildings {
            buildings.push(Building {
                position: placement.position,
                size: placement.size,
            })?;
        }

        for placement in &config.initial_ships {
            ships.spawn(ShipSpawnParams {
                team: placement.team,
                position: placement.position,
                size: config.ship_size,
                health: config.ship_health,
                fire_cooldown: config.fire_cooldown,
            })?;
        }

        let navigator = Navigator::new(&config.nav, buildings.as_slice())?;
        let projectiles = DenseStore::new("projectile store", config.max_projectiles);

        Ok(Self {
            config,
            tick: 0,
            camera: Camera::default(),
            ships,
            projectiles,
            buildings,
            navigator,
            selected: Vec::new(),
        })
    }

    /// Current tick number.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// The world configuration.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Camera state, for the host to steer.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Camera state.
    #[must_use]
    pub const fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Live ships in dense slot order.
    #[must_use]
    pub fn ships(&self) -> &[Ship] {
        self.ships.as_slice()
    }

    /// Live projectiles.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        self.projectiles.as_slice()
    }

    /// Buildings.
    #[must_use]
    pub fn buildings(&self) -> &[Building] {
        self.buildings.as_slice()
    }

    /// IDs of the currently selected ships.
    #[must_use]
    pub fn selected(&self) -> &[ShipId] {
        &self.selected
    }

    /// Look up a ship by ID.
    #[must_use]
    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.ships.get(id)
    }

    /// Spawn a ship mid-game (reinforcements, tests).
    ///
    /// # Errors
    ///
    /// Returns [`SimError::CapacityExceeded`] if the ship store is full.
    pub fn spawn_ship(&mut self, params: ShipSpawnParams) -> Result<ShipId> {
        self.ships.spawn(params)
    }

    /// Destroy a ship by ID.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ShipNotFound`] if no ship has this ID.
    pub fn destroy_ship(&mut self, id: ShipId) -> Result<()> {
        self.ships.destroy(id)?;
        self.selected.retain(|&selected| selected != id);
        Ok(())
    }

    /// Advance the simulation by one tick of `dt` seconds.
    ///
    /// Pass order: selection intake, move-order intake, steering, combat,
    /// physics. The render collaborator reads the world only after this
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::CapacityExceeded`] if a store fills mid-tick;
    /// the tick is aborted at the failing pass.
    pub fn tick(&mut self, input: &InputIntents, dt: Fixed) -> Result<TickEvents> {
        self.intake_selection(input);
        self.intake_move_orders(input)?;
        self.steer_ships();

        tick_combat(
            &mut self.ships,
            &mut self.projectiles,
            &self.config.weapons,
            dt,
        )?;

        let physics = tick_physics(
            &mut self.ships,
            &mut self.projectiles,
            self.buildings.as_slice(),
            dt,
        )?;

        for death in &physics.deaths {
            self.selected.retain(|&selected| selected != *death);
        }

        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "world state hash");
        }

        Ok(TickEvents {
            deaths: physics.deaths,
            damage_events: physics.damage_events,
        })
    }

    /// Replace the selection when the host finished a drag.
    fn intake_selection(&mut self, input: &InputIntents) {
        if let Some(selection_box) = &input.selection_box {
            self.selected = select_ships(self.ships.as_slice(), selection_box);
            if !self.selected.is_empty() {
                tracing::debug!(count = self.selected.len(), "selected ships");
            }
        }
    }

    /// Dispatch a move order to every live selected ship.
    ///
    /// A ship that died since it was selected is skipped. A failed path
    /// query downgrades to direct-line steering rather than dropping the
    /// order.
    fn intake_move_orders(&mut self, input: &InputIntents) -> Result<()> {
        let Some(target) = input.move_order_target else {
            return Ok(());
        };

        for index in 0..self.selected.len() {
            let id = self.selected[index];
            let Some(ship) = self.ships.get(id) else {
                continue;
            };
            let start = ship.position;

            let route =
                match self
                    .navigator
                    .compute_route(self.buildings.as_slice(), start, target)
                {
                    Ok(route) => route,
                    Err(SimError::NoPath { .. }) => {
                        tracing::warn!(ship = id, "no path to order target, steering direct");
                        Route::Direct { target }
                    }
                    Err(err) => return Err(err),
                };

            if let Some(ship) = self.ships.get_mut(id) {
                ship.move_order = Some(route);
            }
        }

        Ok(())
    }

    /// Turn each active route into a velocity for this tick.
    fn steer_ships(&mut self) {
        let move_speed = self.config.move_speed;

        for ship in self.ships.as_mut_slice() {
            let Some(mut route) = ship.move_order.take() else {
                continue;
            };

            match self.navigator.next_waypoint(&mut route, ship.position) {
                Steering::Move(direction) => {
                    ship.velocity = direction.scale(move_speed);
                    ship.move_order = Some(route);
                }
                Steering::Arrived => {
                    ship.velocity = Vec2Fixed::ZERO;
                }
            }
        }
    }

    /// Read-only projection for the rendering collaborator.
    #[must_use]
    pub fn render_state(&self) -> RenderState {
        let ships = self
            .ships
            .as_slice()
            .iter()
            .map(|ship| ShipView {
                id: ship.id,
                team: ship.team,
                position: ship.position,
                size: ship.size,
                health: ship.health,
                selected: self.selected.contains(&ship.id),
            })
            .collect();

        let projectiles = self
            .projectiles
            .iter()
            .map(|projectile| QuadView {
                position: projectile.position,
                size: projectile.size,
            })
            .collect();

        let buildings = self
            .buildings
            .iter()
            .map(|building| QuadView {
                position: building.position,
                size: building.size,
            })
            .collect();

        let routes = self
            .ships
            .as_slice()
            .iter()
            .filter_map(|ship| {
                ship.move_order.as_ref().map(|route| RouteView {
                    ship: ship.id,
                    points: route.remaining_points(),
                })
            })
            .collect();

        RenderState {
            ships,
            projectiles,
            buildings,
            routes,
            nav_debug: self.navigator.debug_geometry(),
        }
    }

    /// Hash of the observable simulation state.
    ///
    /// Two worlds that evolved through identical inputs produce identical
    /// hashes; the determinism harness leans on this.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);

        self.ships.len().hash(&mut hasher);
        for ship in self.ships.as_slice() {
            ship.id.hash(&mut hasher);
            ship.position.x.to_bits().hash(&mut hasher);
            ship.position.y.to_bits().hash(&mut hasher);
            ship.velocity.x.to_bits().hash(&mut hasher);
            ship.velocity.y.to_bits().hash(&mut hasher);
            ship.health.hash(&mut hasher);
            ship.fire_timer.to_bits().hash(&mut hasher);
        }

        self.projectiles.len().hash(&mut hasher);
        for projectile in self.projectiles.iter() {
            projectile.owner.hash(&mut hasher);
            projectile.position.x.to_bits().hash(&mut hasher);
            projectile.position.y.to_bits().hash(&mut hasher);
            projectile.velocity.x.to_bits().hash(&mut hasher);
            projectile.velocity.y.to_bits().hash(&mut hasher);
            projectile.damage.hash(&mut hasher);
        }

        self.selected.hash(&mut hasher);

        hasher.finish()
    }

    /// Serialize the world state for the determinism harness.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidState`] if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| SimError::InvalidState(format!("failed to serialize world: {e}")))
    }

    /// Deserialize a world state snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidState`] if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| SimError::InvalidState(format!("failed to deserialize world: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(n: i32) -> Fixed {
        Fixed::from_num(n)
    }

    fn vec2(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::new(fixed(x), fixed(y))
    }

    fn tick_dt() -> Fixed {
        Fixed::ONE / Fixed::from_num(20)
    }

    fn quiet_config() -> WorldConfig {
        // Two teams far enough apart that nothing shoots during short
        // tests, and no obstacles.
        WorldConfig {
            initial_ships: vec![
                ShipPlacement {
                    team: Team::Ally,
                    position: vec2(-20, -20),
                },
                ShipPlacement {
                    team: Team::Ally,
                    position: vec2(-18, -20),
                },
            ],
            initial_buildings: Vec::new(),
            ..WorldConfig::default()
        }
    }

    #[test]
    fn test_world_init_seeds_scene() {
        let world = World::new(WorldConfig::default()).unwrap();

        assert_eq!(world.ships().len(), 10);
        assert_eq!(world.buildings().len(), 4);
        assert_eq!(world.projectiles().len(), 0);
        assert_eq!(world.tick_count(), 0);
    }

    #[test]
    fn test_selection_box_replaces_selection() {
        let mut world = World::new(quiet_config()).unwrap();

        let input = InputIntents {
            selection_box: Some(Aabb {
                min: vec2(-25, -25),
                max: vec2(-15, -15),
            }),
            move_order_target: None,
        };

        world.tick(&input, tick_dt()).unwrap();
        assert_eq!(world.selected().len(), 2);

        // An empty region clears the selection.
        let input = InputIntents {
            selection_box: Some(Aabb {
                min: vec2(20, 20),
                max: vec2(25, 25),
            }),
            move_order_target: None,
        };
        world.tick(&input, tick_dt()).unwrap();
        assert!(world.selected().is_empty());
    }

    #[test]
    fn test_move_order_sets_routes_and_ships_move() {
        let mut world = World::new(quiet_config()).unwrap();

        let select = InputIntents {
            selection_box: Some(Aabb {
                min: vec2(-25, -25),
                max: vec2(-15, -15),
            }),
            move_order_target: None,
        };
        world.tick(&select, tick_dt()).unwrap();

        let order = InputIntents {
            selection_box: None,
            move_order_target: Some(vec2(0, 0)),
        };
        world.tick(&order, tick_dt()).unwrap();

        let moving = world
            .ships()
            .iter()
            .filter(|ship| ship.move_order.is_some())
            .count();
        assert_eq!(moving, 2);

        // A few more ticks and they have made progress toward the target.
        let idle = InputIntents::default();
        let before: Vec<Fixed> = world
            .ships()
            .iter()
            .map(|s| s.position.distance_squared(vec2(0, 0)))
            .collect();

        for _ in 0..20 {
            world.tick(&idle, tick_dt()).unwrap();
        }

        let after: Vec<Fixed> = world
            .ships()
            .iter()
            .map(|s| s.position.distance_squared(vec2(0, 0)))
            .collect();

        for (b, a) in before.iter().zip(&after) {
            assert!(a < b, "ship did not move toward the order target");
        }
    }

    #[test]
    fn test_arrival_clears_order_and_stops() {
        let mut world = World::new(WorldConfig {
            initial_ships: vec![ShipPlacement {
                team: Team::Ally,
                position: vec2(-3, 0),
            }],
            initial_buildings: Vec::new(),
            ..WorldConfig::default()
        })
        .unwrap();

        world
            .tick(
                &InputIntents {
                    selection_box: Some(Aabb {
                        min: vec2(-5, -5),
                        max: vec2(5, 5),
                    }),
                    move_order_target: None,
                },
                tick_dt(),
            )
            .unwrap();

        world
            .tick(
                &InputIntents {
                    selection_box: None,
                    move_order_target: Some(vec2(-1, 0)),
                },
                tick_dt(),
            )
            .unwrap();

        let idle = InputIntents::default();
        for _ in 0..100 {
            world.tick(&idle, tick_dt()).unwrap();
        }

        let ship = &world.ships()[0];
        assert!(ship.move_order.is_none(), "order should be cleared");
        assert_eq!(ship.velocity, Vec2Fixed::ZERO);
        assert!(ship.position.distance_squared(vec2(-1, 0)) < Fixed::ONE);
    }

    #[test]
    fn test_render_state_mirrors_world() {
        let mut world = World::new(WorldConfig::default()).unwrap();
        let state = world.render_state();

        assert_eq!(state.ships.len(), 10);
        assert_eq!(state.buildings.len(), 4);
        assert!(state.routes.is_empty());
        assert!(matches!(state.nav_debug, NavDebug::Graph { .. }));

        world
            .tick(
                &InputIntents {
                    selection_box: Some(Aabb {
                        min: vec2(-32, -32),
                        max: vec2(32, 32),
                    }),
                    move_order_target: None,
                },
                tick_dt(),
            )
            .unwrap();

        let state = world.render_state();
        assert!(state.ships.iter().all(|ship| ship.selected));
    }

    #[test]
    fn test_tick_determinism() {
        let run = || {
            let mut world = World::new(WorldConfig::default()).unwrap();
            let select = InputIntents {
                selection_box: Some(Aabb {
                    min: vec2(-32, -32),
                    max: vec2(0, 0),
                }),
                move_order_target: None,
            };
            world.tick(&select, tick_dt()).unwrap();

            let order = InputIntents {
                selection_box: None,
                move_order_target: Some(vec2(20, 20)),
            };
            world.tick(&order, tick_dt()).unwrap();

            let idle = InputIntents::default();
            for _ in 0..200 {
                world.tick(&idle, tick_dt()).unwrap();
            }
            world.state_hash()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_hash() {
        let mut world = World::new(WorldConfig::default()).unwrap();
        let idle = InputIntents::default();
        for _ in 0..10 {
            world.tick(&idle, tick_dt()).unwrap();
        }

        let bytes = world.serialize().unwrap();
        let restored = World::deserialize(&bytes).unwrap();

        assert_eq!(world.state_hash(), restored.state_hash());
        assert_eq!(world.tick_count(), restored.tick_count());
    }

    #[test]
    fn test_destroy_ship_drops_it_from_selection() {
        let mut world = World::new(quiet_config()).unwrap();

        world
            .tick(
                &InputIntents {
                    selection_box: Some(Aabb {
                        min: vec2(-25, -25),
                        max: vec2(-15, -15),
                    }),
                    move_order_target: None,
                },
                tick_dt(),
            )
            .unwrap();
        assert_eq!(world.selected().len(), 2);

        let id = world.selected()[0];
        world.destroy_ship(id).unwrap();

        assert!(!world.selected().contains(&id));
        assert_eq!(world.selected().len(), 1);
    }
}

//! Distance-field construction and gradient-descent steering.
//!
//! The field is a discretized grid over world space holding, for every
//! cell, the number of 4-connected steps to the most recent order target.
//! It is a single shared structure, rebuilt in full (an unweighted-grid
//! Dijkstra, i.e. plain BFS) every time a new move order is issued - not
//! one field per unit or per order. Units follow it by stepping toward
//! whichever of their eight neighbor cells records the strictly lowest
//! distance.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::components::Building;
use crate::geometry::Aabb;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

use super::{steer_direct, NavConfig, NavDebug, Route, Steering};

/// Sentinel for a cell not reached by the flood fill.
pub const UNINITIALIZED: u32 = u32::MAX;

/// Sentinel for a cell covered by an obstacle footprint.
pub const OCCUPIED: u32 = u32::MAX - 1;

/// Offsets of the eight neighbors, clockwise from east.
const NEIGHBORS_8: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Offsets of the four cardinal neighbors used by the flood fill.
const NEIGHBORS_4: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Grid of step-distances to the current order target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistanceField {
    width: u32,
    height: u32,
    #[serde(with = "fixed_serde")]
    cell_size: Fixed,
    origin: Vec2Fixed,
    cells: Vec<u32>,
}

impl DistanceField {
    /// Create a field covering a square world of `world_extent` side
    /// length centered on the origin, with every cell uninitialized.
    #[must_use]
    pub fn new(world_extent: Fixed, cell_size: Fixed) -> Self {
        let side = (world_extent / cell_size).ceil().to_num::<i64>().max(1) as u32;
        let half_extent = world_extent / Fixed::from_num(2);

        Self {
            width: side,
            height: side,
            cell_size,
            origin: Vec2Fixed::new(-half_extent, -half_extent),
            cells: vec![UNINITIALIZED; (side as usize) * (side as usize)],
        }
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw cell value at grid coordinates, or `None` out of bounds.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.cells[self.index_of(x, y)])
        } else {
            None
        }
    }

    #[inline]
    fn index_of(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Map a world position to the grid cell containing it, clamped to
    /// the grid bounds.
    #[must_use]
    pub fn cell_of(&self, position: Vec2Fixed) -> (u32, u32) {
        let local = position - self.origin;
        let x = (local.x / self.cell_size).to_num::<i64>();
        let y = (local.y / self.cell_size).to_num::<i64>();

        (
            x.clamp(0, i64::from(self.width) - 1) as u32,
            y.clamp(0, i64::from(self.height) - 1) as u32,
        )
    }

    /// World position of a cell's center.
    #[must_use]
    pub fn cell_center(&self, x: u32, y: u32) -> Vec2Fixed {
        let half = self.cell_size / Fixed::from_num(2);
        self.origin
            + Vec2Fixed::new(
                Fixed::from_num(x) * self.cell_size + half,
                Fixed::from_num(y) * self.cell_size + half,
            )
    }

    /// Rebuild the field: mark obstacle footprints, seed the target cell
    /// at distance zero, and flood outward with unit-cost BFS.
    pub fn rebuild(&mut self, buildings: &[Building], target: Vec2Fixed) {
        self.cells.fill(UNINITIALIZED);

        for building in buildings {
            self.mark_occupied(&building.aabb());
        }

        let (tx, ty) = self.cell_of(target);
        let target_index = self.index_of(tx, ty);
        self.cells[target_index] = 0;

        let mut queue = VecDeque::new();
        queue.push_back((tx, ty));

        while let Some((x, y)) = queue.pop_front() {
            let next_dist = self.cells[self.index_of(x, y)] + 1;

            for (dx, dy) in NEIGHBORS_4 {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                if nx < 0 || ny < 0 || nx >= self.width as i32 || ny >= self.height as i32 {
                    continue;
                }

                let index = self.index_of(nx as u32, ny as u32);
                if self.cells[index] == UNINITIALIZED {
                    self.cells[index] = next_dist;
                    queue.push_back((nx as u32, ny as u32));
                }
            }
        }

        tracing::debug!(
            width = self.width,
            height = self.height,
            target_cell = ?(tx, ty),
            "rebuilt distance field"
        );
    }

    /// Mark every cell whose box overlaps the footprint as occupied.
    fn mark_occupied(&mut self, footprint: &Aabb) {
        let (min_x, min_y) = self.cell_of(footprint.min);
        let (max_x, max_y) = self.cell_of(footprint.max);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let cell_box = Aabb::from_center_size(
                    self.cell_center(x, y),
                    Vec2Fixed::splat(self.cell_size),
                );
                if cell_box.overlaps(footprint) {
                    let index = self.index_of(x, y);
                    self.cells[index] = OCCUPIED;
                }
            }
        }
    }

    /// The neighbor of `(x, y)` with the strictly lowest real distance,
    /// below the given bound. First-found wins among equal minima, in the
    /// fixed clockwise neighbor order.
    fn best_neighbor(&self, x: u32, y: u32, bound: u32) -> Option<(u32, u32)> {
        let mut best: Option<(u32, u32)> = None;
        let mut best_dist = bound;

        for (dx, dy) in NEIGHBORS_8 {
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if nx < 0 || ny < 0 || nx >= self.width as i32 || ny >= self.height as i32 {
                continue;
            }

            let value = self.cells[self.index_of(nx as u32, ny as u32)];
            if value == OCCUPIED || value == UNINITIALIZED {
                continue;
            }

            if value < best_dist {
                best = Some((nx as u32, ny as u32));
                best_dist = value;
            }
        }

        best
    }
}

/// The distance-field navigation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceFieldNav {
    field: DistanceField,
}

impl DistanceFieldNav {
    /// Create the backend with an uninitialized field.
    #[must_use]
    pub fn new(config: &NavConfig) -> Self {
        Self {
            field: DistanceField::new(config.world_extent, config.cell_size),
        }
    }

    /// The underlying field.
    #[must_use]
    pub fn field(&self) -> &DistanceField {
        &self.field
    }

    /// Rebuild the shared field for a new order target and hand back a
    /// field-guided route.
    pub fn compute_route(&mut self, buildings: &[Building], target: Vec2Fixed) -> Route {
        self.field.rebuild(buildings, target);
        Route::FieldGuided { target }
    }

    /// Steer a unit at `position` down the field gradient toward
    /// `target`.
    ///
    /// When the unit's cell has no strictly better neighbor (local
    /// minimum, surrounded by sentinels, or the unit sits on a sentinel
    /// cell itself), steering falls back to a straight line at the
    /// literal target so units never freeze in place.
    #[must_use]
    pub fn steer(&self, position: Vec2Fixed, target: Vec2Fixed) -> Steering {
        if position.distance_squared(target) < super::arrival_threshold_sq() {
            return Steering::Arrived;
        }

        let (x, y) = self.field.cell_of(position);
        let here = self.field.get(x, y).unwrap_or(UNINITIALIZED);

        // Sentinel cells carry no usable gradient.
        let bound = if here == OCCUPIED || here == UNINITIALIZED {
            UNINITIALIZED
        } else {
            here
        };

        match self.field.best_neighbor(x, y, bound) {
            Some((nx, ny)) => {
                let direction = (self.field.cell_center(nx, ny) - position).normalize();
                if direction == Vec2Fixed::ZERO {
                    steer_direct(position, target)
                } else {
                    Steering::Move(direction)
                }
            }
            None => steer_direct(position, target),
        }
    }

    /// Field dimensions and raw cell values for debug rendering.
    #[must_use]
    pub fn debug_geometry(&self) -> NavDebug {
        NavDebug::Field {
            width: self.field.width,
            height: self.field.height,
            cell_size: self.field.cell_size,
            origin: self.field.origin,
            cells: self.field.cells.clone(),
        }
    }
}

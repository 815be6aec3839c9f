//! Navigation engines.
//!
//! Two interchangeable backends solve the same steering problem:
//!
//! - [`visibility`] builds a visibility graph over obstacle corners and
//!   runs A* over it, producing waypoint routes.
//! - [`distance_field`] floods a discretized grid with step-distances to
//!   the order target and steers units down the local gradient.
//!
//! The backend is chosen per world at construction time via
//! [`NavigationMode`]. Both answer the same two questions: "give me a
//! route from here to there" ([`Navigator::compute_route`]) and "which way
//! next" ([`Navigator::next_waypoint`]).

pub mod distance_field;
pub mod visibility;

use serde::{Deserialize, Serialize};

use crate::components::Building;
use crate::error::Result;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

use distance_field::DistanceFieldNav;
use visibility::VisibilityGraphNav;

/// Which navigation backend a world uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NavigationMode {
    /// Visibility graph + A* waypoint routing.
    #[default]
    VisibilityGraph,
    /// Distance-field flood fill + gradient steering.
    DistanceField,
}

/// Tuning for both navigation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavConfig {
    /// Backend selection.
    pub mode: NavigationMode,
    /// Side length of the square world, centered on the origin.
    #[serde(with = "fixed_serde")]
    pub world_extent: Fixed,
    /// Lattice vertices per world-boundary side.
    pub boundary_resolution: u32,
    /// How far outside an obstacle its graph vertices sit. Line-of-sight
    /// tests use half this padding, so vertices always clear the boxes
    /// they were spawned from.
    #[serde(with = "fixed_serde")]
    pub obstacle_padding: Fixed,
    /// Distance-field cell size in world units.
    #[serde(with = "fixed_serde")]
    pub cell_size: Fixed,
    /// Hard cap on visibility-graph vertices.
    pub max_vertices: usize,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            mode: NavigationMode::VisibilityGraph,
            world_extent: Fixed::from_num(64),
            boundary_resolution: 4,
            obstacle_padding: Fixed::ONE / Fixed::from_num(2),
            cell_size: Fixed::ONE,
            max_vertices: 256,
        }
    }
}

/// A computed route: the engine-agnostic handle a move order holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    /// Straight-line steering at the target. Used when start and end
    /// resolve to the same graph vertex, and as the no-path fallback.
    Direct {
        /// Literal order target.
        target: Vec2Fixed,
    },
    /// Waypoint walk produced by the A* search, from the vertex nearest
    /// the start to the vertex nearest the end. The literal end
    /// coordinate is steered at after the last waypoint.
    Waypoints {
        /// Graph vertex positions in travel order.
        nodes: Vec<Vec2Fixed>,
        /// Index of the next unreached node.
        cursor: usize,
        /// Literal order target.
        target: Vec2Fixed,
    },
    /// Downhill walk over the shared distance field.
    FieldGuided {
        /// Literal order target.
        target: Vec2Fixed,
    },
}

impl Route {
    /// The literal order target this route leads to.
    #[must_use]
    pub const fn target(&self) -> Vec2Fixed {
        match self {
            Self::Direct { target }
            | Self::Waypoints { target, .. }
            | Self::FieldGuided { target } => *target,
        }
    }

    /// Remaining polyline for debug rendering: unreached waypoints plus
    /// the literal target.
    #[must_use]
    pub fn remaining_points(&self) -> Vec<Vec2Fixed> {
        match self {
            Self::Direct { target } | Self::FieldGuided { target } => vec![*target],
            Self::Waypoints {
                nodes,
                cursor,
                target,
            } => {
                let mut points: Vec<Vec2Fixed> = nodes[(*cursor).min(nodes.len())..].to_vec();
                points.push(*target);
                points
            }
        }
    }
}

/// Per-tick steering answer for a unit following a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steering {
    /// Move in this (unit-length) direction.
    Move(Vec2Fixed),
    /// The route target has been reached; clear the order.
    Arrived,
}

/// Squared distance at which a waypoint or target counts as reached.
#[must_use]
pub(crate) fn arrival_threshold_sq() -> Fixed {
    Fixed::ONE / Fixed::from_num(10)
}

/// Steer straight at `target`, reporting arrival inside the threshold or
/// on a degenerate (zero-length) direction.
pub(crate) fn steer_direct(position: Vec2Fixed, target: Vec2Fixed) -> Steering {
    if position.distance_squared(target) < arrival_threshold_sq() {
        return Steering::Arrived;
    }

    let direction = (target - position).normalize();
    if direction == Vec2Fixed::ZERO {
        return Steering::Arrived;
    }

    Steering::Move(direction)
}

/// Debug geometry for the renderer, shaped by the active backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavDebug {
    /// Visibility-graph vertices and undirected edges (vertex index pairs).
    Graph {
        /// Vertex positions.
        vertices: Vec<Vec2Fixed>,
        /// Undirected edges, each stored once with `i < j`.
        edges: Vec<(u32, u32)>,
    },
    /// Distance-field dimensions and raw cell values.
    Field {
        /// Grid width in cells.
        width: u32,
        /// Grid height in cells.
        height: u32,
        /// Cell size in world units.
        #[serde(with = "fixed_serde")]
        cell_size: Fixed,
        /// World position of the grid's minimum corner.
        origin: Vec2Fixed,
        /// Row-major cell values, including sentinels.
        cells: Vec<u32>,
    },
}

/// The active navigation backend of a world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Navigator {
    /// Visibility graph + A*.
    VisibilityGraph(VisibilityGraphNav),
    /// Distance field + gradient steering.
    DistanceField(DistanceFieldNav),
}

impl Navigator {
    /// Build the backend selected by `config.mode` over the given
    /// obstacle layout.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SimError::CapacityExceeded`] if the
    /// obstacle layout produces more graph vertices than configured.
    pub fn new(config: &NavConfig, buildings: &[Building]) -> Result<Self> {
        match config.mode {
            NavigationMode::VisibilityGraph => Ok(Self::VisibilityGraph(
                VisibilityGraphNav::new(config, buildings)?,
            )),
            NavigationMode::DistanceField => {
                Ok(Self::DistanceField(DistanceFieldNav::new(config)))
            }
        }
    }

    /// Compute a route from `start` to `end`.
    ///
    /// The distance-field backend rebuilds its shared field for the new
    /// target here; the graph backend runs an A* query.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::SimError::NoPath`] if the graph search
    /// exhausts its open set. Callers are expected to fall back to a
    /// [`Route::Direct`] in that case.
    pub fn compute_route(
        &mut self,
        buildings: &[Building],
        start: Vec2Fixed,
        end: Vec2Fixed,
    ) -> Result<Route> {
        match self {
            Self::VisibilityGraph(nav) => nav.compute_route(start, end),
            Self::DistanceField(nav) => Ok(nav.compute_route(buildings, end)),
        }
    }

    /// Answer "which way next" for a unit at `position` following `route`.
    pub fn next_waypoint(&self, route: &mut Route, position: Vec2Fixed) -> Steering {
        match route {
            Route::Direct { target } => steer_direct(position, *target),
            Route::Waypoints {
                nodes,
                cursor,
                target,
            } => {
                // Advance past every waypoint already within reach, then
                // steer at the next one (or the literal target).
                while *cursor < nodes.len()
                    && position.distance_squared(nodes[*cursor]) < arrival_threshold_sq()
                {
                    *cursor += 1;
                }

                match nodes.get(*cursor) {
                    Some(&waypoint) => steer_direct(position, waypoint),
                    None => steer_direct(position, *target),
                }
            }
            Route::FieldGuided { target } => match self {
                Self::DistanceField(nav) => nav.steer(position, *target),
                // A field-guided route can only be produced by the
                // distance-field backend; fall back gracefully anyway.
                Self::VisibilityGraph(_) => steer_direct(position, *target),
            },
        }
    }

    /// Debug geometry for the renderer.
    #[must_use]
    pub fn debug_geometry(&self) -> NavDebug {
        match self {
            Self::VisibilityGraph(nav) => nav.debug_geometry(),
            Self::DistanceField(nav) => nav.debug_geometry(),
        }
    }
}

//! Visibility-graph construction and A* waypoint routing.
//!
//! Vertices are a fixed-resolution lattice along the world boundary plus
//! the four padded corners of every building. Two vertices share an edge
//! when the straight segment between them crosses no building's padded
//! box. Construction is O(V² · B) and runs once per obstacle layout -
//! acceptable at prototype scale, which is why the vertex count carries a
//! hard cap.
//!
//! Vertices sit a full padding outside their building while line-of-sight
//! tests inflate boxes by only half the padding. Corner vertices therefore
//! clear every test box, including their own building's, and routes can
//! walk from corner to corner along a face.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::components::Building;
use crate::error::{Result, SimError};
use crate::geometry::{segment_intersects_aabb, Aabb};
use crate::math::{Fixed, Vec2Fixed};

use super::{NavConfig, NavDebug, Route};

/// Visibility graph: vertex positions and per-vertex adjacency lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityGraph {
    vertices: Vec<Vec2Fixed>,
    neighbors: Vec<Vec<usize>>,
}

impl VisibilityGraph {
    /// Build the graph for an obstacle layout.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::CapacityExceeded`] if the layout produces more
    /// vertices than `config.max_vertices`.
    pub fn build(config: &NavConfig, buildings: &[Building]) -> Result<Self> {
        let mut vertices = Vec::new();

        let extent = config.world_extent;
        let half_extent = extent / Fixed::from_num(2);
        let resolution = config.boundary_resolution.max(2);

        // Boundary lattice: `resolution` vertices along each side.
        for step in 0..resolution {
            let t = Fixed::from_num(step) / Fixed::from_num(resolution - 1);
            let p = extent * (t - Fixed::ONE / Fixed::from_num(2));

            vertices.push(Vec2Fixed::new(p, -half_extent));
            vertices.push(Vec2Fixed::new(p, half_extent));
            vertices.push(Vec2Fixed::new(-half_extent, p));
            vertices.push(Vec2Fixed::new(half_extent, p));
        }

        // Four padded corners per building.
        for building in buildings {
            let corners = building.aabb().padded(config.obstacle_padding);
            vertices.push(Vec2Fixed::new(corners.min.x, corners.min.y));
            vertices.push(Vec2Fixed::new(corners.max.x, corners.min.y));
            vertices.push(Vec2Fixed::new(corners.max.x, corners.max.y));
            vertices.push(Vec2Fixed::new(corners.min.x, corners.max.y));
        }

        if vertices.len() > config.max_vertices {
            return Err(SimError::CapacityExceeded {
                what: "visibility graph vertices".to_string(),
                capacity: config.max_vertices,
            });
        }

        // Line-of-sight tests use boxes inflated by half the vertex
        // padding, so vertices never sit on a tested edge.
        let test_padding = config.obstacle_padding / Fixed::from_num(2);
        let test_boxes: Vec<Aabb> = buildings
            .iter()
            .map(|b| b.aabb().padded(test_padding))
            .collect();

        let mut neighbors = vec![Vec::new(); vertices.len()];
        let mut edge_count = 0usize;

        for i in 0..vertices.len() {
            for j in (i + 1)..vertices.len() {
                if is_visible(&test_boxes, vertices[i], vertices[j]) {
                    neighbors[i].push(j);
                    neighbors[j].push(i);
                    edge_count += 1;
                }
            }
        }

        tracing::info!(
            vertices = vertices.len(),
            edges = edge_count,
            "built visibility graph"
        );

        Ok(Self {
            vertices,
            neighbors,
        })
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Vertex position by index.
    #[must_use]
    pub fn vertex(&self, index: usize) -> Vec2Fixed {
        self.vertices[index]
    }

    /// Adjacency list of a vertex.
    #[must_use]
    pub fn neighbors(&self, index: usize) -> &[usize] {
        &self.neighbors[index]
    }

    /// Index of the vertex nearest to `point` (squared Euclidean
    /// distance, first-found tie-break).
    ///
    /// # Panics
    ///
    /// Panics if the graph has no vertices; the boundary lattice makes an
    /// empty graph a construction-logic bug, not a runtime condition.
    #[must_use]
    pub fn nearest_vertex(&self, point: Vec2Fixed) -> usize {
        assert!(!self.vertices.is_empty(), "query on an empty graph");

        let mut nearest = 0;
        let mut min_dist = self.vertices[0].distance_squared(point);

        for (index, vertex) in self.vertices.iter().enumerate().skip(1) {
            let dist = vertex.distance_squared(point);
            if dist < min_dist {
                nearest = index;
                min_dist = dist;
            }
        }

        nearest
    }
}

/// True when the segment crosses none of the (already inflated) boxes.
fn is_visible(test_boxes: &[Aabb], start: Vec2Fixed, end: Vec2Fixed) -> bool {
    test_boxes
        .iter()
        .all(|aabb| !segment_intersects_aabb(aabb, start, end))
}

/// An entry in the A* open set.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct OpenNode {
    vertex: usize,
    /// f = g + h (negated ordering below turns the max-heap into a
    /// min-heap).
    f_score: Fixed,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse for min-heap behavior, and
        // break f-score ties on the lower vertex index for determinism.
        match other.f_score.cmp(&self.f_score) {
            Ordering::Equal => other.vertex.cmp(&self.vertex),
            ord => ord,
        }
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Run A* from `start` to `goal` over the graph.
///
/// Cost model: g accumulates true edge lengths through the parent chain,
/// h is the straight-line distance to the goal (admissible, so the first
/// pop of the goal is optimal).
///
/// Returns the vertex chain including both endpoints, or `None` when the
/// open set drains without reaching the goal.
fn astar(graph: &VisibilityGraph, start: usize, goal: usize) -> Option<Vec<usize>> {
    let n = graph.vertex_count();
    let mut g_score: Vec<Option<Fixed>> = vec![None; n];
    let mut parent: Vec<Option<usize>> = vec![None; n];
    let mut closed = vec![false; n];
    let mut open = BinaryHeap::new();

    let goal_pos = graph.vertex(goal);

    g_score[start] = Some(Fixed::ZERO);
    open.push(OpenNode {
        vertex: start,
        f_score: graph.vertex(start).distance(goal_pos),
    });

    while let Some(current) = open.pop() {
        if closed[current.vertex] {
            continue;
        }
        closed[current.vertex] = true;

        if current.vertex == goal {
            return Some(reconstruct(&parent, goal));
        }

        let current_pos = graph.vertex(current.vertex);
        let current_g = g_score[current.vertex].expect("popped node must have a g score");

        for &neighbor in graph.neighbors(current.vertex) {
            if closed[neighbor] {
                continue;
            }

            let neighbor_pos = graph.vertex(neighbor);
            let tentative_g = current_g + current_pos.distance(neighbor_pos);

            let improves = match g_score[neighbor] {
                Some(existing) => tentative_g < existing,
                None => true,
            };

            if improves {
                g_score[neighbor] = Some(tentative_g);
                parent[neighbor] = Some(current.vertex);
                open.push(OpenNode {
                    vertex: neighbor,
                    f_score: tentative_g + neighbor_pos.distance(goal_pos),
                });
            }
        }
    }

    None
}

/// Walk parent pointers from the goal back to the start and reverse.
fn reconstruct(parent: &[Option<usize>], goal: usize) -> Vec<usize> {
    let mut chain = vec![goal];
    let mut current = goal;

    while let Some(prev) = parent[current] {
        chain.push(prev);
        current = prev;
    }

    chain.reverse();
    chain
}

/// The visibility-graph navigation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibilityGraphNav {
    graph: VisibilityGraph,
}

impl VisibilityGraphNav {
    /// Build the backend for an obstacle layout.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::CapacityExceeded`] if the layout produces more
    /// vertices than configured.
    pub fn new(config: &NavConfig, buildings: &[Building]) -> Result<Self> {
        Ok(Self {
            graph: VisibilityGraph::build(config, buildings)?,
        })
    }

    /// The underlying graph.
    #[must_use]
    pub fn graph(&self) -> &VisibilityGraph {
        &self.graph
    }

    /// Compute a waypoint route from `start` to `end`.
    ///
    /// When both endpoints resolve to the same nearest vertex the result
    /// is a [`Route::Direct`] and the caller steers a straight line.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NoPath`] when the search exhausts its open set.
    pub fn compute_route(&self, start: Vec2Fixed, end: Vec2Fixed) -> Result<Route> {
        let start_vertex = self.graph.nearest_vertex(start);
        let end_vertex = self.graph.nearest_vertex(end);

        if start_vertex == end_vertex {
            return Ok(Route::Direct { target: end });
        }

        let chain = astar(&self.graph, start_vertex, end_vertex).ok_or(SimError::NoPath {
            from_x: start.x.to_num::<f64>(),
            from_y: start.y.to_num::<f64>(),
            to_x: end.x.to_num::<f64>(),
            to_y: end.y.to_num::<f64>(),
        })?;

        Ok(Route::Waypoints {
            nodes: chain.iter().map(|&v| self.graph.vertex(v)).collect(),
            cursor: 0,
            target: end,
        })
    }

    /// Graph vertices and edges for debug rendering.
    #[must_use]
    pub fn debug_geometry(&self) -> NavDebug {
        let mut edges = Vec::new();
        for (i, neighbors) in self.graph.neighbors.iter().enumerate() {
            for &j in neighbors {
                if i < j {
                    edges.push((i as u32, j as u32));
                }
            }
        }

        NavDebug::Graph {
            vertices: self.graph.vertices.clone(),
            edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Building;

    fn fixed(n: i32) -> Fixed {
        Fixed::from_num(n)
    }

    fn vec2(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::new(fixed(x), fixed(y))
    }

    fn building(x: i32, y: i32, w: i32, h: i32) -> Building {
        Building {
            position: vec2(x, y),
            size: vec2(w, h),
        }
    }

    fn config() -> NavConfig {
        NavConfig::default()
    }

    #[test]
    fn test_empty_layout_graph_is_fully_connected() {
        let graph = VisibilityGraph::build(&config(), &[]).unwrap();

        // 4 sides x boundary_resolution vertices
        assert_eq!(graph.vertex_count(), 16);

        // With no obstacles every vertex sees every other vertex.
        for i in 0..graph.vertex_count() {
            assert_eq!(graph.neighbors(i).len(), graph.vertex_count() - 1);
        }
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let buildings = [building(0, 0, 4, 4), building(10, -5, 2, 6)];
        let graph = VisibilityGraph::build(&config(), &buildings).unwrap();

        for i in 0..graph.vertex_count() {
            for &j in graph.neighbors(i) {
                assert!(
                    graph.neighbors(j).contains(&i),
                    "edge {i}->{j} missing its mirror"
                );
            }
        }
    }

    #[test]
    fn test_building_blocks_crossing_edges() {
        let graph = VisibilityGraph::build(&config(), &[building(0, 0, 8, 8)]).unwrap();

        // The graph has edges, but none of them cross the building.
        let obstacle = building(0, 0, 8, 8).aabb();
        let mut edge_count = 0;
        for i in 0..graph.vertex_count() {
            for &j in graph.neighbors(i) {
                if i < j {
                    edge_count += 1;
                    assert!(
                        !segment_intersects_aabb(&obstacle, graph.vertex(i), graph.vertex(j)),
                        "edge {i}->{j} crosses the obstacle"
                    );
                }
            }
        }
        assert!(edge_count > 0);
    }

    #[test]
    fn test_corner_vertices_connect_along_faces() {
        let buildings = [building(0, 0, 4, 4)];
        let graph = VisibilityGraph::build(&config(), &buildings).unwrap();

        // Corner vertices are the last four; adjacent corners along a face
        // must be mutually visible since they clear the half-padded box.
        let first_corner = graph.vertex_count() - 4;
        assert!(graph.neighbors(first_corner).contains(&(first_corner + 1)));
        assert!(graph.neighbors(first_corner).contains(&(first_corner + 3)));
    }

    #[test]
    fn test_vertex_capacity_is_enforced() {
        let mut small = config();
        small.max_vertices = 8;

        let result = VisibilityGraph::build(&small, &[]);
        assert!(matches!(
            result,
            Err(SimError::CapacityExceeded { capacity: 8, .. })
        ));
    }

    #[test]
    fn test_nearest_vertex_first_found_tie() {
        let graph = VisibilityGraph::build(&config(), &[]).unwrap();

        // The origin is equidistant from many boundary vertices; the
        // answer must be stable across calls.
        let a = graph.nearest_vertex(Vec2Fixed::ZERO);
        let b = graph.nearest_vertex(Vec2Fixed::ZERO);
        assert_eq!(a, b);
    }

    #[test]
    fn test_same_nearest_vertex_gives_direct_route() {
        let nav = VisibilityGraphNav::new(&config(), &[]).unwrap();

        // Both points hug the same boundary corner.
        let start = vec2(-31, -31);
        let end = vec2(-30, -30);
        let route = nav.compute_route(start, end).unwrap();

        assert_eq!(route, Route::Direct { target: end });
    }

    #[test]
    fn test_route_between_distant_vertices_has_waypoints() {
        let nav = VisibilityGraphNav::new(&config(), &[]).unwrap();

        let start = vec2(-30, -30);
        let end = vec2(30, 30);
        let route = nav.compute_route(start, end).unwrap();

        match route {
            Route::Waypoints { nodes, cursor, .. } => {
                assert!(nodes.len() >= 2);
                assert_eq!(cursor, 0);
            }
            other => panic!("expected waypoints, got {other:?}"),
        }
    }

    #[test]
    fn test_astar_route_avoids_obstacle() {
        let obstacle = building(0, 0, 10, 10);
        let nav = VisibilityGraphNav::new(&config(), &[obstacle]).unwrap();

        let start = vec2(-25, 0);
        let end = vec2(25, 0);
        let route = nav.compute_route(start, end).unwrap();

        let Route::Waypoints { nodes, .. } = route else {
            panic!("expected a waypoint route around the obstacle");
        };

        let footprint = obstacle.aabb();
        for pair in nodes.windows(2) {
            assert!(
                !segment_intersects_aabb(&footprint, pair[0], pair[1]),
                "route leg {:?} -> {:?} crosses the obstacle",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_astar_finds_shortest_of_two_clear_legs() {
        // No obstacles: the chain between two vertices should be the two
        // endpoints only (single direct edge), not a detour.
        let graph = VisibilityGraph::build(&config(), &[]).unwrap();
        let chain = astar(&graph, 0, 5).unwrap();
        assert_eq!(chain.first(), Some(&0));
        assert_eq!(chain.last(), Some(&5));
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_astar_determinism() {
        let buildings = [building(-5, 0, 6, 6), building(8, 2, 4, 8)];
        let nav = VisibilityGraphNav::new(&config(), &buildings).unwrap();

        let r1 = nav.compute_route(vec2(-25, -25), vec2(25, 25)).unwrap();
        let r2 = nav.compute_route(vec2(-25, -25), vec2(25, 25)).unwrap();
        let r3 = nav.compute_route(vec2(-25, -25), vec2(25, 25)).unwrap();

        assert_eq!(r1, r2);
        assert_eq!(r2, r3);
    }
}

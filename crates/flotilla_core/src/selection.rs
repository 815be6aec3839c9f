//! Selection and order intake: camera mapping and drag-box resolution.
//!
//! The host owns windowing and raw input; this module owns the world side
//! of those interactions - mapping screen coordinates through the camera,
//! turning a mouse drag into a world-space box, and testing ships against
//! it. Selection uses the same strict overlap rule as collision, so a
//! ship exactly edge-touching the box is not selected.

use serde::{Deserialize, Serialize};

use crate::components::{Ship, ShipId};
use crate::geometry::Aabb;
use crate::math::{fixed_serde, Fixed, Vec2Fixed};

/// Orthographic camera state consumed from the host.
///
/// `zoom` is the horizontal extent of the view in world units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Camera {
    /// World position the view is centered on.
    pub position: Vec2Fixed,
    /// Horizontal world extent of the view.
    #[serde(with = "fixed_serde")]
    pub zoom: Fixed,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec2Fixed::ZERO,
            zoom: Fixed::from_num(20),
        }
    }
}

/// Screen dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Map a screen coordinate (origin top-left, y down) to world space.
///
/// The vertical view extent follows from the aspect ratio, so a square
/// viewport sees `zoom` world units in both directions.
#[must_use]
pub fn screen_to_world(camera: &Camera, viewport: Viewport, screen: Vec2Fixed) -> Vec2Fixed {
    let width = Fixed::from_num(viewport.width.max(1));
    let height = Fixed::from_num(viewport.height.max(1));
    let half = Fixed::ONE / Fixed::from_num(2);

    // Screen y grows downward; world y grows upward.
    let x = camera.position.x + (screen.x / width - half) * camera.zoom;
    let y = camera.position.y + (half - screen.y / height) * camera.zoom * height / width;

    Vec2Fixed::new(x, y)
}

/// Resolve a screen-space mouse drag into a world-space selection box.
///
/// The corners are mapped independently and then min/maxed, which also
/// sorts out the y-inversion the mapping introduces.
#[must_use]
pub fn world_selection_box(
    camera: &Camera,
    viewport: Viewport,
    drag_origin: Vec2Fixed,
    drag_end: Vec2Fixed,
) -> Aabb {
    let a = screen_to_world(camera, viewport, drag_origin);
    let b = screen_to_world(camera, viewport, drag_end);
    Aabb::from_corners(a, b)
}

/// IDs of the ships whose box strictly overlaps the selection box, in
/// array order.
#[must_use]
pub fn select_ships(ships: &[Ship], selection_box: &Aabb) -> Vec<ShipId> {
    ships
        .iter()
        .filter(|ship| selection_box.overlaps(&ship.aabb()))
        .map(|ship| ship.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Team;

    fn fixed(n: i32) -> Fixed {
        Fixed::from_num(n)
    }

    fn vec2(x: i32, y: i32) -> Vec2Fixed {
        Vec2Fixed::new(fixed(x), fixed(y))
    }

    fn ship_at(id: ShipId, x: i32, y: i32) -> Ship {
        Ship {
            id,
            team: Team::Ally,
            position: vec2(x, y),
            rotation: Fixed::ZERO,
            size: Vec2Fixed::splat(Fixed::ONE),
            velocity: Vec2Fixed::ZERO,
            health: 5,
            fire_cooldown: fixed(2),
            fire_timer: Fixed::ZERO,
            move_order: None,
        }
    }

    const VIEWPORT: Viewport = Viewport {
        width: 800,
        height: 600,
    };

    #[test]
    fn test_screen_center_maps_to_camera_position() {
        let camera = Camera {
            position: vec2(7, -3),
            zoom: fixed(20),
        };

        let world = screen_to_world(&camera, VIEWPORT, vec2(400, 300));
        assert_eq!(world, vec2(7, -3));
    }

    #[test]
    fn test_screen_y_axis_is_flipped() {
        let camera = Camera::default();

        // Top of the screen is above the camera in world space.
        let top = screen_to_world(&camera, VIEWPORT, vec2(400, 0));
        let bottom = screen_to_world(&camera, VIEWPORT, vec2(400, 600));
        assert!(top.y > Fixed::ZERO);
        assert!(bottom.y < Fixed::ZERO);
        assert_eq!(top.y, -bottom.y);
    }

    #[test]
    fn test_screen_left_edge_is_half_zoom_out() {
        let camera = Camera::default();

        let left = screen_to_world(&camera, VIEWPORT, vec2(0, 300));
        assert_eq!(left.x, fixed(-10));
    }

    #[test]
    fn test_drag_box_corners_sorted() {
        let camera = Camera::default();

        // Drag from bottom-right to top-left on screen.
        let selection = world_selection_box(&camera, VIEWPORT, vec2(500, 400), vec2(300, 200));

        assert!(selection.min.x < selection.max.x);
        assert!(selection.min.y < selection.max.y);
    }

    #[test]
    fn test_select_ships_strict_overlap() {
        let ships = [
            ship_at(0, 5, 5),   // inside
            ship_at(1, 50, 50), // far outside
            ship_at(2, 9, 5),   // straddles the right edge
        ];

        let selection_box = Aabb {
            min: vec2(0, 0),
            max: vec2(10, 10),
        };

        assert_eq!(select_ships(&ships, &selection_box), vec![0, 2]);
    }

    #[test]
    fn test_edge_touching_ship_not_selected() {
        // Ship box is [10, 11] x [-0.5, 0.5]: touches x = 10 exactly.
        let ships = [ship_at(0, 10, 0)];

        let selection_box = Aabb {
            min: vec2(0, -5),
            max: Vec2Fixed::new(Fixed::from_num(9.5), fixed(5)),
        };

        assert_eq!(select_ships(&ships, &selection_box), Vec::<ShipId>::new());
    }
}

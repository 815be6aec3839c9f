//! # Flotilla Core
//!
//! Deterministic navigation and spatial-simulation core for a small RTS.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! The host owns windowing, input devices, rendering and the
//! fixed-timestep frame loop; it drives this crate through three entry
//! points: [`world::World::new`], [`world::World::tick`] and
//! [`world::World::render_state`].
//!
//! ## Crate Structure
//!
//! - [`components`] - entity definitions (ships, projectiles, buildings)
//! - [`store`] - dense entity stores with swap-removal
//! - [`registry`] - the stable-ID-to-slot registry
//! - [`geometry`] - AABB and segment intersection primitives
//! - [`navigation`] - the two interchangeable pathfinding backends
//! - [`combat`] / [`physics`] - the per-tick simulation systems
//! - [`selection`] - camera mapping and drag-box selection
//! - [`world`] - owned world state and the tick-boundary API
//! - [`math`] - fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod components;
pub mod error;
pub mod geometry;
pub mod math;
pub mod navigation;
pub mod physics;
pub mod registry;
pub mod selection;
pub mod store;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combat::WeaponConfig;
    pub use crate::components::{Building, Projectile, Ship, ShipId, ShipSpawnParams, Team};
    pub use crate::error::{Result, SimError};
    pub use crate::geometry::Aabb;
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::navigation::{NavConfig, NavigationMode, Navigator, Route, Steering};
    pub use crate::selection::{Camera, Viewport};
    pub use crate::world::{
        BuildingPlacement, InputIntents, RenderState, ShipPlacement, TickEvents, World, WorldConfig,
    };
}

//! Error types for the simulation core.

use thiserror::Error;

use crate::components::ShipId;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Top-level error type for all simulation errors.
///
/// Capacity and invalid-state errors indicate configuration or logic
/// defects and abort the tick that raised them. `ShipNotFound` is an
/// expected condition at API boundaries; interior code treats registry
/// misses as normal skip branches instead of surfacing this variant.
#[derive(Debug, Error)]
pub enum SimError {
    /// A fixed-capacity store or structure is full.
    #[error("Capacity exceeded for {what}: {capacity} slots")]
    CapacityExceeded {
        /// Which store or structure filled up.
        what: String,
        /// Its configured capacity.
        capacity: usize,
    },

    /// No ship with the given ID is alive.
    #[error("Ship not found: {0}")]
    ShipNotFound(ShipId),

    /// A ship ID was inserted into the registry twice.
    #[error("Duplicate ship ID: {0}")]
    DuplicateShipId(ShipId),

    /// The pathfinder exhausted its open set without reaching the goal.
    #[error("No path from ({from_x}, {from_y}) to ({to_x}, {to_y})")]
    NoPath {
        /// Start X coordinate.
        from_x: f64,
        /// Start Y coordinate.
        from_y: f64,
        /// Goal X coordinate.
        to_x: f64,
        /// Goal Y coordinate.
        to_y: f64,
    },

    /// Invalid simulation state detected at an API boundary.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

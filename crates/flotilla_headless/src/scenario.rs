//! Scenario loading and configuration.
//!
//! Scenarios define the initial world for headless runs: fleet and
//! building placements, the navigation backend, and an optional scripted
//! move order. They are stored as RON with plain integer coordinates so
//! files stay hand-editable; conversion to the core's fixed-point
//! [`WorldConfig`] happens on load.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use flotilla_core::math::{Fixed, Vec2Fixed};
use flotilla_core::navigation::{NavConfig, NavigationMode};
use flotilla_core::prelude::Team;
use flotilla_core::world::{BuildingPlacement, ShipPlacement, WorldConfig};

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
}

/// One ship in a scenario, on integer world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipSetup {
    /// Team affiliation.
    pub team: Team,
    /// Spawn X coordinate.
    pub x: i32,
    /// Spawn Y coordinate.
    pub y: i32,
}

/// One building in a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingSetup {
    /// Center X coordinate.
    pub x: i32,
    /// Center Y coordinate.
    pub y: i32,
    /// Footprint width.
    pub width: i32,
    /// Footprint height.
    pub height: i32,
}

/// A scripted move order issued during the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOrderSetup {
    /// Tick at which every ship is selected and ordered to move.
    pub at_tick: u64,
    /// Order target X coordinate.
    pub target_x: i32,
    /// Order target Y coordinate.
    pub target_y: i32,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Ticks to simulate.
    pub ticks: u64,
    /// Navigation backend.
    pub nav_mode: NavigationMode,
    /// Fleet placements.
    pub ships: Vec<ShipSetup>,
    /// Building placements.
    pub buildings: Vec<BuildingSetup>,
    /// Optional scripted move order.
    pub move_order: Option<MoveOrderSetup>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// The standard two-team skirmish with four obstacles.
    #[must_use]
    pub fn skirmish() -> Self {
        let mut ships = Vec::new();
        for i in 0..5i32 {
            let x = 2 * i - 5;
            ships.push(ShipSetup {
                team: Team::Ally,
                x,
                y: -5,
            });
            ships.push(ShipSetup {
                team: Team::Enemy,
                x,
                y: 5,
            });
        }

        Self {
            name: "Default Skirmish".to_string(),
            description: "Two fleets of five trade fire across four obstacles".to_string(),
            ticks: 1200,
            nav_mode: NavigationMode::VisibilityGraph,
            ships,
            buildings: vec![
                BuildingSetup {
                    x: -10,
                    y: 2,
                    width: 2,
                    height: 2,
                },
                BuildingSetup {
                    x: 8,
                    y: -6,
                    width: 2,
                    height: 2,
                },
                BuildingSetup {
                    x: 12,
                    y: 9,
                    width: 2,
                    height: 2,
                },
                BuildingSetup {
                    x: -4,
                    y: 12,
                    width: 2,
                    height: 2,
                },
            ],
            move_order: None,
        }
    }

    /// A lone fleet marching around a central obstacle - exercises the
    /// navigation backend end to end.
    #[must_use]
    pub fn obstacle_march(nav_mode: NavigationMode) -> Self {
        Self {
            name: "Obstacle March".to_string(),
            description: "One fleet ordered to the far side of a large building".to_string(),
            ticks: 1200,
            nav_mode,
            ships: vec![
                ShipSetup {
                    team: Team::Ally,
                    x: -15,
                    y: -2,
                },
                ShipSetup {
                    team: Team::Ally,
                    x: -15,
                    y: 2,
                },
            ],
            buildings: vec![BuildingSetup {
                x: 0,
                y: 0,
                width: 8,
                height: 8,
            }],
            move_order: Some(MoveOrderSetup {
                at_tick: 1,
                target_x: 15,
                target_y: 0,
            }),
        }
    }

    /// Convert to the core's world configuration.
    #[must_use]
    pub fn to_world_config(&self) -> WorldConfig {
        WorldConfig {
            nav: NavConfig {
                mode: self.nav_mode,
                ..NavConfig::default()
            },
            initial_ships: self
                .ships
                .iter()
                .map(|ship| ShipPlacement {
                    team: ship.team,
                    position: Vec2Fixed::new(Fixed::from_num(ship.x), Fixed::from_num(ship.y)),
                })
                .collect(),
            initial_buildings: self
                .buildings
                .iter()
                .map(|building| BuildingPlacement {
                    position: Vec2Fixed::new(
                        Fixed::from_num(building.x),
                        Fixed::from_num(building.y),
                    ),
                    size: Vec2Fixed::new(
                        Fixed::from_num(building.width),
                        Fixed::from_num(building.height),
                    ),
                })
                .collect(),
            ..WorldConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skirmish_converts_to_world_config() {
        let scenario = Scenario::skirmish();
        let config = scenario.to_world_config();

        assert_eq!(config.initial_ships.len(), 10);
        assert_eq!(config.initial_buildings.len(), 4);
        assert_eq!(config.nav.mode, NavigationMode::VisibilityGraph);
    }

    #[test]
    fn test_ron_roundtrip() {
        let scenario = Scenario::obstacle_march(NavigationMode::DistanceField);
        let text = ron::to_string(&scenario).unwrap();
        let parsed = Scenario::from_ron_str(&text).unwrap();

        assert_eq!(scenario, parsed);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let result = Scenario::load("/nonexistent/scenario.ron");
        assert!(matches!(result, Err(ScenarioError::FileNotFound(_))));
    }

    #[test]
    fn test_load_from_disk() {
        let scenario = Scenario::skirmish();
        let text = ron::to_string(&scenario).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skirmish.ron");
        std::fs::write(&path, text).unwrap();

        let loaded = Scenario::load(&path).unwrap();
        assert_eq!(loaded, scenario);
    }

    #[test]
    fn test_malformed_ron_errors() {
        let result = Scenario::from_ron_str("(name: \"broken\"");
        assert!(matches!(result, Err(ScenarioError::ParseError(_))));
    }
}

//! Drives a [`World`] through a scenario without a renderer.

use serde::{Deserialize, Serialize};

use flotilla_core::error::Result;
use flotilla_core::geometry::Aabb;
use flotilla_core::math::{Fixed, Vec2Fixed};
use flotilla_core::prelude::Team;
use flotilla_core::world::{InputIntents, World};

use crate::scenario::Scenario;

/// Machine-readable outcome of a headless run, printed as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Scenario name.
    pub scenario: String,
    /// Ticks actually simulated.
    pub ticks: u64,
    /// Ally ships alive at the end.
    pub allies_alive: usize,
    /// Enemy ships alive at the end.
    pub enemies_alive: usize,
    /// Total ships destroyed over the run.
    pub total_deaths: usize,
    /// Projectiles still in flight at the end.
    pub projectiles_in_flight: usize,
    /// Final world state hash, for cross-run determinism checks.
    pub state_hash: u64,
}

/// Runs one scenario to completion.
pub struct HeadlessRunner {
    scenario: Scenario,
    world: World,
}

impl HeadlessRunner {
    /// Build the world described by the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario does not fit the default world
    /// capacities.
    pub fn new(scenario: Scenario) -> Result<Self> {
        let world = World::new(scenario.to_world_config())?;
        Ok(Self { scenario, world })
    }

    /// The world under simulation.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Simulate the scenario's tick budget at 20 Hz and summarize.
    ///
    /// # Errors
    ///
    /// Propagates any tick failure (capacity exhaustion mid-run).
    pub fn run(&mut self) -> Result<RunSummary> {
        let dt = Fixed::ONE / Fixed::from_num(20);
        let mut total_deaths = 0usize;

        for tick in 0..self.scenario.ticks {
            let input = self.input_for_tick(tick);
            let events = self.world.tick(&input, dt)?;
            total_deaths += events.deaths.len();
        }

        let allies_alive = self
            .world
            .ships()
            .iter()
            .filter(|ship| ship.team == Team::Ally)
            .count();
        let enemies_alive = self.world.ships().len() - allies_alive;

        let summary = RunSummary {
            scenario: self.scenario.name.clone(),
            ticks: self.scenario.ticks,
            allies_alive,
            enemies_alive,
            total_deaths,
            projectiles_in_flight: self.world.projectiles().len(),
            state_hash: self.world.state_hash(),
        };

        tracing::info!(
            scenario = %summary.scenario,
            ticks = summary.ticks,
            allies = summary.allies_alive,
            enemies = summary.enemies_alive,
            deaths = summary.total_deaths,
            "run complete"
        );

        Ok(summary)
    }

    /// The scripted input for one tick: select everything and issue the
    /// move order when its tick comes up, idle otherwise.
    fn input_for_tick(&self, tick: u64) -> InputIntents {
        let Some(order) = self.scenario.move_order else {
            return InputIntents::default();
        };

        if tick + 1 == order.at_tick {
            // Select the whole fleet one tick ahead of the order.
            return InputIntents {
                selection_box: Some(Aabb {
                    min: Vec2Fixed::new(Fixed::from_num(-32), Fixed::from_num(-32)),
                    max: Vec2Fixed::new(Fixed::from_num(32), Fixed::from_num(32)),
                }),
                move_order_target: None,
            };
        }

        if tick == order.at_tick {
            return InputIntents {
                selection_box: None,
                move_order_target: Some(Vec2Fixed::new(
                    Fixed::from_num(order.target_x),
                    Fixed::from_num(order.target_y),
                )),
            };
        }

        InputIntents::default()
    }
}

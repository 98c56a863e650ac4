//-------------------------------------------------------------------//
//       esPIC : periodic 1d1v electrostatic PIC engine              //
//-------------------------------------------------------------------//
// This program is free software: you can redistribute it and/or    //
// modify it under the terms of the GNU General Public License as    //
// published by the Free Software Foundation, version 3.             //
// This program is distributed in the hope that it will be useful,   //
// but WITHOUT ANY WARRANTY; without even the implied warranty of    //
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU  //
// General Public License for more details at                        //
// https://www.gnu.org/licenses/gpl-3.0.html.                        //
//-------------------------------------------------------------------//

//! Output records handed to the caller.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::{Scenario, SimulationConfig, SpeciesConfig};

/// Phase space of one species.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpeciesFrame {
    pub positions: Vec<f64>,
    pub velocities: Vec<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GridInfo {
    #[serde(rename = "L")]
    pub length: f64,
    #[serde(rename = "Ng")]
    pub cells: usize,
    pub dx: f64,
}

/// Copy of the simulation state after one step.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Frame {
    pub iteration: usize,
    pub time: f64,
    pub species: Vec<SpeciesFrame>,
    pub field: Vec<f64>,
    pub potential: Vec<f64>,
    pub charge_density: Vec<f64>,
    pub grid: GridInfo,
    pub kinetic_energy: f64,
    pub potential_energy: f64,
}

/// Run-level description of a simulation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SimulationSummary {
    pub scenario: Option<Scenario>,
    pub species_config: Vec<SpeciesConfig>,
    pub total_steps: usize,
    pub steps_completed: usize,
    pub grid_size: usize,
    pub domain_length: f64,
}

impl SimulationSummary {
    pub fn new(config: &SimulationConfig, steps_completed: usize) -> Self {
        SimulationSummary {
            scenario: config.scenario,
            species_config: config.species.clone(),
            total_steps: config.steps,
            steps_completed,
            grid_size: config.grid_cells,
            domain_length: config.length,
        }
    }
}

/// Which iterations produce a frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SnapshotPolicy {
    pub every: usize,
    pub iterations: BTreeSet<usize>,
    pub include_final: bool,
}

pub const DEFAULT_FRAME_COUNT: usize = 50;

impl SnapshotPolicy {
    /// At most about 50 evenly spaced frames plus the final one.
    pub fn for_steps(steps: usize) -> Self {
        SnapshotPolicy {
            every: (steps / DEFAULT_FRAME_COUNT).max(1),
            iterations: BTreeSet::new(),
            include_final: true,
        }
    }

    pub fn every_step() -> Self {
        SnapshotPolicy {
            every: 1,
            iterations: BTreeSet::new(),
            include_final: true,
        }
    }

    pub fn with_iterations(mut self, iterations: impl IntoIterator<Item = usize>) -> Self {
        self.iterations.extend(iterations);
        self
    }

    /// `every == 0` disables the periodic frames.
    pub fn matches(&self, iteration: usize, total_steps: usize) -> bool {
        (self.every > 0 && iteration % self.every == 0)
            || self.iterations.contains(&iteration)
            || (self.include_final && iteration + 1 == total_steps)
    }
}

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

//! Periodic 1d1v electrostatic particle-in-cell engine.
//!
//! Macro-particles are loaded from a drifting Maxwellian, their charge is
//! deposited on a periodic grid (nearest grid point), the Poisson equation
//! is solved with a factorization computed once per run, and the particles
//! are pushed in the resulting field. Runs produce a sequence of [`Frame`]s
//! and a [`SimulationSummary`].

pub mod checkpoint;
pub mod config;
pub mod deposit;
pub mod diagnostics;
pub mod error;
pub mod field;
pub mod frame;
pub mod grid;
pub mod loader;
pub mod push;
pub mod sampler;
pub mod simulation;

pub use checkpoint::{load_checkpoint, save_checkpoint};
pub use config::{Perturbation, Scenario, SimulationConfig, SpeciesConfig, VelocityLoading};
pub use diagnostics::{EnergySample, StabilityReport};
pub use error::{PicError, PicResult};
pub use field::{FieldState, PoissonSolver};
pub use frame::{Frame, GridInfo, SimulationSummary, SnapshotPolicy, SpeciesFrame};
pub use grid::Grid;
pub use loader::Species;
pub use simulation::{run, CancellationToken, RunOutput, RunStatus, Simulation};

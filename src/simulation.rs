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

//! The time-stepping loop.
//!
//! One step runs: reset grid buffers, deposit every species and the ion
//! background, solve for potential and field, push every species, record
//! energies. Steps are strictly sequential and a cancellation request is
//! only honoured between two steps.
//!
//! A step works on scratch copies of the grid buffers and particle arrays and
//! commits them only when every value is finite. A tripped divergence guard
//! leaves the last committed state untouched and makes the run terminal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::deposit::deposit_all;
use crate::diagnostics::{kinetic_energy, EnergySample, StabilityReport};
use crate::error::{PicError, PicResult};
use crate::field::{FieldState, PoissonSolver};
use crate::frame::{Frame, GridInfo, SimulationSummary, SnapshotPolicy, SpeciesFrame};
use crate::grid::Grid;
use crate::loader::{ion_background, load_species, Species};
use crate::push::{is_finite, move_particles};

const PROGRESS_INTERVAL: usize = 1000; // steps between progress log lines

/// Cooperative stop signal shared between the caller and a running loop.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a run that did not fail ended.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Cancelled,
}

/// Everything a run hands back to the caller.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RunOutput {
    pub status: RunStatus,
    pub frames: Vec<Frame>,
    pub summary: SimulationSummary,
    pub energy_history: Vec<EnergySample>,
    pub stability: StabilityReport,
}

/// State of one run.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    grid: Grid,
    solver: Arc<PoissonSolver>,
    species: Vec<Species>,
    ion_density: f64,
    fields: FieldState,
    iteration: usize, // steps completed
    history: Vec<EnergySample>,
    stability: StabilityReport,
    next_fields: FieldState,   // step-local buffers, swapped in on commit
    next_species: Vec<Species>,
    failed: Option<(usize, String)>, // iteration and quantity of a divergence
}

impl Simulation {
    /// Validates `config`, loads the particles and factorizes the Poisson
    /// operator.
    pub fn initialize(config: SimulationConfig) -> PicResult<Self> {
        config.validate()?;
        let grid = config.grid()?;
        let solver = Arc::new(PoissonSolver::new(grid)?);
        Self::initialize_with_solver(config, solver)
    }

    /// Like [`Simulation::initialize`], reusing a factorization built for the
    /// same grid by an earlier run.
    pub fn initialize_with_solver(config: SimulationConfig, solver: Arc<PoissonSolver>) -> PicResult<Self> {
        config.validate()?;
        let grid = config.grid()?;
        if *solver.grid() != grid {
            return Err(PicError::SolverSetup(format!(
                "factorization was built for L={} Ng={}, run needs L={} Ng={}",
                solver.grid().length,
                solver.grid().cells,
                grid.length,
                grid.cells
            )));
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let species = load_species(&config, &grid, &mut rng)?;
        info!(
            "initialized {} species, {} particles on {} grid points",
            species.len(),
            config.particle_count(),
            grid.cells
        );
        Self::assemble(config, grid, solver, species, 0, Vec::new())
    }

    /// Rebuilds a simulation from saved particle data.
    pub(crate) fn from_parts(
        config: SimulationConfig,
        species: Vec<Species>,
        iteration: usize,
        history: Vec<EnergySample>,
    ) -> PicResult<Self> {
        config.validate()?;
        if species.len() != config.species.len() {
            return Err(PicError::invalid(
                "species",
                format!("checkpoint holds {} species, config declares {}", species.len(), config.species.len()),
            ));
        }
        for (s, (sp, cfg)) in species.iter().zip(&config.species).enumerate() {
            if sp.positions.len() != cfg.count || sp.velocities.len() != cfg.count {
                return Err(PicError::invalid(
                    &format!("species[{s}].N"),
                    "checkpoint arrays do not match the configured particle count",
                ));
            }
        }
        let grid = config.grid()?;
        let solver = Arc::new(PoissonSolver::new(grid)?);
        Self::assemble(config, grid, solver, species, iteration, history)
    }

    fn assemble(
        config: SimulationConfig,
        grid: Grid,
        solver: Arc<PoissonSolver>,
        species: Vec<Species>,
        iteration: usize,
        history: Vec<EnergySample>,
    ) -> PicResult<Self> {
        let first_charge = species.first().map(|s| s.charge).unwrap_or(0.0);
        let ion_density = ion_background(first_charge, grid.length, config.ion_count);
        let stability = StabilityReport::new(&config, &grid, &species, ion_density);
        stability.log(&species);
        Ok(Simulation {
            fields: FieldState::new(grid.cells),
            next_fields: FieldState::new(grid.cells),
            next_species: species.clone(),
            failed: None,
            config,
            grid,
            solver,
            species,
            ion_density,
            iteration,
            history,
            stability,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Shared read-only factorization, reusable by later runs on this grid.
    pub fn solver(&self) -> Arc<PoissonSolver> {
        Arc::clone(&self.solver)
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn fields(&self) -> &FieldState {
        &self.fields
    }

    pub fn ion_density(&self) -> f64 {
        self.ion_density
    }

    /// Number of completed steps.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn energy_history(&self) -> &[EnergySample] {
        &self.history
    }

    pub fn stability(&self) -> &StabilityReport {
        &self.stability
    }

    /// Iteration at which the divergence guard stopped the run, if it did.
    pub fn failed_at(&self) -> Option<usize> {
        self.failed.as_ref().map(|(it, _)| *it)
    }

    pub fn is_complete(&self) -> bool {
        self.iteration >= self.config.steps
    }

    /// Allows `additional` more steps after the ones already completed.
    pub fn extend(&mut self, additional: usize) {
        self.config.steps = self.iteration + additional;
    }

    /// Advances the state by one time step.
    ///
    /// Either the whole step is committed or nothing changes. After a
    /// divergence every further call returns the same error.
    pub fn step(&mut self) -> PicResult<EnergySample> {
        if let Some((iteration, quantity)) = &self.failed {
            return Err(PicError::NumericalDivergence {
                iteration: *iteration,
                quantity: quantity.clone(),
            });
        }
        let it = self.iteration;
        let guard = self.config.divergence_guard;

        self.next_fields.reset();
        deposit_all(&self.species, self.ion_density, &self.grid, &mut self.next_fields.rho);
        self.solver.solve(&mut self.next_fields);
        if guard && !self.next_fields.is_finite() {
            return Err(self.diverge(it, "potential or electric field".to_string()));
        }

        for (next, s) in self.next_species.iter_mut().zip(&self.species) {
            next.positions.copy_from_slice(&s.positions);
            next.velocities.copy_from_slice(&s.velocities);
            move_particles(&self.next_fields.efield, next, self.config.dt, &self.grid);
        }
        if guard {
            if let Some(idx) = self.next_species.iter().position(|s| !is_finite(s)) {
                return Err(self.diverge(it, format!("position or velocity of species {idx}")));
            }
        }

        std::mem::swap(&mut self.fields, &mut self.next_fields);
        std::mem::swap(&mut self.species, &mut self.next_species);

        let sample = EnergySample {
            iteration: it,
            time: (it as f64) * self.config.dt,
            kinetic: kinetic_energy(&self.species),
            potential: self.fields.field_energy(&self.grid),
        };
        self.history.push(sample);
        self.iteration += 1;
        Ok(sample)
    }

    fn diverge(&mut self, iteration: usize, quantity: String) -> PicError {
        warn!("numerical divergence at iteration {}: non-finite {}", iteration, quantity);
        self.failed = Some((iteration, quantity.clone()));
        PicError::NumericalDivergence { iteration, quantity }
    }

    /// Deep copy of the current state, labelled with the last completed
    /// iteration.
    pub fn snapshot(&self) -> Frame {
        let (iteration, time, kinetic, potential) = match self.history.last() {
            Some(s) => (s.iteration, s.time, s.kinetic, s.potential),
            None => (0, 0.0, kinetic_energy(&self.species), 0.0),
        };
        Frame {
            iteration,
            time,
            species: self
                .species
                .iter()
                .map(|s| SpeciesFrame {
                    positions: s.positions.clone(),
                    velocities: s.velocities.clone(),
                })
                .collect(),
            field: self.fields.efield.clone(),
            potential: self.fields.phi.clone(),
            charge_density: self.fields.rho.clone(),
            grid: GridInfo {
                length: self.grid.length,
                cells: self.grid.cells,
                dx: self.grid.dx,
            },
            kinetic_energy: kinetic,
            potential_energy: potential,
        }
    }

    pub fn summary(&self) -> SimulationSummary {
        SimulationSummary::new(&self.config, self.iteration)
    }

    /// Steps until `Nt` steps are done or `cancel` is raised, collecting the
    /// frames selected by `policy`.
    pub fn advance(&mut self, policy: &SnapshotPolicy, cancel: &CancellationToken) -> PicResult<RunOutput> {
        let start = Instant::now();
        let total = self.config.steps;
        let mut frames: Vec<Frame> = Vec::new();
        let mut status = RunStatus::Completed;

        info!("running steps {}..{}", self.iteration, total);
        while self.iteration < total {
            if cancel.is_cancelled() {
                info!("cancelled before step {}", self.iteration);
                status = RunStatus::Cancelled;
                break;
            }
            let sample = self.step()?;
            if sample.iteration % PROGRESS_INTERVAL == 0 {
                info!(
                    "t = {:8}  E_kin = {:1.6e}  E_pot = {:1.6e}",
                    sample.iteration, sample.kinetic, sample.potential
                );
            }
            if policy.matches(sample.iteration, total) {
                debug!("frame at iteration {}", sample.iteration);
                frames.push(self.snapshot());
            }
        }
        info!(
            "{} frames, {} of {} steps done in {:.3} sec",
            frames.len(),
            self.iteration,
            total,
            start.elapsed().as_secs_f64()
        );

        Ok(RunOutput {
            status,
            frames,
            summary: self.summary(),
            energy_history: self.history.clone(),
            stability: self.stability,
        })
    }
}

/// Initializes and drives a full run.
pub fn run(config: SimulationConfig, policy: &SnapshotPolicy, cancel: &CancellationToken) -> PicResult<RunOutput> {
    let mut sim = Simulation::initialize(config)?;
    sim.advance(policy, cancel)
}

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

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::grid::Grid;
use crate::loader::Species;

// stability and accuracy limits

const MAX_WP_DT: f64       = 0.2;    // plasma frequency * time step
const MAX_CFL: f64         = 1.0;    // cells crossed per step by the fastest sampled particle
const MAX_DX_DEBYE: f64    = 1.0;    // grid division / Debye length
const NEUTRALITY_TOL: f64  = 1e-9;   // relative net charge of the initial load

/// Energies after one step.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct EnergySample {
    pub iteration: usize,
    pub time: f64,
    pub kinetic: f64,
    pub potential: f64,
}

impl EnergySample {
    pub fn total(&self) -> f64 {
        self.kinetic + self.potential
    }
}

/// `sum_s 0.5 |Q_s/re_s| sum(v^2)`
pub fn kinetic_energy(species: &[Species]) -> f64 {
    species.iter().map(Species::kinetic_energy).sum()
}

/// Stability and accuracy conditions of a run. Reported, never enforced.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct StabilityReport {
    pub wp_dt: f64,
    pub cfl: f64,
    pub dx_over_debye: f64,
    pub net_charge: f64,
}

impl StabilityReport {
    pub fn new(config: &SimulationConfig, grid: &Grid, species: &[Species], ion_density: f64) -> Self {
        let v_extreme = config.v_min.abs().max(config.v_max.abs());
        let debye_length = config.v_th / config.wp_e.abs();
        let particle_charge: f64 = species.iter().map(|s| s.charge * s.len() as f64).sum();
        StabilityReport {
            wp_dt: config.wp_e.abs() * config.dt,
            cfl: v_extreme * config.dt / grid.dx,
            dx_over_debye: grid.dx / debye_length,
            net_charge: particle_charge + ion_density * grid.length,
        }
    }

    pub fn wp_dt_ok(&self) -> bool {
        self.wp_dt < MAX_WP_DT
    }

    pub fn cfl_ok(&self) -> bool {
        self.cfl < MAX_CFL
    }

    pub fn resolution_ok(&self) -> bool {
        self.dx_over_debye < MAX_DX_DEBYE
    }

    pub fn neutral(&self, species: &[Species]) -> bool {
        let scale: f64 = species.iter().map(|s| (s.charge * s.len() as f64).abs()).sum();
        self.net_charge.abs() <= NEUTRALITY_TOL * scale.max(1.0)
    }

    pub fn all_ok(&self, species: &[Species]) -> bool {
        self.wp_dt_ok() && self.cfl_ok() && self.resolution_ok() && self.neutral(species)
    }

    /// Logs the report, one warning per violated condition.
    pub fn log(&self, species: &[Species]) {
        info!(
            "stability: wp_e*dt = {:.4}, cfl = {:.4}, dx/debye = {:.4}, net charge = {:.3e}",
            self.wp_dt, self.cfl, self.dx_over_debye, self.net_charge
        );
        if !self.wp_dt_ok() {
            warn!("wp_e*dt = {:.4} (OK if less than {:.2})", self.wp_dt, MAX_WP_DT);
        }
        if !self.cfl_ok() {
            warn!(
                "particles at the sampling bound cross {:.4} cells per step (OK if less than {:.2})",
                self.cfl, MAX_CFL
            );
        }
        if !self.resolution_ok() {
            warn!("dx / Debye length = {:.4} (OK if less than {:.2})", self.dx_over_debye, MAX_DX_DEBYE);
        }
        if !self.neutral(species) {
            warn!("initial load is not charge neutral: net charge {:.6e}", self.net_charge);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Scenario;
    use crate::loader::{ion_background, species_charges};

    fn cold_species(config: &SimulationConfig) -> Vec<Species> {
        let q = species_charges(&config.species, config.wp_e, config.length).unwrap();
        config
            .species
            .iter()
            .zip(q)
            .map(|(s, charge)| Species {
                positions: vec![0.0; s.count],
                velocities: vec![s.v0; s.count],
                v0: s.v0,
                re: s.re,
                charge,
            })
            .collect()
    }

    #[test]
    fn two_stream_preset_report() {
        let cfg = SimulationConfig::scenario(Scenario::TwoStream, 5.0, -5.0);
        let grid = cfg.grid().unwrap();
        let species = cold_species(&cfg);
        let ions = ion_background(species[0].charge, cfg.length, cfg.ion_count);
        let report = StabilityReport::new(&cfg, &grid, &species, ions);
        assert!((report.wp_dt - 0.1).abs() < 1e-12);
        // 15 * 0.1 / 0.25
        assert!((report.cfl - 6.0).abs() < 1e-12);
        assert!(!report.cfl_ok());
        assert!(report.resolution_ok());
        assert!(report.neutral(&species));
        assert!(!report.all_ok(&species));
    }

    #[test]
    fn kinetic_energy_of_cold_beams() {
        let cfg = SimulationConfig::scenario(Scenario::TwoStream, 5.0, -5.0);
        let species = cold_species(&cfg);
        // 0.5 * (64/10000) * 10000 * 25, twice
        assert!((kinetic_energy(&species) - 1600.0).abs() < 1e-9);
    }

    #[test]
    fn missing_ions_break_neutrality() {
        let mut cfg = SimulationConfig::scenario(Scenario::LandauDamping, 0.0, 0.0);
        cfg.ion_count = 0;
        let grid = cfg.grid().unwrap();
        let species = cold_species(&cfg);
        let report = StabilityReport::new(&cfg, &grid, &species, 0.0);
        assert!(!report.neutral(&species));
    }
}

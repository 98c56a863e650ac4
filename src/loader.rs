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

use std::f64::consts::PI;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{SimulationConfig, SpeciesConfig, VelocityLoading};
use crate::error::{PicError, PicResult};
use crate::grid::Grid;
use crate::sampler::{sample_velocities, VelocityWindow};

/// Macro-particles of one species, stored as two parallel arrays.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Species {
    pub positions: Vec<f64>,
    pub velocities: Vec<f64>,
    pub v0: f64,     // initial drift velocity
    pub re: f64,     // charge-to-mass sign/scale
    pub charge: f64, // macro-particle charge Q
}

impl Species {
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// `0.5 |Q/re| sum(v^2)`
    pub fn kinetic_energy(&self) -> f64 {
        let v2: f64 = self.velocities.iter().map(|v| v * v).sum();
        0.5 * (self.charge / self.re).abs() * v2
    }
}

/// Parameters of one initial loading.
#[derive(Debug, Clone, Copy)]
pub struct LoadSpec {
    pub count: usize,
    pub window: VelocityWindow,
    pub amplitude: f64,
    pub mode: u32,
    pub loading: VelocityLoading,
    pub max_batches: usize,
}

/// Evenly spaced positions `i L / N`, displaced by
/// `amplitude cos(2 pi mode x / L)` and wrapped back into `[0, L)`.
pub fn perturbed_positions(count: usize, amplitude: f64, mode: u32, grid: &Grid) -> Vec<f64> {
    let length = grid.length;
    let spacing = length / (count as f64);
    (0..count)
        .map(|i| {
            let x = (i as f64) * spacing;
            if amplitude != 0.0 {
                grid.wrap(x + amplitude * (2.0 * PI * (mode as f64) * x / length).cos())
            } else {
                x
            }
        })
        .collect()
}

/// Builds positions and velocities of one species.
pub fn initial_loading<R: Rng>(
    spec: &LoadSpec,
    grid: &Grid,
    rng: &mut R,
) -> PicResult<(Vec<f64>, Vec<f64>)> {
    let positions = perturbed_positions(spec.count, spec.amplitude, spec.mode, grid);
    let velocities = sample_velocities(spec.loading, spec.window, spec.count, spec.max_batches, rng)?;
    Ok((positions, velocities))
}

/// Macro-particle charges of all species.
///
/// The first species carries `Q_1 = wp_e^2 L / (N_1 re_1)`; every other
/// species gets the same total charge magnitude, `Q_s = Q_1 (N_1/N_s)`,
/// with the sign flipped when `re_s` and `re_1` differ in sign.
pub fn species_charges(species: &[SpeciesConfig], wp_e: f64, length: f64) -> PicResult<Vec<f64>> {
    let first = species
        .first()
        .ok_or_else(|| PicError::invalid("species", "at least one species is required"))?;
    let n1 = first.count as f64;
    let q1 = wp_e * wp_e * length / (n1 * first.re);
    Ok(species
        .iter()
        .map(|s| {
            let ratio = n1 / (s.count as f64);
            if (s.re > 0.0) == (first.re > 0.0) {
                q1 * ratio
            } else {
                -q1 * ratio
            }
        })
        .collect())
}

/// Uniform ion background density `-(Q_1/L) N_ions`.
pub fn ion_background(first_charge: f64, length: f64, ion_count: usize) -> f64 {
    (-first_charge / length) * (ion_count as f64)
}

/// Loads every species of `config` from one random stream.
pub fn load_species<R: Rng>(config: &SimulationConfig, grid: &Grid, rng: &mut R) -> PicResult<Vec<Species>> {
    let charges = species_charges(&config.species, config.wp_e, config.length)?;
    config
        .species
        .iter()
        .zip(charges)
        .map(|(sp, charge)| {
            let spec = LoadSpec {
                count: sp.count,
                window: VelocityWindow {
                    v_min: config.v_min,
                    v_max: config.v_max,
                    v0: sp.v0,
                    v_th: config.v_th,
                },
                amplitude: config.perturbation.amplitude,
                mode: config.perturbation.mode,
                loading: config.velocity_loading,
                max_batches: config.sampler_max_batches,
            };
            let (positions, velocities) = initial_loading(&spec, grid, rng)?;
            Ok(Species {
                positions,
                velocities,
                v0: sp.v0,
                re: sp.re,
                charge,
            })
        })
        .collect()
}

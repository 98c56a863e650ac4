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

//! Run parameters and scenario presets.
//!
//! A configuration can be built in code, taken from one of the presets, or
//! read from YAML:
//!
//! ```yaml
//! L: 64.0
//! wp_e: 1.0
//! Ng: 256
//! Nt: 1000
//! dt: 0.1
//! v_th: 1.0
//! v_min: -15.0
//! v_max: 15.0
//! N_ions: 20000
//! species:
//!   - { N: 10000, v0: 5.0, re: -1.0 }
//!   - { N: 10000, v0: -5.0, re: -1.0 }
//! perturbation: { amplitude: 0.1, mode: 1 }
//! seed: 42
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PicError, PicResult};
use crate::grid::Grid;

// preset constants (normalized units: lengths in Debye lengths, times in 1/wp_e)

const PRESET_L: f64          = 64.0;     // domain length
const PRESET_WP_E: f64       = 1.0;      // electron plasma frequency
const PRESET_N_G: usize      = 256;      // number of grid points
const PRESET_N_T: usize      = 1000;     // number of time steps
const PRESET_DT: f64         = 0.1;      // time step
const PRESET_V_TH: f64       = 1.0;      // thermal velocity
const PRESET_V_MIN: f64      = -15.0;    // lower sampling bound for velocities
const PRESET_V_MAX: f64      = 15.0;     // upper sampling bound for velocities
const PRESET_AMPLITUDE: f64  = 0.1;      // initial position perturbation amplitude
const PRESET_MODE: u32       = 1;        // initial position perturbation mode

pub const DEFAULT_SAMPLER_MAX_BATCHES: usize = 1000;

/// Per-species parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpeciesConfig {
    #[serde(rename = "N")]
    pub count: usize, // number of macro-particles
    pub v0: f64,      // drift velocity
    pub re: f64,      // charge-to-mass sign/scale
}

/// Sinusoidal displacement applied to the initial positions.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Perturbation {
    pub amplitude: f64,
    pub mode: u32,
}

/// How initial velocities are drawn.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VelocityLoading {
    /// Acceptance-rejection against the drifting Maxwellian.
    #[default]
    Rejection,
    /// Normal draws, redrawn when outside `[v_min, v_max]`.
    Gaussian,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    #[serde(rename = "L")]
    pub length: f64,
    pub wp_e: f64,
    #[serde(rename = "Ng")]
    pub grid_cells: usize,
    #[serde(rename = "Nt")]
    pub steps: usize,
    pub dt: f64,
    pub v_th: f64,
    pub v_min: f64,
    pub v_max: f64,
    #[serde(rename = "N_ions")]
    pub ion_count: usize,
    pub species: Vec<SpeciesConfig>,
    #[serde(default)]
    pub perturbation: Perturbation,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub velocity_loading: VelocityLoading,
    #[serde(default = "default_sampler_max_batches")]
    pub sampler_max_batches: usize,
    #[serde(default = "default_divergence_guard")]
    pub divergence_guard: bool,
    /// Preset this configuration was derived from, if any.
    #[serde(default)]
    pub scenario: Option<Scenario>,
}

fn default_sampler_max_batches() -> usize {
    DEFAULT_SAMPLER_MAX_BATCHES
}

fn default_divergence_guard() -> bool {
    true
}

/// Preset experiments.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    TwoStream,
    SingleBeam,
    LandauDamping,
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scenario::TwoStream => "two_stream",
            Scenario::SingleBeam => "single_beam",
            Scenario::LandauDamping => "landau_damping",
        };
        f.write_str(name)
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "two_stream" => Ok(Scenario::TwoStream),
            "single_beam" => Ok(Scenario::SingleBeam),
            "landau_damping" => Ok(Scenario::LandauDamping),
            other => Err(format!(
                "unknown scenario `{other}` (expected two_stream, single_beam or landau_damping)"
            )),
        }
    }
}

impl SimulationConfig {
    /// Preset configuration. `beam_v1`/`beam_v2` are the drift velocities of
    /// the beams, `beam_v2` is ignored by presets with a single beam.
    pub fn scenario(kind: Scenario, beam_v1: f64, beam_v2: f64) -> Self {
        let (species, ion_count) = match kind {
            Scenario::TwoStream => (
                vec![
                    SpeciesConfig { count: 10_000, v0: beam_v1, re: -1.0 },
                    SpeciesConfig { count: 10_000, v0: beam_v2, re: -1.0 },
                ],
                20_000,
            ),
            Scenario::SingleBeam => (
                vec![
                    SpeciesConfig { count: 15_000, v0: beam_v1, re: -1.0 },
                    SpeciesConfig { count: 5_000, v0: 0.0, re: -1.0 },
                ],
                30_000,
            ),
            Scenario::LandauDamping => (
                vec![
                    SpeciesConfig { count: 12_000, v0: 0.0, re: -1.0 },
                    SpeciesConfig { count: 8_000, v0: 0.0, re: -1.0 },
                ],
                24_000,
            ),
        };
        SimulationConfig {
            length: PRESET_L,
            wp_e: PRESET_WP_E,
            grid_cells: PRESET_N_G,
            steps: PRESET_N_T,
            dt: PRESET_DT,
            v_th: PRESET_V_TH,
            v_min: PRESET_V_MIN,
            v_max: PRESET_V_MAX,
            ion_count,
            species,
            perturbation: Perturbation {
                amplitude: PRESET_AMPLITUDE,
                mode: PRESET_MODE,
            },
            seed: None,
            velocity_loading: VelocityLoading::Rejection,
            sampler_max_batches: DEFAULT_SAMPLER_MAX_BATCHES,
            divergence_guard: true,
            scenario: Some(kind),
        }
    }

    pub fn from_yaml_str(text: &str) -> PicResult<Self> {
        let config: SimulationConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> PicResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Checks every parameter once, naming the first offending field.
    pub fn validate(&self) -> PicResult<()> {
        if !self.length.is_finite() || self.length <= 0.0 {
            return Err(PicError::invalid("L", format!("must be finite and > 0, got {}", self.length)));
        }
        if !self.wp_e.is_finite() {
            return Err(PicError::invalid("wp_e", "must be finite"));
        }
        if self.grid_cells == 0 {
            return Err(PicError::invalid("Ng", "must be > 0"));
        }
        if self.steps == 0 {
            return Err(PicError::invalid("Nt", "must be > 0"));
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(PicError::invalid("dt", format!("must be finite and > 0, got {}", self.dt)));
        }
        if !self.v_th.is_finite() || self.v_th <= 0.0 {
            return Err(PicError::invalid("v_th", format!("must be finite and > 0, got {}", self.v_th)));
        }
        if !self.v_min.is_finite() {
            return Err(PicError::invalid("v_min", "must be finite"));
        }
        if !self.v_max.is_finite() {
            return Err(PicError::invalid("v_max", "must be finite"));
        }
        if self.v_min >= self.v_max {
            return Err(PicError::invalid(
                "v_min",
                format!("must be < v_max, got v_min={} v_max={}", self.v_min, self.v_max),
            ));
        }
        if self.species.is_empty() {
            return Err(PicError::invalid("species", "at least one species is required"));
        }
        for (s, sp) in self.species.iter().enumerate() {
            if sp.count == 0 {
                return Err(PicError::invalid(&format!("species[{s}].N"), "must be > 0"));
            }
            if !sp.v0.is_finite() {
                return Err(PicError::invalid(&format!("species[{s}].v0"), "must be finite"));
            }
            if !sp.re.is_finite() || sp.re == 0.0 {
                return Err(PicError::invalid(&format!("species[{s}].re"), "must be finite and non-zero"));
            }
        }
        let amp = self.perturbation.amplitude;
        if !amp.is_finite() || amp < 0.0 {
            return Err(PicError::invalid("perturbation.amplitude", "must be finite and >= 0"));
        }
        if self.sampler_max_batches == 0 {
            return Err(PicError::invalid("sampler_max_batches", "must be > 0"));
        }
        Ok(())
    }

    pub fn grid(&self) -> PicResult<Grid> {
        Grid::new(self.length, self.grid_cells)
    }

    /// Total number of macro-particles over all species.
    pub fn particle_count(&self) -> usize {
        self.species.iter().map(|s| s.count).sum()
    }
}

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

//! Binary particle-data checkpoints for continuing a run.
//!
//! The file holds, in order: the number of completed steps, the run
//! configuration, the species arrays and the energy history. The Poisson
//! factorization is rebuilt from the configuration on load.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::info;

use crate::config::SimulationConfig;
use crate::diagnostics::EnergySample;
use crate::error::{PicError, PicResult};
use crate::loader::Species;
use crate::simulation::Simulation;

pub fn save_checkpoint(sim: &Simulation, path: impl AsRef<Path>) -> PicResult<()> {
    let path = path.as_ref();
    let mut file = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut file, &sim.iteration())?;
    bincode::serialize_into(&mut file, sim.config())?;
    bincode::serialize_into(&mut file, sim.species())?;
    bincode::serialize_into(&mut file, sim.energy_history())?;
    file.flush()?;
    info!("saved checkpoint at step {} to {}", sim.iteration(), path.display());
    Ok(())
}

pub fn load_checkpoint(path: impl AsRef<Path>) -> PicResult<Simulation> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PicError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no particle data file found at {}", path.display()),
        )));
    }
    let mut file = BufReader::new(File::open(path)?);
    let iteration: usize = bincode::deserialize_from(&mut file)?;
    let config: SimulationConfig = bincode::deserialize_from(&mut file)?;
    let species: Vec<Species> = bincode::deserialize_from(&mut file)?;
    let history: Vec<EnergySample> = bincode::deserialize_from(&mut file)?;
    info!("loaded checkpoint at step {} from {}", iteration, path.display());
    Simulation::from_parts(config, species, iteration, history)
}

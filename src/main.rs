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

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use espic::{
    load_checkpoint, save_checkpoint, CancellationToken, RunOutput, RunStatus, Scenario, Simulation, SimulationConfig,
    SnapshotPolicy,
};

//------------------------------------------------------------------------------------------//
// command line arguments                                                                   //
//------------------------------------------------------------------------------------------//

#[derive(Parser, Debug)]
#[command(name = "espic", version, about = "Periodic 1d1v electrostatic PIC simulation")]
struct Args {
    /// Preset: two_stream, single_beam or landau_damping
    #[arg(short, long, default_value = "two_stream")]
    scenario: Scenario,

    /// YAML configuration file, replaces the preset
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of time steps (additional steps when resuming)
    #[arg(long)]
    steps: Option<usize>,

    /// Number of grid points
    #[arg(long)]
    grid_size: Option<usize>,

    /// Drift velocity of the first beam
    #[arg(long, default_value_t = 5.0, allow_negative_numbers = true)]
    beam_velocity_1: f64,

    /// Drift velocity of the second beam
    #[arg(long, default_value_t = -5.0, allow_negative_numbers = true)]
    beam_velocity_2: f64,

    /// Seed of the initial loading
    #[arg(long)]
    seed: Option<u64>,

    /// Extra iterations to snapshot, comma separated
    #[arg(long, value_delimiter = ',')]
    save_iterations: Vec<usize>,

    /// Frames, summary and energy history are written here as JSON
    #[arg(short, long, default_value = "frames.json")]
    output: PathBuf,

    /// Particle data is saved here after the run
    #[arg(long)]
    checkpoint: Option<PathBuf>,

    /// Continue from saved particle data
    #[arg(long)]
    resume: Option<PathBuf>,
}

fn build_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => SimulationConfig::scenario(args.scenario, args.beam_velocity_1, args.beam_velocity_2),
    };
    if let Some(steps) = args.steps {
        config.steps = steps;
    }
    if let Some(cells) = args.grid_size {
        config.grid_cells = cells;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    Ok(config)
}

/// Writes the run output as JSON, flushing before returning.
fn write_output(path: &Path, output: &RunOutput) -> Result<()> {
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, output)?;
    writer
        .flush()
        .with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!(">> esPIC: starting...");

    let args = Args::parse();

    let mut sim = match &args.resume {
        Some(path) => {
            let mut sim = load_checkpoint(path)
                .with_context(|| format!("failed to resume from {}", path.display()))?;
            if let Some(extra) = args.steps {
                sim.extend(extra);
            }
            sim
        }
        None => Simulation::initialize(build_config(&args)?)?,
    };

    let policy = SnapshotPolicy::for_steps(sim.config().steps).with_iterations(args.save_iterations.iter().copied());
    let output = sim.advance(&policy, &CancellationToken::new())?;
    if output.status == RunStatus::Cancelled {
        info!(">> esPIC: run cancelled after {} steps", output.summary.steps_completed);
    }

    write_output(&args.output, &output)?;
    info!(">> esPIC: {} frames written to {}", output.frames.len(), args.output.display());

    if let Some(path) = &args.checkpoint {
        save_checkpoint(&sim, path)?;
    }
    info!(">> esPIC: simulation of {} step(s) is completed", output.summary.steps_completed);
    Ok(())
}

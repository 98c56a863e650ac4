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

use std::thread;
use std::time::Duration;

use approx::assert_relative_eq;
use espic::deposit::{deposit_charge, total_charge};
use espic::push::move_particles;
use espic::{
    run, CancellationToken, Grid, Perturbation, RunStatus, Scenario, Simulation, SimulationConfig, SnapshotPolicy,
    Species, SpeciesConfig, VelocityLoading,
};
use proptest::prelude::*;

// two-stream growth threshold: late field energy over initial field energy
const GROWTH_FACTOR: f64 = 10.0;

/// Configuration of the two counter-streaming beams used across tests.
fn two_stream_config(steps: usize, amplitude: f64) -> SimulationConfig {
    SimulationConfig {
        length: 64.0,
        wp_e: 1.0,
        grid_cells: 256,
        steps,
        dt: 0.1,
        v_th: 1.0,
        v_min: -15.0,
        v_max: 15.0,
        ion_count: 20_000,
        species: vec![
            SpeciesConfig { count: 10_000, v0: 5.0, re: -1.0 },
            SpeciesConfig { count: 10_000, v0: -5.0, re: -1.0 },
        ],
        perturbation: Perturbation { amplitude, mode: 1 },
        seed: Some(2024),
        velocity_loading: VelocityLoading::Rejection,
        sampler_max_batches: 1000,
        divergence_guard: true,
        scenario: None,
    }
}

// ==================================================================================
// End-to-end
// ==================================================================================

#[test]
fn ten_steps_give_ten_frames() {
    let out = run(two_stream_config(10, 0.0), &SnapshotPolicy::every_step(), &CancellationToken::new()).unwrap();

    assert_eq!(out.status, RunStatus::Completed);
    assert_eq!(out.frames.len(), 10);
    assert_eq!(out.energy_history.len(), 10);
    for pair in out.frames.windows(2) {
        assert!(pair[1].time > pair[0].time);
        assert_eq!(pair[1].iteration, pair[0].iteration + 1);
    }
    for frame in &out.frames {
        assert_eq!(frame.species.len(), 2);
        for s in &frame.species {
            assert_eq!(s.positions.len(), 10_000);
            assert_eq!(s.velocities.len(), 10_000);
        }
        assert_eq!(frame.field.len(), 256);
        assert_eq!(frame.potential.len(), 256);
        assert_eq!(frame.charge_density.len(), 256);
        assert_eq!(frame.grid.cells, 256);
        assert_eq!(frame.grid.dx, 0.25);
        assert_eq!(frame.potential[255], 0.0);
    }

    assert_eq!(out.summary.total_steps, 10);
    assert_eq!(out.summary.steps_completed, 10);
    assert_eq!(out.summary.grid_size, 256);
    assert_eq!(out.summary.domain_length, 64.0);
    assert_eq!(out.summary.species_config.len(), 2);
}

#[test]
fn default_policy_keeps_final_frame() {
    let mut cfg = SimulationConfig::scenario(Scenario::LandauDamping, 0.0, 0.0);
    cfg.steps = 120;
    cfg.seed = Some(5);
    let out = run(cfg, &SnapshotPolicy::for_steps(120), &CancellationToken::new()).unwrap();
    let its: Vec<usize> = out.frames.iter().map(|f| f.iteration).collect();
    // every = 120 / 50 = 2
    assert_eq!(its.first(), Some(&0));
    assert_eq!(its.last(), Some(&119));
    assert_eq!(its.len(), 61);
}

#[test]
fn invalid_config_fails_before_any_work() {
    let mut cfg = two_stream_config(10, 0.0);
    cfg.v_max = cfg.v_min;
    let err = run(cfg, &SnapshotPolicy::every_step(), &CancellationToken::new()).unwrap_err();
    assert!(err.to_string().contains("v_min"), "{err}");
}

#[test]
fn cancelled_run_keeps_frames_captured_so_far() {
    let cfg = SimulationConfig {
        length: 16.0,
        wp_e: 1.0,
        grid_cells: 16,
        steps: 100_000_000,
        dt: 0.1,
        v_th: 1.0,
        v_min: -6.0,
        v_max: 6.0,
        ion_count: 64,
        species: vec![SpeciesConfig { count: 64, v0: 0.0, re: -1.0 }],
        perturbation: Perturbation { amplitude: 0.05, mode: 1 },
        seed: Some(3),
        velocity_loading: VelocityLoading::Rejection,
        sampler_max_batches: 1000,
        divergence_guard: true,
        scenario: None,
    };
    let total = cfg.steps;
    let cancel = CancellationToken::new();
    let worker = {
        let cancel = cancel.clone();
        thread::spawn(move || run(cfg, &SnapshotPolicy::every_step(), &cancel))
    };
    thread::sleep(Duration::from_millis(100));
    cancel.cancel();
    let out = worker.join().unwrap().unwrap();

    let done = out.summary.steps_completed;
    assert_eq!(out.status, RunStatus::Cancelled);
    assert!(done > 0 && done < total, "steps completed: {done}");
    assert_eq!(out.frames.len(), done);
    assert_eq!(out.energy_history.len(), done);
    assert_eq!(out.frames.last().map(|f| f.iteration), Some(done - 1));
}

// ==================================================================================
// Determinism
// ==================================================================================

#[test]
fn same_seed_gives_bit_identical_runs() {
    let a = Simulation::initialize(two_stream_config(5, 0.1)).unwrap();
    let b = Simulation::initialize(two_stream_config(5, 0.1)).unwrap();
    assert_eq!(a.species(), b.species());

    let ra = run(two_stream_config(5, 0.1), &SnapshotPolicy::every_step(), &CancellationToken::new()).unwrap();
    let rb = run(two_stream_config(5, 0.1), &SnapshotPolicy::every_step(), &CancellationToken::new()).unwrap();
    assert_eq!(ra.frames, rb.frames);
}

// ==================================================================================
// Physics
// ==================================================================================

#[test]
fn thermal_equilibrium_energy_has_no_secular_growth() {
    let cfg = SimulationConfig {
        length: 64.0,
        wp_e: 1.0,
        grid_cells: 128,
        steps: 400,
        dt: 0.1,
        v_th: 1.0,
        v_min: -6.0,
        v_max: 6.0,
        ion_count: 20_000,
        species: vec![SpeciesConfig { count: 20_000, v0: 0.0, re: -1.0 }],
        perturbation: Perturbation::default(),
        seed: Some(99),
        velocity_loading: VelocityLoading::Rejection,
        sampler_max_batches: 1000,
        divergence_guard: true,
        scenario: None,
    };
    let out = run(cfg, &SnapshotPolicy::for_steps(400), &CancellationToken::new()).unwrap();
    let h = &out.energy_history;
    let mean = |s: &[espic::EnergySample]| s.iter().map(|e| e.total()).sum::<f64>() / s.len() as f64;
    let early = mean(&h[..20]);
    let late = mean(&h[h.len() - 20..]);
    assert!(
        ((late - early) / early).abs() < 0.1,
        "total energy drifted from {early} to {late}"
    );
}

#[test]
fn counter_streaming_beams_grow_field_energy() {
    let mut sim = Simulation::initialize(two_stream_config(400, 0.1)).unwrap();
    for _ in 0..400 {
        sim.step().unwrap();
    }
    let h = sim.energy_history();
    let initial = h[0].potential;
    let late = h[300..].iter().map(|e| e.potential).fold(0.0, f64::max);
    assert!(
        late > GROWTH_FACTOR * initial,
        "field energy {late} did not grow beyond {GROWTH_FACTOR} x {initial}"
    );
}

#[test]
fn deposited_density_is_neutral_with_ions() {
    let mut sim = Simulation::initialize(two_stream_config(1, 0.1)).unwrap();
    sim.step().unwrap();
    let q = total_charge(&sim.fields().rho, sim.grid());
    assert!(q.abs() < 1e-9, "net charge {q}");
}

// ==================================================================================
// Properties
// ==================================================================================

proptest! {
    /// Deposited charge of one species equals N Q.
    #[test]
    fn deposition_conserves_charge(
        xs in prop::collection::vec(0.0f64..32.0, 1..2000),
        charge in -2.0f64..2.0,
        cells in 2usize..300,
    ) {
        let grid = Grid::new(32.0, cells).unwrap();
        let mut rho = vec![0.0; cells];
        deposit_charge(&xs, charge, &grid, &mut rho);
        let expected = charge * xs.len() as f64;
        prop_assert!((total_charge(&rho, &grid) - expected).abs() <= 1e-9 * (1.0 + expected.abs()));
    }

    /// A particle crossing x = L re-enters near zero, never below it.
    #[test]
    fn right_boundary_crossing_wraps(
        eps in 1e-9f64..0.1,
        v in 1.0f64..5.0,
    ) {
        let grid = Grid::new(64.0, 256).unwrap();
        let efield = vec![0.0; 256];
        let dt = 0.1;
        let mut s = Species {
            positions: vec![64.0 - eps],
            velocities: vec![v],
            v0: 0.0,
            re: -1.0,
            charge: -1.0,
        };
        move_particles(&efield, &mut s, dt, &grid);
        let x = s.positions[0];
        prop_assert!(x >= 0.0);
        prop_assert!(x < 64.0);
        assert_relative_eq!(x, v * dt - eps, epsilon = 1e-9);
    }
}

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

//! Poisson solve on the periodic grid.
//!
//! The potential of node `Ng-1` is pinned to zero, which leaves the
//! tridiagonal system `phi[i-1] - 2 phi[i] + phi[i+1] = -rho[i] dx^2` over
//! the first `Ng-1` nodes (the neighbour of node 0 across the boundary is the
//! pinned node). The Thomas factorization of that fixed operator is computed
//! once and reused every step.

use serde::{Deserialize, Serialize};

use crate::error::{PicError, PicResult};
use crate::grid::Grid;

const A: f64 = 1.0;  // sub-diagonal
const B: f64 = -2.0; // diagonal
const C: f64 = 1.0;  // super-diagonal

/// Step-scoped grid quantities.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FieldState {
    pub rho: Vec<f64>,    // charge density
    pub phi: Vec<f64>,    // electric potential
    pub efield: Vec<f64>, // electric field
}

impl FieldState {
    pub fn new(cells: usize) -> Self {
        FieldState {
            rho: vec![0.0; cells],
            phi: vec![0.0; cells],
            efield: vec![0.0; cells],
        }
    }

    /// Zeroes all buffers so nothing leaks from the previous step.
    pub fn reset(&mut self) {
        self.rho.iter_mut().for_each(|v| *v = 0.0);
        self.phi.iter_mut().for_each(|v| *v = 0.0);
        self.efield.iter_mut().for_each(|v| *v = 0.0);
    }

    /// `0.5 sum(E^2) dx`
    pub fn field_energy(&self, grid: &Grid) -> f64 {
        0.5 * self.efield.iter().map(|e| e * e).sum::<f64>() * grid.dx
    }

    pub fn is_finite(&self) -> bool {
        self.phi.iter().chain(self.efield.iter()).all(|v| v.is_finite())
    }
}

/// Factorized Poisson operator of one grid. Immutable after construction.
#[derive(Debug, Clone)]
pub struct PoissonSolver {
    grid: Grid,
    c_prime: Vec<f64>, // modified super-diagonal
    inv_den: Vec<f64>, // inverse pivots
}

impl PoissonSolver {
    pub fn new(grid: Grid) -> PicResult<Self> {
        if grid.cells < 2 {
            return Err(PicError::SolverSetup(format!(
                "need at least 2 grid points, got Ng={}",
                grid.cells
            )));
        }
        let n = grid.cells - 1;
        let mut c_prime = vec![0.0; n];
        let mut inv_den = vec![0.0; n];

        let mut prev = 0.0;
        for i in 0..n {
            let den = if i == 0 { B } else { B - A * prev };
            if den == 0.0 || !den.is_finite() {
                return Err(PicError::SolverSetup(format!(
                    "singular pivot {den} at row {i} of {n}"
                )));
            }
            inv_den[i] = 1.0 / den;
            c_prime[i] = C * inv_den[i];
            prev = c_prime[i];
        }

        Ok(PoissonSolver {
            grid,
            c_prime,
            inv_den,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Solves for `phi` from `rho`; `phi[Ng-1]` is set to zero.
    pub fn solve_potential(&self, rho: &[f64], phi: &mut [f64]) {
        let ng = self.grid.cells;
        let n = ng - 1;
        debug_assert_eq!(rho.len(), ng);
        debug_assert_eq!(phi.len(), ng);
        let alpha = -self.grid.dx * self.grid.dx;

        // forward sweep, phi holds the modified right-hand side
        phi[0] = alpha * rho[0] * self.inv_den[0];
        for i in 1..n {
            phi[i] = (alpha * rho[i] - A * phi[i - 1]) * self.inv_den[i];
        }
        // back substitution
        for i in (0..n - 1).rev() {
            phi[i] -= self.c_prime[i] * phi[i + 1];
        }
        phi[ng - 1] = 0.0;
    }

    /// Centered periodic difference `E[i] = (phi[i-1] - phi[i+1]) / (2 dx)`.
    pub fn electric_field(&self, phi: &[f64], efield: &mut [f64]) {
        let ng = self.grid.cells;
        let factor = 0.5 * self.grid.inv_dx();
        for i in 0..ng {
            let left = phi[(i + ng - 1) % ng];
            let right = phi[(i + 1) % ng];
            efield[i] = (left - right) * factor;
        }
    }

    /// Potential and field of the density already stored in `fields.rho`.
    pub fn solve(&self, fields: &mut FieldState) {
        self.solve_potential(&fields.rho, &mut fields.phi);
        self.electric_field(&fields.phi, &mut fields.efield);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine_error(ng: usize) -> (f64, f64) {
        let length = 2.0 * PI;
        let grid = Grid::new(length, ng).unwrap();
        let solver = PoissonSolver::new(grid).unwrap();
        let x = grid.nodes();
        let mut fields = FieldState::new(ng);
        for i in 0..ng {
            fields.rho[i] = x[i].sin();
        }
        solver.solve(&mut fields);
        // -phi'' = sin(x)  =>  phi = sin(x) + const, pinned at the last node
        let offset = x[ng - 1].sin();
        let err = (0..ng)
            .map(|i| (fields.phi[i] - (x[i].sin() - offset)).abs())
            .fold(0.0, f64::max);
        (err, grid.dx)
    }

    #[test]
    fn rejects_degenerate_grid() {
        let grid = Grid::new(1.0, 1).unwrap();
        assert!(matches!(PoissonSolver::new(grid), Err(PicError::SolverSetup(_))));
    }

    #[test]
    fn sine_density_matches_closed_form() {
        let (err, dx) = sine_error(64);
        assert!(err < dx * dx, "err = {err}, dx^2 = {}", dx * dx);
    }

    #[test]
    fn sine_error_is_second_order() {
        let (coarse, _) = sine_error(64);
        let (fine, _) = sine_error(128);
        let ratio = coarse / fine;
        assert!(ratio > 3.5 && ratio < 4.5, "convergence ratio {ratio}");
    }

    #[test]
    fn neutral_density_satisfies_periodic_laplacian_everywhere() {
        let ng = 32;
        let grid = Grid::new(8.0, ng).unwrap();
        let solver = PoissonSolver::new(grid).unwrap();
        let mut fields = FieldState::new(ng);
        for i in 0..ng {
            fields.rho[i] = ((i * 7 % 5) as f64) - 2.0 + 0.3 * (i as f64).cos();
        }
        let mean = fields.rho.iter().sum::<f64>() / ng as f64;
        fields.rho.iter_mut().for_each(|r| *r -= mean);

        solver.solve(&mut fields);
        assert_eq!(fields.phi[ng - 1], 0.0);
        let dx2 = grid.dx * grid.dx;
        for i in 0..ng {
            let lap = fields.phi[(i + ng - 1) % ng] - 2.0 * fields.phi[i] + fields.phi[(i + 1) % ng];
            assert!((lap + fields.rho[i] * dx2).abs() < 1e-10, "row {i}: {lap}");
        }
    }

    #[test]
    fn field_is_centered_periodic_difference() {
        let grid = Grid::new(4.0, 4).unwrap();
        let solver = PoissonSolver::new(grid).unwrap();
        let phi = vec![1.0, 2.0, 4.0, 8.0];
        let mut e = vec![0.0; 4];
        solver.electric_field(&phi, &mut e);
        assert_eq!(e, vec![(8.0 - 2.0) / 2.0, (1.0 - 4.0) / 2.0, (2.0 - 8.0) / 2.0, (4.0 - 1.0) / 2.0]);
    }

    #[test]
    fn reset_clears_all_buffers() {
        let mut f = FieldState::new(3);
        f.rho[0] = 1.0;
        f.phi[1] = 2.0;
        f.efield[2] = 3.0;
        f.reset();
        assert_eq!(f, FieldState::new(3));
    }

    #[test]
    fn two_point_grid_is_solvable() {
        let grid = Grid::new(2.0, 2).unwrap();
        let solver = PoissonSolver::new(grid).unwrap();
        let mut f = FieldState::new(2);
        f.rho = vec![1.0, -1.0];
        solver.solve(&mut f);
        assert_eq!(f.phi, vec![0.5, 0.0]);
        assert_eq!(f.efield, vec![0.0, 0.0]);
    }
}

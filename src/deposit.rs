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

//! Nearest-grid-point charge deposition.
//!
//! Every rayon lane scatters a fixed-size chunk of particles into its own
//! density buffer; the buffers are then summed in chunk order. The result is
//! therefore identical for any number of worker threads.

use rayon::prelude::*;

use crate::grid::Grid;
use crate::loader::Species;

const DEPOSIT_CHUNK: usize = 4096; // particles per local accumulation buffer

/// Adds `charge/dx` at the nearest grid point of every position to `rho`.
pub fn deposit_charge(positions: &[f64], charge: f64, grid: &Grid, rho: &mut [f64]) {
    debug_assert_eq!(rho.len(), grid.cells);
    let weight = charge * grid.inv_dx();

    let partials: Vec<Vec<f64>> = positions
        .par_chunks(DEPOSIT_CHUNK)
        .map(|chunk| {
            let mut local = vec![0.0; grid.cells];
            for &x in chunk {
                local[grid.nearest_index(x)] += weight;
            }
            local
        })
        .collect();

    for local in &partials {
        for (r, l) in rho.iter_mut().zip(local.iter()) {
            *r += l;
        }
    }
}

/// Deposits every species, then adds the uniform ion background.
pub fn deposit_all(species: &[Species], ion_density: f64, grid: &Grid, rho: &mut [f64]) {
    for s in species {
        deposit_charge(&s.positions, s.charge, grid, rho);
    }
    rho.iter_mut().for_each(|r| *r += ion_density);
}

/// `sum(rho) dx`
pub fn total_charge(rho: &[f64], grid: &Grid) -> f64 {
    rho.iter().sum::<f64>() * grid.dx
}

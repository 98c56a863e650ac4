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

use rayon::prelude::*;

use crate::grid::Grid;
use crate::loader::Species;

/// Moves the particles of one species in the field `efield`.
///
/// The field is gathered at the nearest grid point of the old position
/// (same mapping as deposition), then `v += re E dt`, `x += v dt`, and `x`
/// is wrapped into `[0, L)`. The caller keeps `wp_e dt` small and particles
/// below one cell per step.
pub fn move_particles(efield: &[f64], species: &mut Species, dt: f64, grid: &Grid) {
    let factor = species.re * dt;
    species
        .positions
        .par_iter_mut()
        .zip(species.velocities.par_iter_mut())
        .for_each(|(x, v)| {
            let e_x = efield[grid.nearest_index(*x)];
            *v += e_x * factor;
            *x = grid.wrap(*x + *v * dt);
        });
}

/// True when every position and velocity of `species` is finite.
pub fn is_finite(species: &Species) -> bool {
    species
        .positions
        .par_iter()
        .chain(species.velocities.par_iter())
        .all(|v| v.is_finite())
}
